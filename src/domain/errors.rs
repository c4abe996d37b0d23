use thiserror::Error;

/// Domain-level errors shared across application components.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The incoming payload missed a required field, or the query could not be embedded.
    #[error("validation error: {0}")]
    Validation(String),

    /// Input exceeded guard rails such as maximum metadata size.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Nothing relevant was retrieved for a question.
    #[error("not found: {0}")]
    NotFound(String),

    /// Required settings (keys, hosts, model names) are absent or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The vector store is unreachable or refused the connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The vector store accepted the connection but the query itself failed.
    #[error("search error: {0}")]
    Search(String),

    /// Writing to the vector store failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// Embedding upstream failure or vector dimensionality mismatch.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The language model call failed.
    #[error("generation error: {0}")]
    Generation(String),

    /// Any other unexpected failure.
    #[error("unexpected error: {0}")]
    Other(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn limit(msg: impl Into<String>) -> Self {
        Self::LimitExceeded(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Stable machine-readable code used by the HTTP interface.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::LimitExceeded(_) => "LIMIT_EXCEEDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Configuration(_) => "CONFIGURATION",
            Self::Connection(_) => "CONNECTION",
            Self::Search(_) => "SEARCH_FAILED",
            Self::Storage(_) => "STORAGE_FAILED",
            Self::Embedding(_) => "EMBEDDING_FAILED",
            Self::Generation(_) => "GENERATION_FAILED",
            Self::Other(_) => "INTERNAL",
        }
    }

    /// Validation, connection and search failures are surfaced to callers of
    /// a search; everything else is reported as a failed outcome.
    pub fn is_surfaced_by_search(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Connection(_) | Self::Search(_)
        )
    }
}
