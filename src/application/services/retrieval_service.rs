use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    application::dtos::{DocumentListResponse, IndexDocumentRequest, IndexDocumentResponse},
    domain::{
        models::MAX_METADATA_BYTES, DocumentMetadata, DocumentRecord, DomainError, Embedding,
        EmbeddingPurpose, SearchOutcome,
    },
};

use super::{QueryEnricher, ResultNormalizer, VectorStoreGateway};

pub const MAX_QUERY_CHARS: usize = 1000;

/// High level configuration shared by the retrieval service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_top_k: usize,
    pub default_list_limit: usize,
    pub max_query_chars: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            default_list_limit: 100,
            max_query_chars: MAX_QUERY_CHARS,
        }
    }
}

impl ServiceConfig {
    pub fn new(default_top_k: usize, default_list_limit: usize) -> Self {
        Self {
            default_top_k: default_top_k.max(1),
            default_list_limit: default_list_limit.max(1),
            ..Self::default()
        }
    }
}

/// Abstraction over the external embedding service.
pub trait EmbeddingEngine: Send + Sync {
    fn embed(&self, text: &str, purpose: EmbeddingPurpose) -> Result<Embedding, DomainError>;
}

/// The orchestrator: normalizes and enriches the query, embeds it, queries
/// the vector store and validates the matches.
pub struct RetrievalService {
    embedder: Arc<dyn EmbeddingEngine>,
    gateway: Arc<VectorStoreGateway>,
    enricher: QueryEnricher,
    normalizer: ResultNormalizer,
    config: ServiceConfig,
}

impl RetrievalService {
    pub fn new(
        embedder: Arc<dyn EmbeddingEngine>,
        gateway: Arc<VectorStoreGateway>,
        enricher: QueryEnricher,
        config: ServiceConfig,
    ) -> Self {
        Self {
            embedder,
            gateway,
            enricher,
            normalizer: ResultNormalizer::new(),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn gateway(&self) -> &VectorStoreGateway {
        &self.gateway
    }

    /// Searches with the configured default `top_k`.
    pub fn search_default(&self, query: &str) -> Result<SearchOutcome, DomainError> {
        self.search(query, self.config.default_top_k)
    }

    /// Validation, connection and search failures are returned as errors.
    /// Any other failure is logged and reported as `SearchOutcome::Failed`,
    /// never as an empty result.
    pub fn search(&self, query: &str, top_k: usize) -> Result<SearchOutcome, DomainError> {
        if query.trim().is_empty() {
            warn!("empty query submitted for search");
            return Ok(SearchOutcome::Empty);
        }

        match self.run_search(query, top_k) {
            Ok(documents) => Ok(SearchOutcome::from_documents(documents)),
            Err(err) if err.is_surfaced_by_search() => {
                error!(code = err.code(), "search failed: {err}");
                Err(err)
            }
            Err(err) => {
                error!("unexpected failure while searching documents: {err}");
                Ok(SearchOutcome::Failed {
                    reason: err.to_string(),
                })
            }
        }
    }

    fn run_search(&self, query: &str, top_k: usize) -> Result<Vec<DocumentRecord>, DomainError> {
        let prepared = self.prepare_query(query);
        let snippet = preview(&prepared, 30);
        let enriched = self.enricher.enrich(&prepared);

        let embedding = self
            .embedder
            .embed(&enriched, EmbeddingPurpose::Query)
            .map_err(|err| {
                DomainError::validation(format!("could not embed the query: {err}"))
            })?;

        let matches = self.gateway.query(&embedding, top_k, true)?;

        if matches.is_empty() {
            warn!(query = %snippet, "no matches for query");
            return Ok(Vec::new());
        }

        let documents = self.normalizer.normalize(matches);
        info!(
            target: "brito::retrieval",
            query = %snippet,
            found = documents.len(),
            "search completed"
        );
        Ok(documents)
    }

    /// Trims and truncates the raw query to `max_query_chars` characters.
    pub fn prepare_query(&self, query: &str) -> String {
        let trimmed = query.trim();
        if trimmed.chars().count() <= self.config.max_query_chars {
            return trimmed.to_string();
        }
        warn!(
            original = %preview(query, 30),
            limit = self.config.max_query_chars,
            "query truncated"
        );
        trimmed.chars().take(self.config.max_query_chars).collect()
    }

    /// Embeds a document chunk and writes it to the index.
    pub fn index_document(
        &self,
        request: IndexDocumentRequest,
    ) -> Result<IndexDocumentResponse, DomainError> {
        let IndexDocumentRequest { id, document } = request;
        Self::validate_document(&document)?;

        let metadata = document.to_metadata();
        let size = serde_json::to_vec(&metadata)
            .map_err(|err| DomainError::other(format!("failed to encode metadata: {err}")))?
            .len();
        if size > MAX_METADATA_BYTES {
            return Err(DomainError::limit(format!(
                "metadata is {size} bytes, the store accepts at most {MAX_METADATA_BYTES}"
            )));
        }

        let embedding = self
            .embedder
            .embed(&document.text, EmbeddingPurpose::Document)?;
        let id = self.gateway.upsert(id, &embedding, metadata)?;

        info!(
            target: "brito::retrieval",
            id = %id,
            file = %document.file_name,
            "document indexed"
        );
        Ok(IndexDocumentResponse { id })
    }

    pub fn list_documents(&self, limit: Option<usize>) -> DocumentListResponse {
        let limit = limit.unwrap_or(self.config.default_list_limit);
        let (documents, total) = self.gateway.list_all(limit);
        DocumentListResponse { documents, total }
    }

    fn validate_document(document: &DocumentMetadata) -> Result<(), DomainError> {
        if document.file_name.trim().is_empty() {
            return Err(DomainError::validation("file name is required"));
        }
        if document.text.trim().is_empty() {
            return Err(DomainError::validation("text is required"));
        }
        Ok(())
    }
}

fn preview(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}
