use serde::{Deserialize, Serialize};

use crate::domain::{DocumentMetadata, DocumentRecord, SearchOutcome};

/// Question submitted to the answering endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

/// Excerpt cited in an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDto {
    pub filename: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceDto>,
}

/// DTO bridging HTTP search requests and the retrieval service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Response envelope for search operations.
///
/// `status` is one of `found`, `empty` or `failed`; `reason` is only set
/// for failed searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub status: String,
    pub results: Vec<DocumentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SearchResponse {
    pub fn from_outcome(query: impl Into<String>, outcome: SearchOutcome) -> Self {
        let status = outcome.status().to_string();
        let (results, reason) = match outcome {
            SearchOutcome::Found(documents) => (documents, None),
            SearchOutcome::Empty => (Vec::new(), None),
            SearchOutcome::Failed { reason } => (Vec::new(), Some(reason)),
        };
        Self {
            query: query.into(),
            status,
            results,
            reason,
        }
    }
}

/// Payload accepted when indexing a new document chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocumentRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub document: DocumentMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocumentResponse {
    pub id: String,
}

/// Approximate listing of indexed chunks plus the index's total count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentRecord>,
    pub total: u64,
}

/// Health/readiness report for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatusResponse {
    pub ok: bool,
    pub message: String,
    pub details: Option<String>,
}

const fn default_max_results() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_request_defaults_max_results() {
        let request: AskRequest =
            serde_json::from_str(r#"{"question":"qual o prazo?"}"#).expect("valid json");
        assert_eq!(request.max_results, 50);
    }

    #[test]
    fn index_request_flattens_document_fields() {
        let request: IndexDocumentRequest = serde_json::from_str(
            r#"{"file_name":"a.pdf","text":"cláusula","names":["Ana"]}"#,
        )
        .expect("valid json");
        assert!(request.id.is_none());
        assert_eq!(request.document.file_name, "a.pdf");
        assert_eq!(request.document.names, vec!["Ana"]);
    }

    #[test]
    fn failed_search_carries_reason() {
        let response = SearchResponse::from_outcome(
            "prazo",
            SearchOutcome::Failed {
                reason: "dimension mismatch".into(),
            },
        );
        assert_eq!(response.status, "failed");
        assert!(response.results.is_empty());
        assert_eq!(response.reason.as_deref(), Some("dimension mismatch"));
    }
}
