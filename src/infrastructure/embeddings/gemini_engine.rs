use serde::{Deserialize, Serialize};

use crate::{
    application::services::EmbeddingEngine,
    domain::{DomainError, Embedding, EmbeddingPurpose},
    infrastructure::http_client::GeminiClient,
};

/// Embedding engine backed by Gemini's `batchEmbedContents` endpoint.
///
/// Every call sends a one-element batch and keeps the first vector.
pub struct GeminiEmbeddingEngine {
    client: GeminiClient,
    model: String,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

impl GeminiEmbeddingEngine {
    pub fn try_new(client: GeminiClient, model: impl AsRef<str>) -> Result<Self, DomainError> {
        let model = model.as_ref().trim();
        if model.is_empty() {
            return Err(DomainError::configuration(
                "embedding model name cannot be empty",
            ));
        }
        Ok(Self {
            client,
            model: GeminiClient::model_path(model),
        })
    }
}

impl EmbeddingEngine for GeminiEmbeddingEngine {
    fn embed(&self, text: &str, purpose: EmbeddingPurpose) -> Result<Embedding, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::validation("text payload cannot be empty"));
        }

        let request = BatchEmbedRequest {
            requests: vec![EmbedContentRequest {
                model: &self.model,
                content: Content {
                    parts: vec![Part { text }],
                },
                task_type: purpose.task_type(),
            }],
        };

        let response: BatchEmbedResponse = self
            .client
            .post_json(&format!("{}:batchEmbedContents", self.model), &request)
            .map_err(|err| {
                DomainError::embedding(format!("failed to generate embedding: {err}"))
            })?;

        let vector = response
            .embeddings
            .into_iter()
            .next()
            .map(|embedding| embedding.values)
            .filter(|values| !values.is_empty())
            .ok_or_else(|| DomainError::embedding("embedding service returned no vector"))?;

        Ok(Embedding::new(&self.model, vector))
    }
}
