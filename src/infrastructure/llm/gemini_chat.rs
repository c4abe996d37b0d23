use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    application::services::{Generation, LanguageModel, ModelInfo},
    domain::DomainError,
    infrastructure::http_client::GeminiClient,
};

/// Guards against a misbehaving server handing out page tokens forever.
const MAX_MODEL_PAGES: usize = 20;
const MODEL_PAGE_SIZE: &str = "100";

/// Gemini `generateContent` client.
pub struct GeminiChatModel {
    client: GeminiClient,
    model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<RemoteModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl GeminiChatModel {
    pub fn try_new(client: GeminiClient, model: impl AsRef<str>) -> Result<Self, DomainError> {
        let model = model.as_ref().trim();
        if model.is_empty() {
            return Err(DomainError::configuration("chat model name cannot be empty"));
        }
        Ok(Self {
            client,
            model: GeminiClient::model_path(model),
        })
    }
}

impl From<GenerateContentResponse> for Generation {
    fn from(response: GenerateContentResponse) -> Self {
        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        Generation {
            parts,
            block_reason: response.prompt_feedback.and_then(|f| f.block_reason),
        }
    }
}

impl LanguageModel for GeminiChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate(&self, prompt: &str, temperature: f32) -> Result<Generation, DomainError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let response: GenerateContentResponse = self
            .client
            .post_json(&format!("{}:generateContent", self.model), &request)
            .map_err(|err| {
                DomainError::generation(format!("Gemini generateContent failed: {err}"))
            })?;

        Ok(response.into())
    }

    fn list_models(&self) -> Result<Vec<ModelInfo>, DomainError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_MODEL_PAGES {
            let mut query = vec![("pageSize", MODEL_PAGE_SIZE)];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: ListModelsResponse = self
                .client
                .get_json("models", &query)
                .map_err(|err| DomainError::generation(format!("failed to list models: {err}")))?;

            debug!(count = page.models.len(), "model page received");
            models.extend(page.models.into_iter().map(|m| ModelInfo {
                name: m.name,
                supported_generation_methods: m.supported_generation_methods,
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(models)
    }
}
