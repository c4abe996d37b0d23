use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use super::{build_agent, describe_http_error, normalize_base_url};

/// Default REST endpoint of the Gemini API.
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Thin JSON client for the Gemini REST API.
///
/// Failures are reported as plain messages; callers pick the domain error
/// kind that fits the operation.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            api_key: api_key.into(),
            agent: build_agent(timeout),
        }
    }

    /// `models/<name>` form expected in resource paths.
    pub fn model_path(model: &str) -> String {
        let trimmed = model.trim().trim_start_matches('/');
        if trimmed.starts_with("models/") || trimmed.starts_with("tunedModels/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, String> {
        let response = self
            .agent
            .post(&self.url(path))
            .set(API_KEY_HEADER, &self.api_key)
            .send_json(body)
            .map_err(describe_http_error)?;

        response
            .into_json()
            .map_err(|err| format!("failed to parse Gemini response: {err}"))
    }

    pub fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, String> {
        let mut request = self.agent.get(&self.url(path)).set(API_KEY_HEADER, &self.api_key);
        for (key, value) in query {
            request = request.query(key, value);
        }

        request
            .call()
            .map_err(describe_http_error)?
            .into_json()
            .map_err(|err| format!("failed to parse Gemini response: {err}"))
    }
}
