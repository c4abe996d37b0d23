//! Blocking HTTP plumbing shared by the Gemini and Pinecone adapters.

mod gemini;

pub use gemini::{GeminiClient, DEFAULT_GEMINI_BASE};

use std::time::Duration;

use serde_json::Value;

/// Default per-request timeout for upstream calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest upstream error body echoed back into an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

pub fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// Prefix `https://` when the host was configured without a scheme.
pub fn normalize_base_url(host: &str) -> String {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Convert a `ureq` failure into a readable message, preferring the
/// upstream's own `error.message` / `message` field.
pub fn describe_http_error(error: ureq::Error) -> String {
    match error {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            match upstream_message(&body) {
                Some(message) => format!("HTTP {code}: {message}"),
                None if body.trim().is_empty() => format!("HTTP error: {code}"),
                None => format!(
                    "HTTP {code}: {}",
                    body.chars().take(MAX_ERROR_BODY_CHARS).collect::<String>()
                ),
            }
        }
        ureq::Error::Transport(transport) => format!("Transport error: {transport}"),
    }
}

fn upstream_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(
            normalize_base_url("brito-ai-abc.svc.pinecone.io/"),
            "https://brito-ai-abc.svc.pinecone.io"
        );
        assert_eq!(
            normalize_base_url("http://127.0.0.1:5080"),
            "http://127.0.0.1:5080"
        );
    }

    #[test]
    fn extracts_nested_and_flat_error_messages() {
        assert_eq!(
            upstream_message(r#"{"error":{"code":400,"message":"API key not valid"}}"#).as_deref(),
            Some("API key not valid")
        );
        assert_eq!(
            upstream_message(r#"{"code":3,"message":"Vector dimension 3 does not match"}"#)
                .as_deref(),
            Some("Vector dimension 3 does not match")
        );
        assert!(upstream_message("<html>").is_none());
    }

    #[test]
    fn status_errors_include_upstream_message() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/broken")
            .with_status(403)
            .with_body(r#"{"error":{"message":"permission denied"}}"#)
            .create();

        let err = build_agent(DEFAULT_TIMEOUT)
            .get(&format!("{}/broken", server.url()))
            .call()
            .expect_err("403 is an error");
        assert_eq!(describe_http_error(err), "HTTP 403: permission denied");
        mock.assert();
    }
}
