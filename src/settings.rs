use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::services::{DEFAULT_TEMPERATURE, MAX_QUERY_CHARS, PERSON_TERMS};
use crate::infrastructure::http_client::DEFAULT_GEMINI_BASE;

/// Environment variable pointing at an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "BRITO_CONFIG";

/// Credentials and location of the Pinecone index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeSettings {
    pub api_key: Option<String>,
    pub host: Option<String>,
    pub index_name: String,
}

impl Default for PineconeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            host: None,
            index_name: "brito-ai".into(),
        }
    }
}

/// Gemini endpoints and model identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f32,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_GEMINI_BASE.into(),
            embedding_model: "models/embedding-001".into(),
            chat_model: "models/gemini-1.5-flash".into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Knobs of the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub dimensions: usize,
    pub default_top_k: usize,
    pub default_list_limit: usize,
    pub max_query_chars: usize,
    pub known_names: Vec<String>,
    pub http_timeout_secs: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            dimensions: 768,
            default_top_k: 5,
            default_list_limit: 100,
            max_query_chars: MAX_QUERY_CHARS,
            known_names: PERSON_TERMS.iter().map(|n| n.to_string()).collect(),
            http_timeout_secs: 30,
        }
    }
}

impl RetrievalSettings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

/// Bind address of the HTTP service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
        }
    }
}

impl ServiceSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete configuration, built once at startup and passed to components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pinecone: PineconeSettings,
    pub gemini: GeminiSettings,
    pub retrieval: RetrievalSettings,
    pub service: ServiceSettings,
}

impl AppConfig {
    /// Defaults, overlaid by the JSON file named by `BRITO_CONFIG`, overlaid
    /// by the environment (with `.env` loaded first).
    pub fn load() -> std::io::Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let bytes = fs::read(path.as_ref())?;
        serde_json::from_slice(&bytes)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }

    /// Overlay values from `lookup`; blank values are ignored and
    /// unparsable numbers keep the previous setting.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PINECONE_API_KEY") {
            self.pinecone.api_key = Some(v);
        }
        if let Some(v) = get("PINECONE_HOST") {
            self.pinecone.host = Some(v);
        }
        if let Some(v) = get("PINECONE_INDEX_NAME") {
            self.pinecone.index_name = v;
        }
        if let Some(v) = get("GOOGLE_API_KEY") {
            self.gemini.api_key = Some(v);
        }
        if let Some(v) = get("GEMINI_API_BASE") {
            self.gemini.api_base = v;
        }
        if let Some(v) = get("GEMINI_EMBEDDING_MODEL") {
            self.gemini.embedding_model = v;
        }
        if let Some(v) = get("GEMINI_CHAT_MODEL") {
            self.gemini.chat_model = v;
        }
        if let Some(v) = get("BRITO_EMBEDDING_DIMENSIONS").and_then(|v| v.trim().parse().ok()) {
            self.retrieval.dimensions = v;
        }
        if let Some(v) = get("BRITO_KNOWN_NAMES") {
            self.retrieval.known_names = v
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }
        if let Some(v) = get("BRITO_HTTP_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            self.retrieval.http_timeout_secs = v;
        }
        if let Some(v) = get("BRITO_SERVICE_HOST") {
            self.service.host = v;
        }
        if let Some(v) = get("BRITO_SERVICE_PORT").and_then(|v| v.trim().parse().ok()) {
            self.service.port = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_deployment() {
        let config = AppConfig::default();
        assert_eq!(config.pinecone.index_name, "brito-ai");
        assert_eq!(config.gemini.embedding_model, "models/embedding-001");
        assert_eq!(config.retrieval.dimensions, 768);
        assert_eq!(config.retrieval.max_query_chars, 1000);
        assert!(config.pinecone.api_key.is_none());
    }

    #[test]
    fn environment_overrides_defaults() {
        let mut config = AppConfig::default();
        config.apply_env(lookup(&[
            ("PINECONE_API_KEY", "pc-key"),
            ("PINECONE_HOST", "brito-ai.svc.pinecone.io"),
            ("GEMINI_CHAT_MODEL", "models/gemini-pro"),
            ("BRITO_EMBEDDING_DIMENSIONS", "1024"),
            ("BRITO_KNOWN_NAMES", "Joaquim, , Maria"),
            ("BRITO_SERVICE_PORT", "9000"),
        ]));

        assert_eq!(config.pinecone.api_key.as_deref(), Some("pc-key"));
        assert_eq!(config.gemini.chat_model, "models/gemini-pro");
        assert_eq!(config.retrieval.dimensions, 1024);
        assert_eq!(config.retrieval.known_names, vec!["Joaquim", "Maria"]);
        assert_eq!(config.service.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn blank_and_invalid_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(lookup(&[
            ("PINECONE_API_KEY", "   "),
            ("BRITO_SERVICE_PORT", "not-a-port"),
        ]));
        assert!(config.pinecone.api_key.is_none());
        assert_eq!(config.service.port, 8000);
    }

    #[test]
    fn partial_json_file_keeps_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"pinecone":{"index_name":"outro"},"service":{"port":8080}}"#)
                .expect("valid json");
        assert_eq!(config.pinecone.index_name, "outro");
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.host, "127.0.0.1");
        assert_eq!(config.retrieval.default_top_k, 5);
    }
}
