use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

pub mod application;
pub mod domain;
pub mod infrastructure;
#[cfg(feature = "http-service")]
pub mod interfaces;
pub mod settings;

use application::services::{
    EmbeddingEngine, LanguageModel, QueryEnricher, ServiceConfig, VectorStore, VectorStoreGateway,
};
use application::{AnswerService, RetrievalService};
use infrastructure::{GeminiChatModel, GeminiClient, GeminiEmbeddingEngine, PineconeVectorStore};
use settings::AppConfig;

/// Fully wired services plus the configuration they were built from.
pub struct AppHandles {
    pub retrieval: Arc<RetrievalService>,
    pub answer: Arc<AnswerService>,
    pub config: AppConfig,
}

/// Installs the stderr subscriber once; the level comes from `BRITO_LOG`.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();

    INIT.get_or_init(|| {
        let filter = std::env::var("BRITO_LOG").unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init();
    });
}

/// Wires the Gemini and Pinecone adapters into the services.
///
/// The Google key is required up front. Pinecone credentials are only
/// checked when the index is first used.
pub fn build_environment(config: &AppConfig) -> Result<AppHandles> {
    let api_key = config
        .gemini
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| anyhow!("GOOGLE_API_KEY is not set"))?;

    let timeout = config.retrieval.http_timeout();
    let client = GeminiClient::new(&config.gemini.api_base, api_key, timeout);

    if config.retrieval.dimensions == 0 {
        bail!("embedding dimensions must be greater than zero");
    }

    let embedder: Arc<dyn EmbeddingEngine> = Arc::new(
        GeminiEmbeddingEngine::try_new(client.clone(), &config.gemini.embedding_model)
            .context("failed to configure the embedding model")?,
    );
    let model: Arc<dyn LanguageModel> = Arc::new(
        GeminiChatModel::try_new(client, &config.gemini.chat_model)
            .context("failed to configure the chat model")?,
    );

    let store: Arc<dyn VectorStore> = Arc::new(PineconeVectorStore::new(
        config.pinecone.api_key.clone(),
        config.pinecone.host.clone(),
        config.pinecone.index_name.clone(),
        timeout,
    ));
    let gateway = Arc::new(VectorStoreGateway::new(store, config.retrieval.dimensions));

    let service_config = ServiceConfig {
        max_query_chars: config.retrieval.max_query_chars.max(1),
        ..ServiceConfig::new(
            config.retrieval.default_top_k,
            config.retrieval.default_list_limit,
        )
    };
    let enricher = QueryEnricher::with_person_terms(config.retrieval.known_names.iter().cloned());

    let retrieval = Arc::new(RetrievalService::new(
        embedder,
        gateway,
        enricher,
        service_config,
    ));
    let answer = Arc::new(
        AnswerService::new(Arc::clone(&retrieval), model)
            .with_temperature(config.gemini.temperature),
    );

    info!(
        index = %config.pinecone.index_name,
        embedding_model = %config.gemini.embedding_model,
        chat_model = %config.gemini.chat_model,
        dimensions = config.retrieval.dimensions,
        "environment ready"
    );

    Ok(AppHandles {
        retrieval,
        answer,
        config: config.clone(),
    })
}

/// Serves the HTTP interface until Ctrl-C.
#[cfg(feature = "http-service")]
pub async fn run_http_service(handles: AppHandles) -> Result<()> {
    use interfaces::http::{router, AppState};

    let addr = handles.config.service.bind_addr();
    let app = router(AppState {
        answer: handles.answer,
        retrieval: handles.retrieval,
    });

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(target: "brito::http", "listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")
}

#[cfg(feature = "http-service")]
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(target: "brito::http", "shutdown requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AppConfig {
        let mut config = AppConfig::default();
        config.gemini.api_key = Some("g-key".into());
        config
    }

    #[test]
    fn missing_google_key_fails_fast() {
        let err = build_environment(&AppConfig::default())
            .err()
            .expect("missing key is an error");
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn wires_services_from_config() {
        let mut config = configured();
        config.retrieval.dimensions = 16;
        config.retrieval.default_top_k = 0;

        let handles = build_environment(&config).expect("environment");
        assert_eq!(handles.retrieval.gateway().dimensions(), 16);
        assert_eq!(handles.retrieval.config().default_top_k, 1);
        assert_eq!(handles.config.pinecone.index_name, "brito-ai");
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let mut config = configured();
        config.retrieval.dimensions = 0;
        assert!(build_environment(&config).is_err());
    }

    #[test]
    fn blank_chat_model_is_rejected() {
        let mut config = configured();
        config.gemini.chat_model = "  ".into();
        assert!(build_environment(&config).is_err());
    }
}
