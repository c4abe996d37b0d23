//! JSON-over-HTTP surface for the answering and retrieval services.
//!
//! # Endpoints
//!
//! - `POST /ask` - answer a question from retrieved excerpts
//! - `POST /search` - semantic search over indexed chunks
//! - `GET /documents?limit=` - approximate listing of indexed chunks
//! - `POST /documents` - embed and index one chunk
//! - `GET /health` - vector store reachability

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    application::{
        services::{AnswerService, RetrievalService},
        AskRequest, AskResponse, DocumentListResponse, HealthStatusResponse,
        IndexDocumentRequest, IndexDocumentResponse, SearchRequest, SearchResponse,
    },
    domain::DomainError,
};

/// Shared handles cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub answer: Arc<AnswerService>,
    pub retrieval: Arc<RetrievalService>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ask", post(ask))
        .route("/search", post(search))
        .route("/documents", get(list_documents).post(index_document))
        .with_state(state)
}

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) | DomainError::LimitExceeded(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Configuration(_) | DomainError::Connection(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn map_domain_error(err: DomainError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(target: "brito::http", code = err.code(), "request failed: {err}");
    } else {
        info!(target: "brito::http", code = err.code(), "request rejected: {err}");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

/// Runs a blocking service call off the async runtime.
async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| DomainError::other(format!("worker task failed: {err}")))
        .and_then(|result| result)
        .map_err(map_domain_error)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthStatusResponse> {
    let retrieval = Arc::clone(&state.retrieval);
    let stats = run_blocking(move || retrieval.gateway().stats()).await;

    Json(match stats {
        Ok(stats) => HealthStatusResponse {
            ok: true,
            message: "vector store reachable".into(),
            details: Some(format!("{} vectors indexed", stats.total_vector_count)),
        },
        Err((_, Json(body))) => HealthStatusResponse {
            ok: false,
            message: "vector store unavailable".into(),
            details: Some(body.error),
        },
    })
}

async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let answer = Arc::clone(&state.answer);
    let response = run_blocking(move || answer.ask(payload)).await?;
    info!(target: "brito::http", sources = response.sources.len(), "question answered");
    Ok(Json(response))
}

async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let retrieval = Arc::clone(&state.retrieval);
    let response = run_blocking(move || {
        let outcome = match payload.top_k {
            Some(top_k) => retrieval.search(&payload.query, top_k)?,
            None => retrieval.search_default(&payload.query)?,
        };
        Ok(SearchResponse::from_outcome(payload.query, outcome))
    })
    .await?;
    Ok(Json(response))
}

async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let retrieval = Arc::clone(&state.retrieval);
    let response = run_blocking(move || Ok(retrieval.list_documents(params.limit))).await?;
    Ok(Json(response))
}

async fn index_document(
    State(state): State<AppState>,
    Json(payload): Json<IndexDocumentRequest>,
) -> Result<Json<IndexDocumentResponse>, ApiError> {
    let retrieval = Arc::clone(&state.retrieval);
    let response = run_blocking(move || retrieval.index_document(payload)).await?;
    Ok(Json(response))
}
