//! Service layer orchestrating domain operations and infrastructure adapters.

mod answer_service;
mod query_enricher;
mod result_normalizer;
mod retrieval_service;
mod vector_gateway;

pub use answer_service::{
    build_context, build_prompt, AnswerService, Generation, LanguageModel, ModelInfo,
    DEFAULT_TEMPERATURE,
};
pub use query_enricher::{QueryEnricher, QueryIntent, MONETARY_TERMS, PERSON_TERMS};
pub use result_normalizer::ResultNormalizer;
pub use retrieval_service::{EmbeddingEngine, RetrievalService, ServiceConfig, MAX_QUERY_CHARS};
pub use vector_gateway::{VectorIndex, VectorStore, VectorStoreGateway, MAX_TOP_K};
