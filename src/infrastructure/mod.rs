//! Infrastructure layer wiring concrete adapters (embeddings, storage, language models).

pub mod embeddings;
pub mod http_client;
pub mod llm;
pub mod storage;

pub use embeddings::GeminiEmbeddingEngine;
pub use http_client::GeminiClient;
pub use llm::GeminiChatModel;
pub use storage::PineconeVectorStore;
