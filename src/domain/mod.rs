//! Domain layer: core entities and value objects for contract retrieval.

pub mod errors;
pub mod models;

pub use errors::DomainError;
pub use models::{
    DocumentMetadata, DocumentRecord, Embedding, EmbeddingPurpose, IndexStats, RawMatch,
    SearchOutcome, VectorRecord,
};
