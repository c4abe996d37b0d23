//! Storage adapters.
//!
//! The vector index itself lives in a managed Pinecone service; this module
//! only speaks its data-plane REST API.

pub mod pinecone_store;

pub use pinecone_store::PineconeVectorStore;
