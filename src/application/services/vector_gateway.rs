use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{DocumentRecord, DomainError, Embedding, IndexStats, RawMatch, VectorRecord};

use super::ResultNormalizer;

/// Upper bound the store accepts for `top_k`.
pub const MAX_TOP_K: usize = 10_000;

/// Contract for the external vector store: opens handles to one index.
pub trait VectorStore: Send + Sync {
    /// Name of the index handles point at, for diagnostics.
    fn index_name(&self) -> &str;

    fn connect(&self) -> Result<Arc<dyn VectorIndex>, DomainError>;
}

/// Operations available on a connected index.
pub trait VectorIndex: Send + Sync {
    fn describe_stats(&self) -> Result<IndexStats, DomainError>;

    /// Writes records and returns how many were accepted.
    fn upsert(&self, records: &[VectorRecord]) -> Result<usize, DomainError>;

    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<RawMatch>, DomainError>;
}

/// Connection lifecycle and dimensionality checks around a `VectorStore`.
///
/// The first successful `connect` is cached and reused until `invalidate`
/// is called. The lock is never held across network calls.
pub struct VectorStoreGateway {
    store: Arc<dyn VectorStore>,
    dimensions: usize,
    normalizer: ResultNormalizer,
    handle: RwLock<Option<Arc<dyn VectorIndex>>>,
}

impl VectorStoreGateway {
    pub fn new(store: Arc<dyn VectorStore>, dimensions: usize) -> Self {
        Self {
            store,
            dimensions,
            normalizer: ResultNormalizer::new(),
            handle: RwLock::new(None),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns a verified handle, establishing one on first use.
    pub fn connect(&self) -> Result<Arc<dyn VectorIndex>, DomainError> {
        if let Some(handle) = self.handle.read().as_ref() {
            return Ok(Arc::clone(handle));
        }

        let index = self.store.connect()?;
        let stats = index.describe_stats()?;
        info!(
            index = self.store.index_name(),
            total_vectors = stats.total_vector_count,
            "connected to vector index"
        );
        if let Some(dimension) = stats.dimension {
            if dimension != self.dimensions {
                warn!(
                    index = self.store.index_name(),
                    index_dimension = dimension,
                    configured = self.dimensions,
                    "index dimensionality differs from configuration"
                );
            }
        }

        // Another caller may have connected meanwhile; the first handle wins.
        let mut guard = self.handle.write();
        Ok(Arc::clone(guard.get_or_insert(index)))
    }

    /// Drops the cached handle so the next call reconnects.
    pub fn invalidate(&self) {
        self.handle.write().take();
    }

    pub fn stats(&self) -> Result<IndexStats, DomainError> {
        self.connect()?.describe_stats()
    }

    pub fn upsert(
        &self,
        id: Option<String>,
        embedding: &Embedding,
        metadata: Map<String, Value>,
    ) -> Result<String, DomainError> {
        self.ensure_dimensions(embedding)?;

        let id = id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let record = VectorRecord {
            id: id.clone(),
            values: embedding.vector.clone(),
            metadata,
        };

        self.connect()?.upsert(std::slice::from_ref(&record))?;
        Ok(id)
    }

    /// Connection failures surface as `Connection`; a failed query drops
    /// the cached handle and surfaces as `Search`.
    pub fn query(
        &self,
        embedding: &Embedding,
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<RawMatch>, DomainError> {
        self.ensure_dimensions(embedding)?;
        let index = self.connect().map_err(|err| {
            DomainError::connection(format!("failed to connect to the vector store: {err}"))
        })?;

        index
            .query(&embedding.vector, top_k.clamp(1, MAX_TOP_K), include_metadata)
            .map_err(|err| {
                self.invalidate();
                DomainError::search(format!("vector search failed: {err}"))
            })
    }

    /// Approximates a listing of the index by querying with an all-zero
    /// vector; the store has no enumeration primitive, so this is not
    /// guaranteed to be exhaustive.
    pub fn list_all(&self, limit: usize) -> (Vec<DocumentRecord>, u64) {
        let index = match self.connect() {
            Ok(index) => index,
            Err(err) => {
                warn!("failed to connect to vector store: {err}");
                return (Vec::new(), 0);
            }
        };

        let total = match index.describe_stats() {
            Ok(stats) => stats.total_vector_count,
            Err(err) => {
                warn!("failed to read index stats: {err}");
                return (Vec::new(), 0);
            }
        };

        if total == 0 {
            return (Vec::new(), 0);
        }

        let probe = Embedding::zeros("zero-probe", self.dimensions);
        match index.query(&probe.vector, limit.clamp(1, MAX_TOP_K), true) {
            Ok(matches) => (self.normalizer.normalize(matches), total),
            Err(err) => {
                warn!("failed to list documents: {err}");
                (Vec::new(), total)
            }
        }
    }

    fn ensure_dimensions(&self, embedding: &Embedding) -> Result<(), DomainError> {
        if embedding.dims() != self.dimensions {
            return Err(DomainError::embedding(format!(
                "embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embedding.dims()
            )));
        }
        Ok(())
    }
}
