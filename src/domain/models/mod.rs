use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata keys written by the indexing pipeline and read back on search.
pub const FIELD_FILE_NAME: &str = "arquivo";
pub const FIELD_TEXT: &str = "texto";
pub const FIELD_SECTION: &str = "secao";
pub const FIELD_MONETARY_VALUES: &str = "valores_monetarios";
pub const FIELD_CPFS: &str = "cpfs";
pub const FIELD_NAMES: &str = "nomes";

/// Upper bound the vector store accepts for a single record's metadata.
pub const MAX_METADATA_BYTES: usize = 40 * 1024;

/// Selects how the upstream model embeds a text.
///
/// Query-time and indexing-time embeddings are tuned differently upstream,
/// so the tag travels unchanged from caller to service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingPurpose {
    Document,
    Query,
}

impl EmbeddingPurpose {
    pub fn task_type(&self) -> &'static str {
        match self {
            EmbeddingPurpose::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingPurpose::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Vector representation of a text, tagged with the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub model: String,
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn new(model: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            model: model.into(),
            vector,
        }
    }

    pub fn dims(&self) -> usize {
        self.vector.len()
    }

    /// All-zero vector used to approximate enumeration of the index.
    pub fn zeros(model: impl Into<String>, dimensions: usize) -> Self {
        Self::new(model, vec![0.0; dimensions])
    }
}

/// A single nearest-neighbour match as the vector store returns it.
///
/// Every field is optional on the wire; `ResultNormalizer` decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMatch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Validated document chunk surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub score: f32,
    pub file_name: String,
    pub text: String,
    pub section: Option<String>,
    pub monetary_values: Vec<String>,
    pub cpfs: Vec<String>,
    pub names: Vec<String>,
}

/// Index statistics reported by the vector store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    #[serde(default)]
    pub total_vector_count: u64,
    #[serde(default)]
    pub dimension: Option<usize>,
}

/// One vector plus metadata, as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// Result of a retrieval call.
///
/// `Empty` means the store had nothing to return; `Failed` means an
/// unexpected error was absorbed at the orchestrator boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(Vec<DocumentRecord>),
    Empty,
    Failed { reason: String },
}

impl SearchOutcome {
    pub fn from_documents(documents: Vec<DocumentRecord>) -> Self {
        if documents.is_empty() {
            SearchOutcome::Empty
        } else {
            SearchOutcome::Found(documents)
        }
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        match self {
            SearchOutcome::Found(documents) => documents,
            _ => &[],
        }
    }

    /// Collapses the outcome into a possibly empty list.
    pub fn into_documents(self) -> Vec<DocumentRecord> {
        match self {
            SearchOutcome::Found(documents) => documents,
            _ => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SearchOutcome::Failed { .. })
    }

    pub fn status(&self) -> &'static str {
        match self {
            SearchOutcome::Found(_) => "found",
            SearchOutcome::Empty => "empty",
            SearchOutcome::Failed { .. } => "failed",
        }
    }
}

/// Fields stored alongside a chunk's vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub text: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub monetary_values: Vec<String>,
    #[serde(default)]
    pub cpfs: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

impl DocumentMetadata {
    /// Builds the wire map using the store's field names. Empty optional
    /// fields are omitted.
    pub fn to_metadata(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(FIELD_FILE_NAME.into(), Value::from(self.file_name.trim()));
        map.insert(FIELD_TEXT.into(), Value::from(self.text.as_str()));
        if let Some(section) = self.section.as_deref().map(str::trim) {
            if !section.is_empty() {
                map.insert(FIELD_SECTION.into(), Value::from(section));
            }
        }
        for (key, values) in [
            (FIELD_MONETARY_VALUES, &self.monetary_values),
            (FIELD_CPFS, &self.cpfs),
            (FIELD_NAMES, &self.names),
        ] {
            if !values.is_empty() {
                map.insert(key.into(), Value::from(values.clone()));
            }
        }
        map
    }
}
