use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::{
    models::{
        FIELD_CPFS, FIELD_FILE_NAME, FIELD_MONETARY_VALUES, FIELD_NAMES, FIELD_SECTION, FIELD_TEXT,
    },
    DocumentRecord, DomainError, RawMatch,
};

/// Turns raw vector-store matches into validated `DocumentRecord`s.
///
/// Malformed or incomplete matches are logged and skipped; a bad record
/// never aborts the batch, and input order is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultNormalizer;

impl ResultNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw_matches: Vec<RawMatch>) -> Vec<DocumentRecord> {
        raw_matches
            .into_iter()
            .filter_map(|raw| match Self::normalize_match(raw) {
                Ok(record) => record,
                Err(err) => {
                    warn!("skipping malformed match: {err}");
                    None
                }
            })
            .collect()
    }

    /// `Ok(None)` means the match was well formed but unusable.
    fn normalize_match(raw: RawMatch) -> Result<Option<DocumentRecord>, DomainError> {
        let metadata = match raw.metadata {
            Some(metadata) if !metadata.is_empty() => metadata,
            _ => {
                warn!(id = %raw.id, "match without metadata");
                return Ok(None);
            }
        };

        let score = raw.score.unwrap_or(0.0);
        if !score.is_finite() {
            return Err(DomainError::other(format!(
                "match `{}` has a non-finite score",
                raw.id
            )));
        }

        let file_name = string_field(&metadata, FIELD_FILE_NAME)?.unwrap_or_default();
        let text = string_field(&metadata, FIELD_TEXT)?.unwrap_or_default();
        let section = string_field(&metadata, FIELD_SECTION)?.filter(|s| !s.trim().is_empty());

        if file_name.trim().is_empty() || text.trim().is_empty() {
            warn!(id = %raw.id, "document with incomplete fields");
            return Ok(None);
        }

        let record = DocumentRecord {
            id: raw.id,
            score,
            monetary_values: list_field(&metadata, FIELD_MONETARY_VALUES),
            cpfs: list_field(&metadata, FIELD_CPFS),
            names: list_field(&metadata, FIELD_NAMES),
            file_name,
            text,
            section,
        };

        if !record.monetary_values.is_empty() {
            debug!(file = %record.file_name, values = ?record.monetary_values, "monetary values");
        }
        if !record.cpfs.is_empty() {
            debug!(file = %record.file_name, cpfs = ?record.cpfs, "cpfs");
        }
        if !record.names.is_empty() {
            debug!(file = %record.file_name, names = ?record.names, "names");
        }

        Ok(Some(record))
    }
}

fn string_field(metadata: &Map<String, Value>, key: &str) -> Result<Option<String>, DomainError> {
    match metadata.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(DomainError::other(format!(
            "metadata field `{key}` is not a string: {other}"
        ))),
    }
}

/// Absent or falsy values become an empty list; a lone string becomes a
/// one-element list.
fn list_field(metadata: &Map<String, Value>, key: &str) -> Vec<String> {
    match metadata.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}
