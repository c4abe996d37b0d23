use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    application::services::{VectorIndex, VectorStore},
    domain::{DomainError, IndexStats, RawMatch, VectorRecord},
    infrastructure::http_client::{build_agent, describe_http_error, normalize_base_url},
};

const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const API_VERSION: &str = "2024-07";

/// Pinecone-backed vector store. Connecting validates the configuration and
/// hands out a handle bound to the index host.
pub struct PineconeVectorStore {
    api_key: Option<String>,
    host: Option<String>,
    index_name: String,
    timeout: Duration,
}

impl PineconeVectorStore {
    pub fn new(
        api_key: Option<String>,
        host: Option<String>,
        index_name: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            host: host.filter(|h| !h.trim().is_empty()),
            index_name: index_name.into(),
            timeout,
        }
    }
}

impl VectorStore for PineconeVectorStore {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn connect(&self) -> Result<Arc<dyn VectorIndex>, DomainError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DomainError::configuration("PINECONE_API_KEY is not set"))?;
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| DomainError::configuration("PINECONE_HOST is not set"))?;

        Ok(Arc::new(PineconeIndex {
            base_url: normalize_base_url(host),
            api_key: api_key.to_string(),
            agent: build_agent(self.timeout),
        }))
    }
}

/// Handle to one Pinecone index host.
pub struct PineconeIndex {
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

/// Matches stay untyped here so one malformed entry can be dropped on its own.
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

impl PineconeIndex {
    fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ureq::Response, String> {
        self.agent
            .post(&format!("{}/{}", self.base_url, path))
            .set(API_KEY_HEADER, &self.api_key)
            .set(API_VERSION_HEADER, API_VERSION)
            .send_json(body)
            .map_err(describe_http_error)
    }
}

impl VectorIndex for PineconeIndex {
    fn describe_stats(&self) -> Result<IndexStats, DomainError> {
        self.post("describe_index_stats", &serde_json::json!({}))
            .map_err(|err| DomainError::connection(format!("failed to read index stats: {err}")))?
            .into_json()
            .map_err(|err| DomainError::connection(format!("invalid stats response: {err}")))
    }

    fn upsert(&self, records: &[VectorRecord]) -> Result<usize, DomainError> {
        let response: UpsertResponse = self
            .post("vectors/upsert", &UpsertRequest { vectors: records })
            .map_err(|err| DomainError::storage(format!("failed to upsert vectors: {err}")))?
            .into_json()
            .map_err(|err| {
                DomainError::storage(format!("invalid upsert response: {err}"))
            })?;

        debug!(upserted = response.upserted_count, "vectors upserted");
        Ok(response.upserted_count)
    }

    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<RawMatch>, DomainError> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
        };

        let response: QueryResponse = self
            .post("query", &request)
            .map_err(|err| DomainError::search(format!("vector query failed: {err}")))?
            .into_json()
            .map_err(|err| DomainError::search(format!("invalid query response: {err}")))?;

        Ok(decode_matches(response.matches))
    }
}

fn decode_matches(matches: Vec<Value>) -> Vec<RawMatch> {
    matches
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value::<RawMatch>(value) {
            Ok(raw) => Some(raw),
            Err(err) => {
                warn!(position, "skipping undecodable match: {err}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::infrastructure::http_client::DEFAULT_TIMEOUT;

    fn store(server: &mockito::Server) -> PineconeVectorStore {
        PineconeVectorStore::new(
            Some("pc-key".into()),
            Some(server.url()),
            "brito-ai",
            DEFAULT_TIMEOUT,
        )
    }

    #[test]
    fn connect_requires_key_and_host() {
        let missing_key =
            PineconeVectorStore::new(None, Some("host".into()), "brito-ai", DEFAULT_TIMEOUT);
        assert!(matches!(
            missing_key.connect(),
            Err(DomainError::Configuration(_))
        ));

        let missing_host =
            PineconeVectorStore::new(Some("key".into()), Some(" ".into()), "brito-ai", DEFAULT_TIMEOUT);
        assert!(matches!(
            missing_host.connect(),
            Err(DomainError::Configuration(_))
        ));
    }

    #[test]
    fn describe_stats_reads_total_vector_count() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/describe_index_stats")
            .match_header("api-key", "pc-key")
            .match_header("x-pinecone-api-version", API_VERSION)
            .with_status(200)
            .with_body(r#"{"namespaces":{"":{"vectorCount":12}},"dimension":768,"indexFullness":0,"totalVectorCount":12}"#)
            .create();

        let stats = store(&server)
            .connect()
            .expect("configured")
            .describe_stats()
            .expect("stats");
        assert_eq!(stats.total_vector_count, 12);
        assert_eq!(stats.dimension, Some(768));
        mock.assert();
    }

    #[test]
    fn query_sends_top_k_and_parses_matches() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/query")
            .match_body(Matcher::PartialJson(json!({
                "vector": [0.0, 0.5],
                "topK": 5,
                "includeMetadata": true
            })))
            .with_status(200)
            .with_body(
                r#"{"matches":[
                    {"id":"a","score":0.91,"values":[],"metadata":{"arquivo":"a.pdf","texto":"um"}},
                    {"id":"b","score":0.5}
                ],"namespace":""}"#,
            )
            .create();

        let matches = store(&server)
            .connect()
            .expect("configured")
            .query(&[0.0, 0.5], 5, true)
            .expect("matches");
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "a");
        assert!(matches[1].metadata.is_none());
        mock.assert();
    }

    #[test]
    fn undecodable_match_is_skipped_and_rest_kept() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/query")
            .with_status(200)
            .with_body(
                r#"{"matches":[
                    {"id":"a","score":0.9,"metadata":{"arquivo":"a.pdf","texto":"um"}},
                    {"id":"b","score":0.8,"metadata":"corrupt"},
                    {"id":"c","score":"alto","metadata":{"arquivo":"c.pdf","texto":"três"}},
                    {"id":"d","score":0.7,"metadata":{"arquivo":"d.pdf","texto":"quatro"}}
                ]}"#,
            )
            .create();

        let matches = store(&server)
            .connect()
            .expect("configured")
            .query(&[0.0, 0.5], 5, true)
            .expect("good matches survive");
        let ids: Vec<&str> = matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn query_without_matches_is_empty() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/query")
            .with_status(200)
            .with_body(r#"{"namespace":""}"#)
            .create();

        let matches = store(&server)
            .connect()
            .expect("configured")
            .query(&[0.0], 1, true)
            .expect("matches");
        assert!(matches.is_empty());
    }

    #[test]
    fn query_failure_is_a_search_error() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/query")
            .with_status(400)
            .with_body(r#"{"code":3,"message":"Vector dimension 2 does not match the dimension of the index 768"}"#)
            .create();

        let err = store(&server)
            .connect()
            .expect("configured")
            .query(&[0.0, 0.5], 5, true)
            .expect_err("bad dimension");
        assert!(matches!(err, DomainError::Search(ref msg) if msg.contains("does not match")));
    }

    #[test]
    fn upsert_posts_vectors_with_metadata() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/vectors/upsert")
            .match_body(Matcher::PartialJson(json!({
                "vectors": [{"id": "doc-1", "values": [0.25], "metadata": {"arquivo": "a.pdf"}}]
            })))
            .with_status(200)
            .with_body(r#"{"upsertedCount":1}"#)
            .create();

        let mut metadata = serde_json::Map::new();
        metadata.insert("arquivo".into(), json!("a.pdf"));
        let written = store(&server)
            .connect()
            .expect("configured")
            .upsert(&[VectorRecord {
                id: "doc-1".into(),
                values: vec![0.25],
                metadata,
            }])
            .expect("upsert");
        assert_eq!(written, 1);
        mock.assert();
    }
}
