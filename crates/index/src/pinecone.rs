//! Hosted index backed by the Pinecone REST API.
//!
//! The data-plane host is taken from configuration when set, otherwise it is
//! resolved once from the control plane (`GET /indexes/{name}`) and cached.
//! Chunk text lives in the `chunk_text` metadata field; every other metadata
//! field becomes chunk metadata.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use avocado_config::HostedIndexConfig;
use avocado_core::corpus::{Chunk, IndexRecord, RetrievalResult, ScoredChunk};
use avocado_core::error::IndexError;
use avocado_core::index::VectorIndex;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";

/// Metadata field carrying the chunk text.
pub const TEXT_FIELD: &str = "chunk_text";

pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    namespace: Option<String>,
    control_plane: String,
    host: OnceCell<String>,
}

impl PineconeIndex {
    pub fn new(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, IndexError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IndexError::Storage(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            index_name: index_name.into(),
            namespace: None,
            control_plane: CONTROL_PLANE_URL.to_string(),
            host: OnceCell::new(),
        })
    }

    /// Build from `[index.hosted]`. Fails when no API key is configured.
    pub fn from_config(config: &HostedIndexConfig, timeout: Duration) -> Result<Self, IndexError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            IndexError::Storage("hosted index needs an API key (set PINECONE_API_KEY)".into())
        })?;

        let mut index = Self::new(api_key, &config.index_name, timeout)?;
        if let Some(host) = &config.host {
            index = index.with_host(host);
        }
        if let Some(namespace) = &config.namespace {
            index = index.with_namespace(namespace);
        }
        Ok(index)
    }

    /// Skip control-plane lookup and talk to this data-plane host directly.
    pub fn with_host(self, host: impl Into<String>) -> Self {
        let host = normalize_host(&host.into());
        Self {
            host: OnceCell::new_with(Some(host)),
            ..self
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Override the control-plane endpoint.
    pub fn with_control_plane(mut self, url: impl Into<String>) -> Self {
        self.control_plane = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    async fn host(&self) -> Result<&str, IndexError> {
        self.host
            .get_or_try_init(|| self.describe_index())
            .await
            .map(String::as_str)
    }

    async fn describe_index(&self) -> Result<String, IndexError> {
        let url = format!("{}/indexes/{}", self.control_plane, self.index_name);
        debug!(index = %self.index_name, "Resolving Pinecone host");

        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().as_u16() == 404 {
            return Err(IndexError::NotFound(self.index_name.clone()));
        }
        let response = check_status(response).await?;

        let description: IndexDescription = response
            .json()
            .await
            .map_err(|e| IndexError::QueryFailed(format!("Failed to parse index description: {e}")))?;

        let host = normalize_host(&description.host);
        info!(index = %self.index_name, host = %host, "Pinecone host resolved");
        Ok(host)
    }

    async fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, IndexError> {
        let url = format!("{}{path}", self.host().await?);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| IndexError::QueryFailed(format!("Failed to parse {path} response: {e}")))
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn search(&self, vector: &[f32], k: usize) -> Result<RetrievalResult, IndexError> {
        let body = QueryRequest {
            vector,
            top_k: k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response: QueryResponse = self.post("/query", &body).await?;
        debug!(matches = response.matches.len(), "Pinecone query complete");
        Ok(response.matches.into_iter().map(QueryMatch::into_scored).collect())
    }

    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<usize, IndexError> {
        let mut vectors = Vec::with_capacity(records.len());
        for record in records {
            if record.embedding.is_empty() {
                return Err(IndexError::InvalidRecord {
                    id: record.id,
                    reason: "embedding is empty".into(),
                });
            }
            vectors.push(UpsertVector::from(record));
        }

        let body = UpsertRequest {
            vectors,
            namespace: self.namespace.as_deref(),
        };
        let response: UpsertResponse = self.post("/vectors/upsert", &body).await?;
        Ok(response.upserted_count)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let stats: IndexStats = self
            .post("/describe_index_stats", &serde_json::json!({}))
            .await?;
        Ok(stats.count_for(self.namespace.as_deref()))
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn transport_error(e: reqwest::Error) -> IndexError {
    if e.is_timeout() {
        IndexError::QueryFailed(format!("request timed out: {e}"))
    } else {
        IndexError::QueryFailed(format!("network error: {e}"))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(IndexError::Backend {
        status_code: status.as_u16(),
        message,
    })
}

/// Flatten a JSON metadata value to the string form chunks carry.
fn metadata_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(metadata_string)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

// --- Pinecone wire types ---

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl QueryMatch {
    fn into_scored(self) -> ScoredChunk {
        let mut text = String::new();
        let mut metadata = BTreeMap::new();
        for (key, value) in self.metadata {
            if key == TEXT_FIELD {
                text = metadata_string(value);
            } else {
                metadata.insert(key, metadata_string(value));
            }
        }
        ScoredChunk::new(
            Chunk {
                id: self.id,
                text,
                metadata,
            },
            self.score,
        )
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct UpsertVector {
    id: String,
    values: Vec<f32>,
    metadata: BTreeMap<String, String>,
}

impl From<IndexRecord> for UpsertVector {
    fn from(record: IndexRecord) -> Self {
        let mut metadata = record.metadata;
        metadata.insert(TEXT_FIELD.to_string(), record.document);
        Self {
            id: record.id,
            values: record.embedding,
            metadata,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    total_vector_count: usize,
    #[serde(default)]
    namespaces: BTreeMap<String, NamespaceStats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}

impl IndexStats {
    fn count_for(&self, namespace: Option<&str>) -> usize {
        match namespace {
            Some(ns) => self.namespaces.get(ns).map(|s| s.vector_count).unwrap_or(0),
            None => self.total_vector_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    type Seen = Arc<Mutex<Vec<String>>>;

    /// Bind a local listener and return it with its base URL.
    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        (listener, base)
    }

    /// Answer each `"METHOD /path"` with a fixed status and JSON body.
    /// Unknown routes get a 404. Returns the request lines seen, in order.
    fn serve(listener: TcpListener, routes: Vec<(&'static str, u16, String)>) -> Seen {
        let seen: Seen = Arc::default();
        let log = Arc::clone(&seen);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { return };
                let mut stream = BufReader::new(stream);

                let mut request_line = String::new();
                stream.read_line(&mut request_line).await.unwrap();
                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    stream.read_line(&mut header).await.unwrap();
                    if header.trim().is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        }
                    }
                }
                let mut body = vec![0u8; content_length];
                stream.read_exact(&mut body).await.unwrap();

                let route: String = request_line.split_whitespace().take(2).collect::<Vec<_>>().join(" ");
                log.lock().unwrap().push(route.clone());
                let (status, payload) = routes
                    .iter()
                    .find(|(r, _, _)| *r == route)
                    .map(|(_, status, payload)| (*status, payload.clone()))
                    .unwrap_or((404, r#"{"error":"not found"}"#.to_string()));

                let response = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                    payload.len()
                );
                stream.get_mut().write_all(response.as_bytes()).await.unwrap();
                stream.get_mut().shutdown().await.unwrap();
            }
        });
        seen
    }

    fn index_at(control_plane: &str) -> PineconeIndex {
        PineconeIndex::new("key", "legal-landmark-cases", Duration::from_secs(5))
            .unwrap()
            .with_control_plane(control_plane)
    }

    #[tokio::test]
    async fn unknown_index_is_not_found() {
        let (listener, base) = bind().await;
        serve(listener, vec![]);

        let err = index_at(&base).search(&[0.1, 0.2], 5).await.unwrap_err();
        assert!(matches!(err, IndexError::NotFound(ref name) if name == "legal-landmark-cases"));
    }

    #[tokio::test]
    async fn host_is_resolved_once_then_queried() {
        let (listener, base) = bind().await;
        let seen = serve(
            listener,
            vec![
                ("GET /indexes/legal-landmark-cases", 200, format!(r#"{{"host":"{base}"}}"#)),
                (
                    "POST /query",
                    200,
                    r#"{"matches":[{"id":"maneka_0001","score":0.88,"metadata":{"chunk_text":"Procedure must be fair.","case_title":"Maneka Gandhi v. Union of India"}}]}"#.to_string(),
                ),
                ("POST /describe_index_stats", 200, r#"{"totalVectorCount":42}"#.to_string()),
            ],
        );

        let index = index_at(&base);
        let hits = index.search(&[0.1, 0.2], 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "Procedure must be fair.");
        assert_eq!(hits[0].chunk.meta("case_title"), Some("Maneka Gandhi v. Union of India"));
        assert_eq!(index.count().await.unwrap(), 42);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "GET /indexes/legal-landmark-cases",
                "POST /query",
                "POST /describe_index_stats",
            ]
        );
    }

    #[tokio::test]
    async fn server_error_maps_to_backend_status() {
        let (listener, base) = bind().await;
        serve(listener, vec![("POST /query", 500, r#"{"message":"internal"}"#.to_string())]);

        let index = PineconeIndex::new("key", "legal-landmark-cases", Duration::from_secs(5))
            .unwrap()
            .with_host(&base);
        let err = index.search(&[0.1, 0.2], 5).await.unwrap_err();
        match err {
            IndexError::Backend { status_code, message } => {
                assert_eq!(status_code, 500);
                assert!(message.contains("internal"));
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn query_match_extracts_text_and_metadata() {
        let raw = r#"{
            "matches": [
                {
                    "id": "kesavananda_0003",
                    "score": 0.91,
                    "metadata": {
                        "chunk_text": "The basic structure of the Constitution...",
                        "case_title": "Kesavananda Bharati v. State of Kerala",
                        "date_of_judgment": "1973-04-24",
                        "bench": "S.M. Sikri",
                        "year": 1973
                    }
                },
                { "id": "bare", "score": 0.5 }
            ],
            "namespace": ""
        }"#;

        let response: QueryResponse = serde_json::from_str(raw).unwrap();
        let hits: Vec<ScoredChunk> = response.matches.into_iter().map(QueryMatch::into_scored).collect();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "The basic structure of the Constitution...");
        assert_eq!(hits[0].chunk.meta("case_title"), Some("Kesavananda Bharati v. State of Kerala"));
        assert_eq!(hits[0].chunk.meta("year"), Some("1973"));
        assert!(hits[0].chunk.meta(TEXT_FIELD).is_none());
        assert!((hits[0].score - 0.91).abs() < 1e-6);
        assert!(hits[1].chunk.is_blank());
    }

    #[test]
    fn empty_query_response_has_no_matches() {
        let response: QueryResponse = serde_json::from_str(r#"{"namespace":""}"#).unwrap();
        assert!(response.matches.is_empty());
    }

    #[test]
    fn query_request_uses_camel_case() {
        let body = QueryRequest {
            vector: &[0.1, 0.2],
            top_k: 5,
            include_metadata: true,
            include_values: false,
            namespace: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["topK"], 5);
        assert_eq!(json["includeMetadata"], true);
        assert!(json.get("namespace").is_none());
    }

    #[test]
    fn upsert_vector_stores_document_as_chunk_text() {
        let record = IndexRecord {
            id: "c1".into(),
            embedding: vec![0.5],
            document: "Article 14 equality".into(),
            metadata: BTreeMap::from([("bench".to_string(), "P.N. Bhagwati".to_string())]),
        };
        let json = serde_json::to_value(UpsertVector::from(record)).unwrap();
        assert_eq!(json["metadata"][TEXT_FIELD], "Article 14 equality");
        assert_eq!(json["metadata"]["bench"], "P.N. Bhagwati");
    }

    #[test]
    fn stats_count_by_namespace() {
        let stats: IndexStats = serde_json::from_str(
            r#"{"totalVectorCount": 120, "namespaces": {"": {"vectorCount": 100}, "landmark": {"vectorCount": 20}}}"#,
        )
        .unwrap();
        assert_eq!(stats.count_for(None), 120);
        assert_eq!(stats.count_for(Some("landmark")), 20);
        assert_eq!(stats.count_for(Some("missing")), 0);
    }

    #[test]
    fn host_gets_scheme() {
        assert_eq!(normalize_host("idx-abc.svc.pinecone.io"), "https://idx-abc.svc.pinecone.io");
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let config = HostedIndexConfig::default();
        let err = PineconeIndex::from_config(&config, Duration::from_secs(5)).err().unwrap();
        assert!(err.to_string().contains("PINECONE_API_KEY"));
    }

    #[tokio::test]
    async fn configured_host_skips_lookup() {
        let index = PineconeIndex::new("key", "legal-landmark-cases", Duration::from_secs(5))
            .unwrap()
            .with_host("idx.svc.pinecone.io");
        assert_eq!(index.host().await.unwrap(), "https://idx.svc.pinecone.io");
    }
}
