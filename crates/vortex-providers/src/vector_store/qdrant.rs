//! Qdrant REST vector store provider.
//!
//! Thin typed facade over the Qdrant HTTP API. Named vectors map directly:
//! `dense` is the configured dense vector, `sparse` and `splade` are sparse
//! sub-vectors. Transient transport failures are retried a bounded number of
//! times before surfacing as `UPSTREAM_UNAVAILABLE`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use uuid::Uuid;

use vortex_domain::error::{Error, Result};
use vortex_domain::ports::vector_store::{CollectionSpec, VectorStoreProvider};
use vortex_domain::value_objects::{
    CollectionInfo, Filter, MatchValue, Payload, PointRecord, QueryVector, SearchHit, SnapshotInfo,
    VectorKind,
};

const RETRY_ATTEMPTS: usize = 3;
const RETRY_BASE_DELAY_MS: u64 = 200;

/// Connection settings for the Qdrant backend.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Base URL, e.g. `http://localhost:6333`
    pub url: String,
    /// Optional API key sent as `api-key`
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl QdrantConfig {
    /// Config for the given base URL with a 30s timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Qdrant REST client implementing the vector store port.
pub struct QdrantVectorStore {
    client: reqwest::Client,
    config: QdrantConfig,
}

impl QdrantVectorStore {
    /// Build a provider from connection settings.
    ///
    /// # Errors
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: QdrantConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::upstream_with_source("build Qdrant HTTP client", e))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), path)
    }

    async fn request(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.endpoint(path);
        let mut last_err: Option<Error> = None;

        for attempt in 0..RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(
                    RETRY_BASE_DELAY_MS * (1 << attempt),
                ))
                .await;
            }

            let mut req = self.client.request(method.clone(), &url);
            if let Some(key) = &self.config.api_key {
                req = req.header("api-key", key);
            }
            if let Some(b) = &body {
                req = req.json(b);
            }

            match req.send().await {
                Ok(resp) => {
                    let status = resp.status();
                    let payload: Value = resp.json().await.unwrap_or(Value::Null);
                    if status.is_success() {
                        return Ok(payload);
                    }
                    let detail = payload
                        .pointer("/status/error")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown backend error");
                    if status.as_u16() == 404 {
                        return Err(Error::not_found(detail.to_owned()));
                    }
                    // 4xx responses are not retried; the request is wrong.
                    if status.is_client_error() {
                        return Err(Error::upstream(format!("qdrant {status}: {detail}")));
                    }
                    last_err = Some(Error::upstream(format!("qdrant {status}: {detail}")));
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, url = %url, "qdrant request failed");
                    last_err = Some(Error::upstream_with_source("qdrant unreachable", e));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::upstream("qdrant request failed")))
    }

    fn filter_to_json(filter: &Filter) -> Value {
        fn condition(c: &vortex_domain::value_objects::FieldCondition) -> Value {
            let matcher = match &c.matches {
                MatchValue::Value(v) => json!({ "value": v }),
                MatchValue::Any(vs) => json!({ "any": vs }),
            };
            json!({ "key": c.key, "match": matcher })
        }

        let mut out = serde_json::Map::new();
        if !filter.must.is_empty() {
            out.insert(
                "must".to_owned(),
                Value::Array(filter.must.iter().map(condition).collect()),
            );
        }
        if !filter.should.is_empty() {
            out.insert(
                "should".to_owned(),
                Value::Array(filter.should.iter().map(condition).collect()),
            );
        }
        if !filter.must_not.is_empty() {
            out.insert(
                "must_not".to_owned(),
                Value::Array(filter.must_not.iter().map(condition).collect()),
            );
        }
        Value::Object(out)
    }

    fn parse_hit(value: &Value) -> Option<SearchHit> {
        let id = match value.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return None,
        };
        let score = value.get("score").and_then(Value::as_f64).unwrap_or(0.0);
        let payload = value
            .get("payload")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Some(SearchHit { id, score, payload })
    }

    fn parse_hits(result: &Value, pointer: &str) -> Vec<SearchHit> {
        result
            .pointer(pointer)
            .and_then(Value::as_array)
            .map(|hits| hits.iter().filter_map(Self::parse_hit).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VectorStoreProvider for QdrantVectorStore {
    async fn create_collection(&self, name: &str, spec: &CollectionSpec) -> Result<()> {
        let mut body = json!({
            "vectors": {
                "dense": { "size": spec.dense_size, "distance": spec.distance.to_string() }
            }
        });
        if !spec.sparse_vectors.is_empty() {
            let sparse: serde_json::Map<String, Value> = spec
                .sparse_vectors
                .iter()
                .map(|name| (name.clone(), json!({})))
                .collect();
            body["sparse_vectors"] = Value::Object(sparse);
        }
        self.request(
            reqwest::Method::PUT,
            &format!("collections/{name}"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.request(
            reqwest::Method::DELETE,
            &format!("collections/{name}"),
            None,
        )
        .await?;
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        match self
            .request(reqwest::Method::GET, &format!("collections/{name}"), None)
            .await
        {
            Ok(_) => Ok(true),
            Err(Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let listing = self
            .request(reqwest::Method::GET, "collections", None)
            .await?;
        let names: Vec<String> = listing
            .pointer("/result/collections")
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(|c| c.get("name").and_then(Value::as_str))
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let mut infos = Vec::with_capacity(names.len());
        for name in names {
            let detail = self
                .request(reqwest::Method::GET, &format!("collections/{name}"), None)
                .await
                .unwrap_or(Value::Null);
            let points_count = detail
                .pointer("/result/points_count")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let vector_size = detail
                .pointer("/result/config/params/vectors/dense/size")
                .and_then(Value::as_u64)
                .map(|s| s as usize);
            let status = detail
                .pointer("/result/status")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_owned();
            infos.push(CollectionInfo {
                name,
                points_count,
                vector_size,
                status,
            });
        }
        Ok(infos)
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<()> {
        let body_points: Vec<Value> = points
            .into_iter()
            .map(|p| {
                let mut vector = serde_json::Map::new();
                vector.insert("dense".to_owned(), json!(p.vectors.dense));
                vector.insert(
                    "sparse".to_owned(),
                    json!({ "indices": p.vectors.sparse.indices, "values": p.vectors.sparse.values }),
                );
                vector.insert(
                    "splade".to_owned(),
                    json!({ "indices": p.vectors.splade.indices, "values": p.vectors.splade.values }),
                );
                json!({
                    "id": p.id.to_string(),
                    "vector": Value::Object(vector),
                    "payload": Value::Object(p.payload),
                })
            })
            .collect();

        self.request(
            reqwest::Method::PUT,
            &format!("collections/{collection}/points?wait=true"),
            Some(json!({ "points": body_points })),
        )
        .await?;
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        using: VectorKind,
        query: QueryVector,
        limit: usize,
        filter: Option<&Filter>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>> {
        let vector = match query {
            QueryVector::Dense(v) => json!({ "name": using.as_str(), "vector": v }),
            QueryVector::Sparse(v) => json!({
                "name": using.as_str(),
                "vector": { "indices": v.indices, "values": v.values }
            }),
        };
        let mut body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });
        if let Some(f) = filter {
            body["filter"] = Self::filter_to_json(f);
        }
        if let Some(t) = score_threshold {
            body["score_threshold"] = json!(t);
        }

        let result = self
            .request(
                reqwest::Method::POST,
                &format!("collections/{collection}/points/search"),
                Some(body),
            )
            .await?;
        Ok(Self::parse_hits(&result, "/result"))
    }

    async fn retrieve(&self, collection: &str, ids: &[Uuid]) -> Result<Vec<SearchHit>> {
        let body = json!({
            "ids": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "with_payload": true,
        });
        let result = self
            .request(
                reqwest::Method::POST,
                &format!("collections/{collection}/points"),
                Some(body),
            )
            .await?;
        Ok(Self::parse_hits(&result, "/result"))
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: usize,
        offset: Option<String>,
    ) -> Result<(Vec<SearchHit>, Option<String>)> {
        let mut body = json!({ "limit": limit, "with_payload": true });
        if let Some(f) = filter {
            body["filter"] = Self::filter_to_json(f);
        }
        if let Some(cursor) = offset {
            body["offset"] = json!(cursor);
        }
        let result = self
            .request(
                reqwest::Method::POST,
                &format!("collections/{collection}/points/scroll"),
                Some(body),
            )
            .await?;
        let hits = Self::parse_hits(&result, "/result/points");
        let next = result
            .pointer("/result/next_page_offset")
            .and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
        Ok((hits, next))
    }

    async fn set_payload(&self, collection: &str, ids: &[Uuid], payload: &Payload) -> Result<()> {
        let body = json!({
            "payload": Value::Object(payload.clone()),
            "points": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        self.request(
            reqwest::Method::PUT,
            &format!("collections/{collection}/points/payload?wait=true"),
            Some(body),
        )
        .await?;
        Ok(())
    }

    async fn delete_by_filter(&self, collection: &str, filter: &Filter) -> Result<u64> {
        self.request(
            reqwest::Method::POST,
            &format!("collections/{collection}/points/delete?wait=true"),
            Some(json!({ "filter": Self::filter_to_json(filter) })),
        )
        .await?;
        // The backend reports an operation ID, not a deleted count.
        Ok(0)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let result = self
            .request(
                reqwest::Method::POST,
                &format!("collections/{collection}/points/count"),
                Some(json!({ "exact": true })),
            )
            .await?;
        Ok(result
            .pointer("/result/count")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    async fn create_snapshot(&self, collection: &str) -> Result<SnapshotInfo> {
        let result = self
            .request(
                reqwest::Method::POST,
                &format!("collections/{collection}/snapshots"),
                None,
            )
            .await?;
        let name = result
            .pointer("/result/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let created_at = result
            .pointer("/result/creation_time")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Ok(SnapshotInfo {
            path: format!("collections/{collection}/snapshots/{name}"),
            name,
            collection: collection.to_owned(),
            created_at,
        })
    }

    async fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>> {
        let mut snapshots = Vec::new();
        for info in self.list_collections().await? {
            let result = self
                .request(
                    reqwest::Method::GET,
                    &format!("collections/{}/snapshots", info.name),
                    None,
                )
                .await?;
            if let Some(items) = result.pointer("/result").and_then(Value::as_array) {
                for item in items {
                    let name = item
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned();
                    snapshots.push(SnapshotInfo {
                        path: format!("collections/{}/snapshots/{name}", info.name),
                        name,
                        collection: info.name.clone(),
                        created_at: item
                            .get("creation_time")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_owned(),
                    });
                }
            }
        }
        Ok(snapshots)
    }

    async fn restore_snapshot(&self, path: &str) -> Result<()> {
        // Path form: collections/{collection}/snapshots/{name}
        let collection = path
            .strip_prefix("collections/")
            .and_then(|rest| rest.split('/').next())
            .ok_or_else(|| Error::invalid_request(format!("malformed snapshot path '{path}'")))?;
        self.request(
            reqwest::Method::PUT,
            &format!("collections/{collection}/snapshots/recover"),
            Some(json!({ "location": path })),
        )
        .await?;
        Ok(())
    }

    async fn delete_snapshot(&self, path: &str) -> Result<()> {
        self.request(reqwest::Method::DELETE, path, None).await?;
        Ok(())
    }
}
