//! In-memory vector store.
//!
//! Reference implementation of the `VectorStoreProvider` port: exact
//! brute-force scoring over process-local maps. Used by the `memory` engine
//! configuration and throughout the test suites. Snapshots serialize a whole
//! collection to a JSON file under the configured snapshot directory.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vortex_domain::error::{Error, Result};
use vortex_domain::ports::vector_store::{CollectionSpec, VectorStoreProvider};
use vortex_domain::value_objects::{
    CollectionInfo, Filter, Payload, PointRecord, QueryVector, SearchHit, SnapshotInfo, VectorKind,
    cosine_similarity,
};

/// Process-local vector store.
#[derive(Clone)]
pub struct InMemoryVectorStore {
    collections: Arc<DashMap<String, Collection>>,
    snapshot_dir: PathBuf,
}

struct Collection {
    spec: CollectionSpec,
    points: DashMap<Uuid, PointRecord>,
}

/// Serialized form of one collection inside a snapshot file.
#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    collection: String,
    spec: CollectionSpec,
    points: Vec<PointRecord>,
}

impl InMemoryVectorStore {
    /// Create a store with snapshots written under `snapshot_dir`.
    #[must_use]
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            collections: Arc::new(DashMap::new()),
            snapshot_dir: snapshot_dir.into(),
        }
    }

    fn score_point(point: &PointRecord, using: VectorKind, query: &QueryVector) -> f64 {
        match (using, query) {
            (VectorKind::Dense, QueryVector::Dense(q)) => {
                f64::from(cosine_similarity(&point.vectors.dense, q))
            }
            (VectorKind::Sparse, QueryVector::Sparse(q)) => f64::from(point.vectors.sparse.dot(q)),
            (VectorKind::Splade, QueryVector::Sparse(q)) => f64::from(point.vectors.splade.dot(q)),
            _ => 0.0,
        }
    }

    fn require(
        &self,
        name: &str,
    ) -> Result<dashmap::mapref::one::Ref<'_, String, Collection>> {
        self.collections
            .get(name)
            .ok_or_else(|| Error::not_found(format!("collection '{name}'")))
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, spec: &CollectionSpec) -> Result<()> {
        self.collections.insert(
            name.to_owned(),
            Collection {
                spec: spec.clone(),
                points: DashMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("collection '{name}'")))
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.contains_key(name))
    }

    async fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let mut infos: Vec<CollectionInfo> = self
            .collections
            .iter()
            .map(|entry| CollectionInfo {
                name: entry.key().clone(),
                points_count: entry.value().points.len() as u64,
                vector_size: Some(entry.value().spec.dense_size),
                status: "green".to_owned(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<()> {
        let entry = self.require(collection)?;
        for point in points {
            entry.points.insert(point.id, point);
        }
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
        let entry = self.require(collection)?;
        let mut hits: Vec<SearchHit> = entry
            .points
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.value().payload)))
            .map(|p| SearchHit {
                id: p.value().id.to_string(),
                score: Self::score_point(p.value(), using, &query),
                payload: p.value().payload.clone(),
            })
            .filter(|h| score_threshold.is_none_or(|t| h.score >= f64::from(t)))
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn retrieve(&self, collection: &str, ids: &[Uuid]) -> Result<Vec<SearchHit>> {
        let entry = self.require(collection)?;
        Ok(ids
            .iter()
            .filter_map(|id| entry.points.get(id))
            .map(|p| SearchHit {
                id: p.id.to_string(),
                score: 0.0,
                payload: p.payload.clone(),
            })
            .collect())
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: usize,
        offset: Option<String>,
    ) -> Result<(Vec<SearchHit>, Option<String>)> {
        let entry = self.require(collection)?;
        let mut matching: Vec<SearchHit> = entry
            .points
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.value().payload)))
            .map(|p| SearchHit {
                id: p.value().id.to_string(),
                score: 0.0,
                payload: p.value().payload.clone(),
            })
            .collect();
        // Stable order so cursors stay meaningful across calls.
        matching.sort_by(|a, b| a.id.cmp(&b.id));

        let start = match offset {
            Some(cursor) => matching
                .iter()
                .position(|h| h.id > cursor)
                .unwrap_or(matching.len()),
            None => 0,
        };
        let page: Vec<SearchHit> = matching.into_iter().skip(start).take(limit).collect();
        let next = if page.len() == limit {
            page.last().map(|h| h.id.clone())
        } else {
            None
        };
        Ok((page, next))
    }

    async fn set_payload(&self, collection: &str, ids: &[Uuid], payload: &Payload) -> Result<()> {
        let entry = self.require(collection)?;
        for id in ids {
            if let Some(mut point) = entry.points.get_mut(id) {
                point.payload = payload.clone();
            }
        }
        Ok(())
    }

    async fn delete_by_filter(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let entry = self.require(collection)?;
        let doomed: Vec<Uuid> = entry
            .points
            .iter()
            .filter(|p| filter.matches(&p.value().payload))
            .map(|p| p.value().id)
            .collect();
        for id in &doomed {
            entry.points.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        Ok(self.require(collection)?.points.len() as u64)
    }

    async fn create_snapshot(&self, collection: &str) -> Result<SnapshotInfo> {
        let entry = self.require(collection)?;
        let file = SnapshotFile {
            collection: collection.to_owned(),
            spec: entry.spec.clone(),
            points: entry.points.iter().map(|p| p.value().clone()).collect(),
        };
        drop(entry);

        std::fs::create_dir_all(&self.snapshot_dir)
            .map_err(|e| Error::io_with_source("create snapshot directory", e))?;
        let created_at = chrono::Utc::now();
        let name = format!("{collection}-{}.snapshot", created_at.timestamp());
        let path = self.snapshot_dir.join(&name);
        let body = serde_json::to_vec(&file)?;
        std::fs::write(&path, body).map_err(|e| Error::io_with_source("write snapshot", e))?;

        Ok(SnapshotInfo {
            name,
            collection: collection.to_owned(),
            path: path.display().to_string(),
            created_at: created_at.to_rfc3339(),
        })
    }

    async fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>> {
        let mut snapshots = Vec::new();
        let entries = match std::fs::read_dir(&self.snapshot_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(snapshots),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("snapshot") {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let collection = name.split('-').next().unwrap_or_default().to_owned();
            let created_at = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
                .unwrap_or_default();
            snapshots.push(SnapshotInfo {
                name,
                collection,
                path: path.display().to_string(),
                created_at,
            });
        }
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(snapshots)
    }

    async fn restore_snapshot(&self, path: &str) -> Result<()> {
        let body = std::fs::read(path)
            .map_err(|e| Error::io_with_source(format!("read snapshot '{path}'"), e))?;
        let file: SnapshotFile = serde_json::from_slice(&body)?;
        let points = DashMap::new();
        for point in file.points {
            points.insert(point.id, point);
        }
        self.collections.insert(
            file.collection,
            Collection {
                spec: file.spec,
                points,
            },
        );
        Ok(())
    }

    async fn delete_snapshot(&self, path: &str) -> Result<()> {
        std::fs::remove_file(path)
            .map_err(|e| Error::io_with_source(format!("delete snapshot '{path}'"), e))
    }
}
