//! Vector store provider port.

use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::value_objects::{
    CollectionInfo, Filter, Payload, PointRecord, QueryVector, SearchHit, SnapshotInfo, VectorKind,
};

/// Distance metric for the dense vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Distance {
    /// Cosine similarity
    #[display("Cosine")]
    Cosine,
    /// Euclidean distance
    #[display("Euclid")]
    Euclid,
    /// Dot product
    #[display("Dot")]
    Dot,
}

/// Schema for a new collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Dense vector dimensionality
    pub dense_size: usize,
    /// Dense distance metric
    pub distance: Distance,
    /// Names of the sparse sub-vectors (`sparse`, `splade`)
    pub sparse_vectors: Vec<String>,
}

impl CollectionSpec {
    /// Standard spec with both sparse sub-vectors
    #[must_use]
    pub fn hybrid(dense_size: usize) -> Self {
        Self {
            dense_size,
            distance: Distance::Cosine,
            sparse_vectors: vec!["sparse".to_owned(), "splade".to_owned()],
        }
    }

    /// Dense-only spec (used by the semantic cache collection)
    #[must_use]
    pub fn dense_only(dense_size: usize) -> Self {
        Self {
            dense_size,
            distance: Distance::Cosine,
            sparse_vectors: Vec::new(),
        }
    }
}

/// Typed facade over the external vector store.
///
/// All calls are suspension points; implementations translate errors to
/// [`crate::error::Error::Upstream`] after bounded retries.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create a collection with the given schema
    async fn create_collection(&self, name: &str, spec: &CollectionSpec) -> Result<()>;

    /// Drop a collection and all of its points
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// True when the collection exists
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// List all collections with counts and schema info
    async fn list_collections(&self) -> Result<Vec<CollectionInfo>>;

    /// Insert or overwrite points; idempotent for identical input
    async fn upsert(&self, collection: &str, points: Vec<PointRecord>) -> Result<()>;

    /// Search one named vector, optionally filtered
    async fn search(
        &self,
        collection: &str,
        using: VectorKind,
        query: QueryVector,
        limit: usize,
        filter: Option<&Filter>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<SearchHit>>;

    /// Fetch points by ID (score is 0 on returned hits)
    async fn retrieve(&self, collection: &str, ids: &[Uuid]) -> Result<Vec<SearchHit>>;

    /// Page through points matching a filter; returns the next cursor
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&Filter>,
        limit: usize,
        offset: Option<String>,
    ) -> Result<(Vec<SearchHit>, Option<String>)>;

    /// Replace the payload of the given points
    async fn set_payload(&self, collection: &str, ids: &[Uuid], payload: &Payload) -> Result<()>;

    /// Delete every point matching the filter; returns the count when known
    async fn delete_by_filter(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Number of points in the collection
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Create a snapshot of a collection
    async fn create_snapshot(&self, collection: &str) -> Result<SnapshotInfo>;

    /// List known snapshots
    async fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>>;

    /// Restore a snapshot from a whitelisted path
    async fn restore_snapshot(&self, path: &str) -> Result<()>;

    /// Delete a snapshot at a whitelisted path
    async fn delete_snapshot(&self, path: &str) -> Result<()>;
}
