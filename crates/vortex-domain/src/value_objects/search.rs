//! Search result and fusion value objects.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::constants::search::{
    DEFAULT_DENSE_WEIGHT, DEFAULT_SPARSE_WEIGHT, DEFAULT_SPLADE_WEIGHT,
};

use super::vectors::Payload;

/// A chunk-level hit returned by the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Point ID as a string
    pub id: String,
    /// Backend score (similarity or BM25-style)
    pub score: f64,
    /// Stored payload
    pub payload: Payload,
}

/// A document-level result after chunk collapse and fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// Content-hash ID of the logical document
    pub db_id: String,
    /// Final ranking score (fused, possibly reranked/boosted)
    pub score: f64,
    /// Mean of the contributing chunk scores (pre-rerank)
    pub avg_score: f64,
    /// Document title when present in the payload
    pub title: Option<String>,
    /// Collection the document came from
    pub collection: String,
    /// Representative payload (one contributing chunk)
    pub payload: Payload,
}

/// Score fusion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    /// Min-max normalized weighted sum
    #[display("weighted")]
    Weighted,
    /// Reciprocal rank fusion
    #[display("rrf")]
    ReciprocalRank,
}

/// Per-signal fusion weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionWeights {
    /// Dense signal weight
    pub dense: f64,
    /// BM25 sparse signal weight
    pub sparse: f64,
    /// SPLADE signal weight
    pub splade: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            dense: DEFAULT_DENSE_WEIGHT,
            sparse: DEFAULT_SPARSE_WEIGHT,
            splade: DEFAULT_SPLADE_WEIGHT,
        }
    }
}

impl FusionWeights {
    /// Derive weights from a single `alpha` knob: `alpha` goes to the dense
    /// signal, the remainder is split between sparse and SPLADE in their
    /// default proportions.
    #[must_use]
    pub fn from_alpha(alpha: f64) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        let rest = 1.0 - alpha;
        let sparse_share =
            DEFAULT_SPARSE_WEIGHT / (DEFAULT_SPARSE_WEIGHT + DEFAULT_SPLADE_WEIGHT);
        Self {
            dense: alpha,
            sparse: rest * sparse_share,
            splade: rest * (1.0 - sparse_share),
        }
    }
}

/// Per-request tuning overrides accepted by the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTuning {
    /// Dense/sparse balance shortcut (overrides `weights`)
    pub alpha: Option<f64>,
    /// Explicit fusion weights
    pub weights: Option<FusionWeights>,
    /// Fusion strategy override
    pub strategy: Option<FusionStrategy>,
    /// Toggle the cross-encoder rerank stage
    pub use_reranker: Option<bool>,
    /// Toggle the recency boost stage
    pub date_boost: Option<bool>,
}

/// Collection metadata surfaced by status endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name
    pub name: String,
    /// Number of stored points
    pub points_count: u64,
    /// Dense vector dimensionality, when known
    pub vector_size: Option<usize>,
    /// Backend-reported status string
    pub status: String,
}

/// Snapshot metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInfo {
    /// Snapshot name (backend-assigned)
    pub name: String,
    /// Collection the snapshot belongs to
    pub collection: String,
    /// Local filesystem path or backend location
    pub path: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}
