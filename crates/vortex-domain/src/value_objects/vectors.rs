//! Dense and sparse vector value objects.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Flattened payload attached to a stored point.
///
/// Unknown client fields ride along as extra entries; the gateway-reserved
/// keys (`db_id`, `tenant_id`, ...) are plain members of the same map.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Sparse vector over a vocabulary: parallel `indices` / `values` arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Vocabulary indices with non-zero weight
    pub indices: Vec<u32>,
    /// Weights aligned with `indices`
    pub values: Vec<f32>,
}

impl SparseVector {
    /// True when the vector carries no terms
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Build from `(index, weight)` pairs, sorted by index for determinism
    #[must_use]
    pub fn from_pairs(mut pairs: Vec<(u32, f32)>) -> Self {
        pairs.sort_by_key(|(i, _)| *i);
        Self {
            indices: pairs.iter().map(|(i, _)| *i).collect(),
            values: pairs.iter().map(|(_, v)| *v).collect(),
        }
    }

    /// Dot product against another sparse vector
    #[must_use]
    pub fn dot(&self, other: &Self) -> f32 {
        let mut score = 0.0;
        let mut i = 0;
        let mut j = 0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    score += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        score
    }
}

/// The named vector set carried by every chunk point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedVectors {
    /// L2-normalized dense embedding
    pub dense: Vec<f32>,
    /// BM25 sparse vector (empty until the model is fitted)
    pub sparse: SparseVector,
    /// SPLADE expansion vector (empty when SPLADE is disabled)
    pub splade: SparseVector,
}

/// Which named vector a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum VectorKind {
    /// Dense ANN search
    #[display("dense")]
    Dense,
    /// BM25 inverted-index search
    #[display("sparse")]
    Sparse,
    /// SPLADE expansion search
    #[display("splade")]
    Splade,
}

impl VectorKind {
    /// Wire name of the named vector
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dense => "dense",
            Self::Sparse => "sparse",
            Self::Splade => "splade",
        }
    }
}

/// A query vector for one retrieval signal.
#[derive(Debug, Clone)]
pub enum QueryVector {
    /// Dense embedding query
    Dense(Vec<f32>),
    /// Sparse (BM25 or SPLADE) query
    Sparse(SparseVector),
}

/// A physical point as stored in the vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRecord {
    /// Deterministic point ID (UUID v5 over `db_id:chunk_index`)
    pub id: Uuid,
    /// Named vector set
    pub vectors: NamedVectors,
    /// Flattened payload
    pub payload: Payload,
}

/// Cosine similarity between two dense vectors.
///
/// Returns 0.0 on dimension mismatch or zero norms.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    let denom = na.sqrt() * nb.sqrt();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    dot / denom
}
