//! Immutable value objects shared across the gateway.

/// Request-scoped caller identity
pub mod context;
/// Payload filter grammar
pub mod filter;
/// Search results, fusion settings, collection metadata
pub mod search;
/// Dense and sparse vector types
pub mod vectors;

pub use context::{AuthMethod, UserContext};
pub use filter::{FieldCondition, Filter, MatchValue};
pub use search::{
    CollectionInfo, FusionStrategy, FusionWeights, ScoredDocument, SearchHit, SearchTuning,
    SnapshotInfo,
};
pub use vectors::{
    NamedVectors, Payload, PointRecord, QueryVector, SparseVector, VectorKind, cosine_similarity,
};
