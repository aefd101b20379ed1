//! Search pipeline constants.

/// Upper bound accepted for `top_k` in any query
pub const MAX_TOP_K: usize = 100;

/// Default fusion weight for the dense signal
pub const DEFAULT_DENSE_WEIGHT: f64 = 0.6;
/// Default fusion weight for the BM25 sparse signal
pub const DEFAULT_SPARSE_WEIGHT: f64 = 0.25;
/// Default fusion weight for the SPLADE signal
pub const DEFAULT_SPLADE_WEIGHT: f64 = 0.15;

/// Reciprocal-rank fusion smoothing constant
pub const DEFAULT_RRF_K: f64 = 60.0;

/// Scan cap multiplier when scrolling for unique parent documents.
/// A collection scan stops after `top_k * SCAN_CAP_FACTOR` chunk hits.
pub const SCAN_CAP_FACTOR: usize = 20;

/// Similarity threshold for a semantic cache hit
pub const SEMANTIC_CACHE_THRESHOLD: f32 = 0.95;
/// Name of the dedicated semantic cache collection
pub const SEMANTIC_CACHE_COLLECTION: &str = "semantic_cache";

/// Default exponential decay rate for the recency boost (per day)
pub const DATE_BOOST_DECAY_RATE: f64 = 0.02;
/// Default weight applied to the freshness term
pub const DATE_BOOST_WEIGHT: f64 = 0.45;

/// Minimum score spread before min-max normalization degenerates to 0.5
pub const SCORE_EPSILON: f64 = 1e-8;
