//! Hybrid search pipeline.
//!
//! Per-query orchestration: fan-out across collections and vector kinds,
//! score fusion, chunk-to-document collapse, optional cross-encoder rerank,
//! optional recency boost, tenancy scrubbing, and the semantic cache.

mod fusion;
mod pipeline;
mod recency;
mod scrub;

pub use fusion::{
    DocAggregate, FusedChunk, collapse_documents, normalize_scores, rrf_fuse, weighted_fuse,
};
pub use pipeline::{HybridSearchPipeline, PipelineConfig, SearchRequest};
pub use recency::{apply_date_boost, extract_date_from_text, extract_document_date};
pub use scrub::{is_visible_to, scrub_results, tenancy_filter};
