//! Encoder set implementations.
//!
//! BM25 runs in-process over a fitted vocabulary; the dense, SPLADE, and
//! cross-encoder models are external inference services reached over HTTP
//! and treated as pure functions.

mod bm25;
mod cross;
mod dense;
mod splade;

pub use bm25::{Bm25Encoder, Bm25Model};
pub use cross::HttpCrossEncoder;
pub use dense::HttpDenseEncoder;
pub use splade::{HttpSpladeEncoder, SpladeSettings, sparsify_logits};
