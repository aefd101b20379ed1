//! Encoder set ports.
//!
//! Embedding models are external collaborators: each encoder is a pure
//! function from text to a vector. BM25 is the exception; it is fitted
//! in-process over a corpus and holds vocabulary state behind interior
//! mutability so a retrain can atomically swap the model.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::SparseVector;

/// Dense sentence encoder; output is L2-normalized.
#[async_trait]
pub trait DenseEncoder: Send + Sync {
    /// Encode a single text
    async fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encode a batch of texts
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Output dimensionality
    fn dimensions(&self) -> usize;
}

/// BM25-style sparse encoder over a fitted vocabulary.
pub trait SparseEncoder: Send + Sync {
    /// Encode text; returns an empty vector until the model is fitted
    fn encode(&self, text: &str) -> SparseVector;

    /// True once a model has been fitted or loaded
    fn is_ready(&self) -> bool;

    /// Fit the vocabulary and document statistics over a corpus, replacing
    /// the active model atomically
    ///
    /// # Errors
    /// Returns an error when the corpus is empty or the model cannot be
    /// persisted.
    fn fit(&self, corpus: &[String]) -> Result<()>;
}

/// SPLADE sparse expansion encoder.
#[async_trait]
pub trait SpladeEncoder: Send + Sync {
    /// Encode a single text; empty when the encoder is disabled
    async fn encode(&self, text: &str) -> Result<SparseVector>;

    /// Encode a batch of texts
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<SparseVector>>;

    /// False when SPLADE is disabled by configuration
    fn enabled(&self) -> bool;
}

/// Cross-encoder used only by the rerank stage.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// Score each `(query, text)` pair; higher is more relevant
    async fn score(&self, query: &str, texts: &[String]) -> Result<Vec<f32>>;
}
