//! HTTP SPLADE encoder.
//!
//! The remote masked-LM service returns per-text vocabulary logits already
//! max-pooled over token positions; `log(1 + relu(·))`, thresholding, and the
//! top-k cap are applied locally. A disabled encoder returns empty vectors so
//! ingestion and search degrade to dense + BM25.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use vortex_domain::error::{Error, Result};
use vortex_domain::ports::encoders::SpladeEncoder;
use vortex_domain::value_objects::SparseVector;

/// SPLADE tuning knobs, sourced from configuration.
#[derive(Debug, Clone)]
pub struct SpladeSettings {
    /// Inference endpoint URL
    pub endpoint: String,
    /// Model name forwarded to the service
    pub model: String,
    /// Token truncation length forwarded to the service
    pub max_length: usize,
    /// Minimum activation kept after `log1p(relu(·))`
    pub threshold: f32,
    /// Maximum number of terms kept per vector
    pub top_k: usize,
    /// Master toggle; disabled encoders return empty vectors
    pub enabled: bool,
}

/// Remote SPLADE sparse expansion encoder.
pub struct HttpSpladeEncoder {
    client: reqwest::Client,
    settings: SpladeSettings,
}

#[derive(Deserialize)]
struct SpladeResponse {
    data: Vec<SpladeRow>,
}

#[derive(Deserialize)]
struct SpladeRow {
    logits: Vec<f32>,
}

impl HttpSpladeEncoder {
    /// Create an encoder with the given settings.
    #[must_use]
    pub fn new(settings: SpladeSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
        let response = self
            .client
            .post(&self.settings.endpoint)
            .json(&json!({
                "model": self.settings.model,
                "input": texts,
                "max_length": self.settings.max_length,
            }))
            .send()
            .await
            .map_err(|e| Error::upstream_with_source("SPLADE encoder unreachable", e))?;

        if !response.status().is_success() {
            return Err(Error::encoder(format!(
                "SPLADE encoder returned {}",
                response.status()
            )));
        }

        let body: SpladeResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream_with_source("SPLADE response unreadable", e))?;

        Ok(body
            .data
            .into_iter()
            .map(|row| sparsify_logits(&row.logits, self.settings.threshold, self.settings.top_k))
            .collect())
    }
}

/// Turn max-pooled vocabulary logits into a sparse vector:
/// `w = log(1 + relu(logit))`, keep `w > threshold`, cap at `top_k` terms.
#[must_use]
pub fn sparsify_logits(logits: &[f32], threshold: f32, top_k: usize) -> SparseVector {
    let mut pairs: Vec<(u32, f32)> = logits
        .iter()
        .enumerate()
        .map(|(i, logit)| (i as u32, logit.max(0.0).ln_1p()))
        .filter(|(_, w)| *w > threshold)
        .collect();

    if top_k > 0 && pairs.len() > top_k {
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1));
        pairs.truncate(top_k);
    }
    SparseVector::from_pairs(pairs)
}

#[async_trait]
impl SpladeEncoder for HttpSpladeEncoder {
    async fn encode(&self, text: &str) -> Result<SparseVector> {
        if !self.settings.enabled || text.trim().is_empty() {
            return Ok(SparseVector::default());
        }
        let mut vectors = self.request(std::slice::from_ref(&text.to_owned())).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::encoder("SPLADE encoder returned no vector"))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
        if !self.settings.enabled || texts.is_empty() {
            return Ok(vec![SparseVector::default(); texts.len()]);
        }
        self.request(texts).await
    }

    fn enabled(&self) -> bool {
        self.settings.enabled
    }
}
