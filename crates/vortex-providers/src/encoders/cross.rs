//! HTTP cross-encoder used by the rerank stage.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use vortex_domain::error::{Error, Result};
use vortex_domain::ports::encoders::CrossEncoder;

/// Remote cross-encoder scoring `(query, document)` pairs.
pub struct HttpCrossEncoder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Deserialize)]
struct RerankResponse {
    scores: Vec<f32>,
}

impl HttpCrossEncoder {
    /// Create a cross-encoder client for the given endpoint and model.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl CrossEncoder for HttpCrossEncoder {
    async fn score(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({
                "model": self.model,
                "query": query,
                "documents": texts,
            }))
            .send()
            .await
            .map_err(|e| Error::upstream_with_source("cross-encoder unreachable", e))?;

        if !response.status().is_success() {
            return Err(Error::encoder(format!(
                "cross-encoder returned {}",
                response.status()
            )));
        }

        let body: RerankResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream_with_source("cross-encoder response unreadable", e))?;

        if body.scores.len() != texts.len() {
            return Err(Error::encoder(format!(
                "cross-encoder returned {} scores for {} documents",
                body.scores.len(),
                texts.len()
            )));
        }
        Ok(body.scores)
    }
}
