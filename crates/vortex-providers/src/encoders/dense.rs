//! HTTP dense encoder.
//!
//! Posts to an OpenAI-compatible `/embeddings` endpoint and L2-normalizes the
//! returned vectors so cosine and dot product coincide downstream.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use vortex_domain::error::{Error, Result};
use vortex_domain::ports::encoders::DenseEncoder;

/// Remote dense sentence encoder.
pub struct HttpDenseEncoder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl HttpDenseEncoder {
    /// Create an encoder for the given endpoint and model.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            dimensions,
        }
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await
            .map_err(|e| Error::upstream_with_source("dense encoder unreachable", e))?;

        if !response.status().is_success() {
            return Err(Error::encoder(format!(
                "dense encoder returned {}",
                response.status()
            )));
        }

        let body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream_with_source("dense encoder response unreadable", e))?;

        if body.data.len() != texts.len() {
            return Err(Error::encoder(format!(
                "dense encoder returned {} vectors for {} inputs",
                body.data.len(),
                texts.len()
            )));
        }

        Ok(body
            .data
            .into_iter()
            .map(|row| l2_normalize(row.embedding))
            .collect())
    }
}

fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

#[async_trait]
impl DenseEncoder for HttpDenseEncoder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(std::slice::from_ref(&text.to_owned())).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::encoder("dense encoder returned no vector"))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
