//! In-process BM25 (TF-IDF) sparse encoder.
//!
//! The model is a vocabulary with smoothed inverse document frequencies,
//! fitted over a corpus and persisted as a JSON statistics file. Retraining
//! writes a fresh file next to the target and renames it into place, then
//! swaps the in-memory model; readers never observe a torn model.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use vortex_domain::error::{Error, Result};
use vortex_domain::ports::encoders::SparseEncoder;
use vortex_domain::value_objects::SparseVector;

/// Tokens shorter than this are dropped.
const MIN_TOKEN_LEN: usize = 3;

/// Common English stopwords excluded from the vocabulary.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "has", "have", "this", "that", "with", "from", "they", "will", "would", "there",
    "their", "what", "about", "which", "when", "into", "than", "them", "then", "these", "some",
];

/// Fitted corpus statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Model {
    /// Term → vocabulary index
    pub vocabulary: BTreeMap<String, u32>,
    /// Smoothed IDF per vocabulary index
    pub idf: Vec<f32>,
    /// Number of documents the model was fitted on
    pub doc_count: usize,
}

impl Bm25Model {
    /// Fit vocabulary and IDF table over a corpus.
    ///
    /// # Errors
    /// Returns an error when the corpus yields no tokens.
    pub fn fit(corpus: &[String]) -> Result<Self> {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in corpus {
            let mut seen: Vec<String> = tokenize(doc);
            seen.sort();
            seen.dedup();
            for token in seen {
                *doc_freq.entry(token).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(Error::invalid_request("no data for BM25 fitting"));
        }

        // BTreeMap iteration gives stable alphabetical indices.
        let terms: BTreeMap<String, u32> = doc_freq
            .keys()
            .cloned()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .zip(0u32..)
            .collect();

        let n = corpus.len() as f32;
        let mut idf = vec![0.0f32; terms.len()];
        for (term, index) in &terms {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
            // Smoothed IDF: never zero, never negative.
            idf[*index as usize] = ((1.0 + n) / (1.0 + df)).ln() + 1.0;
        }

        Ok(Self {
            vocabulary: terms,
            idf,
            doc_count: corpus.len(),
        })
    }

    /// Encode text into L2-normalized TF-IDF weights over the vocabulary.
    #[must_use]
    pub fn encode(&self, text: &str) -> SparseVector {
        let mut tf: HashMap<u32, f32> = HashMap::new();
        for token in tokenize(text) {
            if let Some(index) = self.vocabulary.get(&token) {
                *tf.entry(*index).or_insert(0.0) += 1.0;
            }
        }
        if tf.is_empty() {
            return SparseVector::default();
        }

        let mut pairs: Vec<(u32, f32)> = tf
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index as usize]))
            .collect();
        let norm: f32 = pairs.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for (_, w) in &mut pairs {
                *w /= norm;
            }
        }
        SparseVector::from_pairs(pairs)
    }
}

/// Lowercase alphanumeric tokenizer with stopword and length filtering.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// BM25 encoder with an atomically swappable model.
pub struct Bm25Encoder {
    model: RwLock<Option<Bm25Model>>,
    model_path: PathBuf,
}

impl Bm25Encoder {
    /// Create an encoder persisting its model at `model_path`; loads an
    /// existing model file when present. An absent model is a legal startup
    /// condition; `encode` returns empty vectors until a fit happens.
    #[must_use]
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        let model_path = model_path.into();
        let model = match std::fs::read(&model_path) {
            Ok(bytes) => match serde_json::from_slice::<Bm25Model>(&bytes) {
                Ok(model) => {
                    tracing::info!(path = %model_path.display(), docs = model.doc_count, "BM25 model loaded");
                    Some(model)
                }
                Err(e) => {
                    tracing::warn!(path = %model_path.display(), error = %e, "BM25 model file unreadable; starting unfitted");
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            model: RwLock::new(model),
            model_path,
        }
    }

    /// Path of the persisted model file.
    #[must_use]
    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }

    fn persist(&self, model: &Bm25Model) -> Result<()> {
        if let Some(parent) = self.model_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io_with_source("create model directory", e))?;
        }
        let dir = self
            .model_path
            .parent()
            .map(std::path::Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| Error::io_with_source("create temp model file", e))?;
        tmp.write_all(&serde_json::to_vec(model)?)
            .map_err(|e| Error::io_with_source("write model file", e))?;
        tmp.persist(&self.model_path)
            .map_err(|e| Error::io_with_source("replace model file", e.error))?;
        Ok(())
    }
}

impl SparseEncoder for Bm25Encoder {
    fn encode(&self, text: &str) -> SparseVector {
        match self.model.read() {
            Ok(guard) => guard
                .as_ref()
                .map(|m| m.encode(text))
                .unwrap_or_default(),
            Err(_) => SparseVector::default(),
        }
    }

    fn is_ready(&self) -> bool {
        self.model.read().map(|g| g.is_some()).unwrap_or(false)
    }

    fn fit(&self, corpus: &[String]) -> Result<()> {
        let model = Bm25Model::fit(corpus)?;
        self.persist(&model)?;
        let mut guard = self
            .model
            .write()
            .map_err(|_| Error::internal("BM25 model lock poisoned"))?;
        *guard = Some(model);
        tracing::info!(docs = corpus.len(), "BM25 model fitted and swapped");
        Ok(())
    }
}
