//! Ingestion service: chunk → encode → upsert with progress reporting.
//!
//! Identity is derived before chunking, so re-running on identical input
//! writes the same point IDs with identical payloads; a no-op at the store.
//! Private-tenant content is encrypted before it leaves the process; an
//! encryption failure aborts the write, never falling back to plaintext.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use vortex_domain::chunking::RecursiveChunker;
use vortex_domain::constants::ingest::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_FOLDER_BATCH_SIZE, DEFAULT_VECTOR_SIZE,
    INTERNAL_BATCH_SIZE, PROGRESS_CAP,
};
use vortex_domain::constants::tenancy::{DEFAULT_ACCESS_LEVEL, PUBLIC_TENANT};
use vortex_domain::entities::NormalizedDocument;
use vortex_domain::error::{Error, Result};
use vortex_domain::identity::{doc_hash, point_id};
use vortex_domain::payload::PayloadNormalizer;
use vortex_domain::ports::crypto::ContentCipher;
use vortex_domain::ports::encoders::{DenseEncoder, SparseEncoder, SpladeEncoder};
use vortex_domain::ports::vector_store::{CollectionSpec, VectorStoreProvider};
use vortex_domain::value_objects::{NamedVectors, Payload, PointRecord, SparseVector};

use crate::security::VectorAnomalyDetector;

/// Progress updates (0..=100) emitted while a batch runs.
pub type ProgressSender = tokio::sync::mpsc::UnboundedSender<f64>;

/// Ingestion tuning knobs.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Character budget per chunk
    pub chunk_size: usize,
    /// Overlap carried between chunks
    pub chunk_overlap: usize,
    /// Upsert sub-batch size
    pub internal_batch_size: usize,
    /// Dense size used when auto-creating collections
    pub vector_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            internal_batch_size: INTERNAL_BATCH_SIZE,
            vector_size: DEFAULT_VECTOR_SIZE,
        }
    }
}

/// The ingestion service.
pub struct IngestService {
    store: Arc<dyn VectorStoreProvider>,
    dense: Arc<dyn DenseEncoder>,
    sparse: Arc<dyn SparseEncoder>,
    splade: Arc<dyn SpladeEncoder>,
    cipher: Arc<dyn ContentCipher>,
    anomaly: VectorAnomalyDetector,
    normalizer: PayloadNormalizer,
    chunker: RecursiveChunker,
    config: IngestConfig,
}

struct PreparedChunk {
    payload: Payload,
    text: String,
    db_id: String,
    chunk_index: usize,
}

impl IngestService {
    /// Assemble the service from its collaborators.
    pub fn new(
        store: Arc<dyn VectorStoreProvider>,
        dense: Arc<dyn DenseEncoder>,
        sparse: Arc<dyn SparseEncoder>,
        splade: Arc<dyn SpladeEncoder>,
        cipher: Arc<dyn ContentCipher>,
        anomaly: VectorAnomalyDetector,
        config: IngestConfig,
    ) -> Self {
        let chunker = RecursiveChunker::new(config.chunk_size, config.chunk_overlap);
        Self {
            store,
            dense,
            sparse,
            splade,
            cipher,
            anomaly,
            normalizer: PayloadNormalizer::new(),
            chunker,
            config,
        }
    }

    /// Upsert a batch of raw documents into `collection`.
    ///
    /// Returns the number of documents written. Progress is reported through
    /// `progress` and capped at 99; the caller marks completion.
    ///
    /// # Errors
    /// Fails on encryption errors, dense encoder failures, and store errors.
    pub async fn upsert_documents(
        &self,
        collection: &str,
        docs: &[Value],
        progress: Option<&ProgressSender>,
    ) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        self.ensure_collection(collection).await?;

        let total = docs.len();
        let mut upserted = 0usize;

        for (batch_start, batch) in docs
            .chunks(self.config.internal_batch_size)
            .enumerate()
            .map(|(i, b)| (i * self.config.internal_batch_size, b))
        {
            let prepared = self.prepare_batch(batch)?;
            if !prepared.is_empty() {
                let points = self.encode_batch(&prepared).await?;
                self.store.upsert(collection, points).await?;
            }
            upserted += batch.len();

            if let Some(sender) = progress {
                let pct = ((batch_start + batch.len()) as f64 / total as f64) * 100.0;
                let _ = sender.send(pct.min(PROGRESS_CAP));
            }
        }

        tracing::info!(collection, upserted, "batch upsert finished");
        Ok(upserted)
    }

    /// Walk `folder` recursively, ingesting every `.json` / `.jsonl` file in
    /// batches of `batch_size` documents.
    ///
    /// # Errors
    /// Fails when the folder is unreadable; individual file parse errors are
    /// logged and skipped.
    pub async fn upsert_folder(
        &self,
        folder: &Path,
        collection: &str,
        batch_size: usize,
        progress: Option<&ProgressSender>,
    ) -> Result<usize> {
        if !folder.exists() {
            return Err(Error::not_found(format!(
                "folder '{}'",
                folder.display()
            )));
        }
        let batch_size = if batch_size == 0 {
            DEFAULT_FOLDER_BATCH_SIZE
        } else {
            batch_size
        };

        let files: Vec<_> = walkdir::WalkDir::new(folder)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                matches!(
                    e.path().extension().and_then(|x| x.to_str()),
                    Some("json" | "jsonl")
                )
            })
            .collect();

        if files.is_empty() {
            tracing::warn!(folder = %folder.display(), "no JSON/JSONL files found");
            return Ok(0);
        }

        let total_files = files.len();
        let mut pending: Vec<Value> = Vec::new();
        let mut written = 0usize;

        for (index, file) in files.iter().enumerate() {
            match read_documents(file.path()) {
                Ok(mut docs) => pending.append(&mut docs),
                Err(e) => {
                    tracing::error!(file = %file.path().display(), error = %e, "file read failed");
                    continue;
                }
            }

            while pending.len() >= batch_size {
                let batch: Vec<Value> = pending.drain(..batch_size).collect();
                written += self.upsert_documents(collection, &batch, None).await?;
                if let Some(sender) = progress {
                    let pct = ((index + 1) as f64 / total_files as f64) * 100.0;
                    let _ = sender.send(pct.min(PROGRESS_CAP));
                }
            }
        }

        if !pending.is_empty() {
            written += self.upsert_documents(collection, &pending, None).await?;
        }

        tracing::info!(collection, written, "folder upsert finished");
        Ok(written)
    }

    /// Merge or replace the payload of every chunk of a document.
    ///
    /// # Errors
    /// Returns `DOCUMENT_NOT_FOUND` when no chunk carries the `db_id`.
    pub async fn update_payload(
        &self,
        collection: &str,
        db_id: &str,
        new_payload: &Payload,
        merge: bool,
    ) -> Result<usize> {
        let filter =
            vortex_domain::value_objects::Filter::new().must_match("db_id", db_id.to_owned());
        let (chunks, _) = self.store.scroll(collection, Some(&filter), 1000, None).await?;
        if chunks.is_empty() {
            return Err(Error::not_found(format!("document '{db_id}'")));
        }

        let count = chunks.len();
        for chunk in chunks {
            let merged = if merge {
                let mut merged = chunk.payload.clone();
                for (k, v) in new_payload {
                    merged.insert(k.clone(), v.clone());
                }
                merged
            } else {
                new_payload.clone()
            };
            let id = chunk
                .id
                .parse()
                .map_err(|_| Error::internal(format!("malformed point id '{}'", chunk.id)))?;
            self.store.set_payload(collection, &[id], &merged).await?;
        }
        Ok(count)
    }

    /// Delete a document and all of its chunks by `db_id`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn delete_document(&self, collection: &str, db_id: &str) -> Result<u64> {
        let filter =
            vortex_domain::value_objects::Filter::new().must_match("db_id", db_id.to_owned());
        self.store.delete_by_filter(collection, &filter).await
    }

    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        if self.store.collection_exists(collection).await? {
            return Ok(());
        }
        let spec = CollectionSpec::hybrid(self.config.vector_size);
        self.store.create_collection(collection, &spec).await?;
        tracing::info!(collection, dense_size = spec.dense_size, "collection auto-created");
        Ok(())
    }

    /// Normalize a raw client document and derive its identity.
    fn normalize(&self, doc: &Value) -> Option<NormalizedDocument> {
        let Value::Object(raw) = doc else {
            tracing::warn!("skipping non-object document");
            return None;
        };

        let payload = self.normalizer.process(raw);
        let text = payload
            .get("_text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        if text.trim().is_empty() {
            tracing::warn!("skipping document without extractable text");
            return None;
        }

        Some(NormalizedDocument {
            db_id: doc_hash(doc),
            original_id: raw.get("id").and_then(Value::as_str).map(str::to_owned),
            tenant_id: raw
                .get("tenant_id")
                .and_then(Value::as_str)
                .unwrap_or(PUBLIC_TENANT)
                .to_owned(),
            access_level: raw
                .get("access_level")
                .and_then(Value::as_i64)
                .unwrap_or(DEFAULT_ACCESS_LEVEL),
            text,
            payload,
        })
    }

    /// Normalize, derive identity, chunk, and encrypt one sub-batch.
    fn prepare_batch(&self, docs: &[Value]) -> Result<Vec<PreparedChunk>> {
        let mut prepared = Vec::new();

        for raw in docs {
            let Some(doc) = self.normalize(raw) else {
                continue;
            };
            let should_encrypt = doc.tenant_id != PUBLIC_TENANT
                || raw
                    .get("encrypt_content")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);

            let chunks = self.chunker.split_text(&doc.text);
            let total_chunks = chunks.len();

            for (chunk_index, chunk_text) in chunks.into_iter().enumerate() {
                // Never store plaintext when encryption was intended.
                let (stored_content, encrypted) = if should_encrypt {
                    (self.cipher.encrypt(&doc.tenant_id, &chunk_text)?, true)
                } else {
                    (chunk_text.clone(), false)
                };

                let mut payload = doc.payload.clone();
                payload.insert("content".to_owned(), Value::String(stored_content));
                payload.insert("is_chunk".to_owned(), Value::Bool(true));
                payload.insert("chunk_index".to_owned(), Value::from(chunk_index));
                payload.insert("total_chunks".to_owned(), Value::from(total_chunks));
                payload.insert("db_id".to_owned(), Value::String(doc.db_id.clone()));
                payload.insert("parent_id".to_owned(), Value::String(doc.db_id.clone()));
                if let Some(id) = &doc.original_id {
                    payload.insert("id".to_owned(), Value::String(id.clone()));
                }
                payload.insert("tenant_id".to_owned(), Value::String(doc.tenant_id.clone()));
                payload.insert("access_level".to_owned(), Value::from(doc.access_level));
                payload.insert("content_encrypted".to_owned(), Value::Bool(encrypted));

                prepared.push(PreparedChunk {
                    payload,
                    text: chunk_text,
                    db_id: doc.db_id.clone(),
                    chunk_index,
                });
            }
        }

        Ok(prepared)
    }

    /// Encode all three vector kinds for a prepared sub-batch.
    async fn encode_batch(&self, prepared: &[PreparedChunk]) -> Result<Vec<PointRecord>> {
        let texts: Vec<String> = prepared.iter().map(|c| c.text.clone()).collect();

        let dense_vectors = self.dense.encode_batch(&texts).await?;
        if dense_vectors.len() != prepared.len() {
            return Err(Error::encoder("dense batch size mismatch"));
        }

        // SPLADE failure degrades to dense + BM25 only.
        let splade_vectors = if self.splade.enabled() {
            match self.splade.encode_batch(&texts).await {
                Ok(vectors) => vectors,
                Err(e) => {
                    tracing::warn!(error = %e, "SPLADE encoding failed; storing dense+BM25 only");
                    vec![SparseVector::default(); prepared.len()]
                }
            }
        } else {
            vec![SparseVector::default(); prepared.len()]
        };

        let mut points = Vec::with_capacity(prepared.len());
        for ((chunk, dense), splade) in prepared.iter().zip(dense_vectors).zip(splade_vectors) {
            if let Some(reason) = self.anomaly.is_anomalous(&dense) {
                tracing::warn!(db_id = %chunk.db_id, reason, "anomalous vector rejected at ingest");
                continue;
            }

            points.push(PointRecord {
                id: point_id(&chunk.db_id, chunk.chunk_index),
                vectors: NamedVectors {
                    dense,
                    sparse: self.sparse.encode(&chunk.text),
                    splade,
                },
                payload: chunk.payload.clone(),
            });
        }
        Ok(points)
    }
}

fn read_documents(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::io_with_source(format!("read '{}'", path.display()), e))?;

    if path.extension().and_then(|x| x.to_str()) == Some("jsonl") {
        let mut docs = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            docs.push(serde_json::from_str(line)?);
        }
        return Ok(docs);
    }

    let parsed: Value = serde_json::from_str(&content)?;
    Ok(match parsed {
        Value::Array(items) => items,
        single => vec![single],
    })
}
