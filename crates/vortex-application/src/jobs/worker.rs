//! Job worker: receives dispatched jobs, executes them, reports progress.
//!
//! The worker moves a job to `running`, calls into the owning service, and
//! marks terminal status on the row. Transient upstream failures retry with
//! exponential backoff up to three attempts. Progress updates flow through a
//! channel so the synchronous ingest callbacks never block on the job table;
//! only increases are persisted, keeping progress monotonic per run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use vortex_domain::constants::ingest::DEFAULT_VECTOR_SIZE;
use vortex_domain::entities::{Job, JobStatus, JobType};
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::encoders::SparseEncoder;
use vortex_domain::ports::jobs::JobStore;
use vortex_domain::ports::vector_store::{CollectionSpec, VectorStoreProvider};

use crate::ingest::IngestService;
use vortex_domain::constants::jobs::{JOB_RETRY_BASE_DELAY_SECS, MAX_JOB_ATTEMPTS};

/// The in-process job worker.
pub struct JobWorker {
    store: Arc<dyn JobStore>,
    vector_store: Arc<dyn VectorStoreProvider>,
    ingest: Arc<IngestService>,
    sparse: Arc<dyn SparseEncoder>,
}

impl JobWorker {
    /// Assemble a worker.
    pub fn new(
        store: Arc<dyn JobStore>,
        vector_store: Arc<dyn VectorStoreProvider>,
        ingest: Arc<IngestService>,
        sparse: Arc<dyn SparseEncoder>,
    ) -> Self {
        Self {
            store,
            vector_store,
            ingest,
            sparse,
        }
    }

    /// Drain the dispatch channel until it closes. In-flight jobs complete
    /// before the loop exits.
    pub async fn run(self, mut rx: mpsc::Receiver<Job>) {
        tracing::info!("job worker started");
        while let Some(job) = rx.recv().await {
            self.process(job).await;
        }
        tracing::info!("job worker stopped");
    }

    async fn process(&self, job: Job) {
        tracing::info!(job_id = %job.id, job_type = %job.job_type, "processing job");
        self.update(&job, JobStatus::Running, Some("Processing..."), Some(0.0))
            .await;

        let mut attempt = 1u32;
        let outcome = loop {
            match self.execute(&job).await {
                Ok(message) => break Ok(message),
                Err(e @ Error::Upstream { .. }) if attempt < MAX_JOB_ATTEMPTS => {
                    let delay = JOB_RETRY_BASE_DELAY_SECS * 2u64.pow(attempt - 1);
                    tracing::warn!(job_id = %job.id, attempt, error = %e, "transient failure, retrying in {delay}s");
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    attempt += 1;
                }
                Err(e) => break Err(e),
            }
        };

        match outcome {
            Ok(message) => {
                self.update(&job, JobStatus::Completed, Some(&message), Some(100.0))
                    .await;
                tracing::info!(job_id = %job.id, "job completed");
            }
            Err(e) => {
                // Stack traces stay in the logs; the row gets a safe message.
                self.update(&job, JobStatus::Failed, Some(&format!("Error: {e}")), None)
                    .await;
                tracing::error!(job_id = %job.id, error = %e, "job failed");
            }
        }
    }

    async fn execute(&self, job: &Job) -> Result<String> {
        match job.job_type {
            JobType::BatchUpsert => self.run_batch_upsert(job).await,
            JobType::UpsertBatchDocs => self.run_upsert_batch_docs(job).await,
            JobType::CreateCollection => self.run_create_collection(job).await,
            JobType::Bm25Retrain => self.run_bm25_retrain(job).await,
            JobType::CreateSnapshot => self.run_create_snapshot(job).await,
        }
    }

    async fn run_batch_upsert(&self, job: &Job) -> Result<String> {
        let folder = require_str(&job.payload, "folder")?;
        let collection = require_str(&job.payload, "collection")?;
        let batch_size = job
            .payload
            .get("batch_size")
            .and_then(Value::as_u64)
            .unwrap_or(50) as usize;

        let (tx, rx) = mpsc::unbounded_channel();
        let forwarder = self.spawn_progress_forwarder(job.id, rx);
        let written = self
            .ingest
            .upsert_folder(&PathBuf::from(folder), collection, batch_size, Some(&tx))
            .await;
        drop(tx);
        let _ = forwarder.await;

        let written = written?;
        Ok(format!("Upserted {written} documents from folder"))
    }

    async fn run_upsert_batch_docs(&self, job: &Job) -> Result<String> {
        let collection = require_str(&job.payload, "collection")?;
        let documents: Vec<Value> = job
            .payload
            .get("documents")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let (tx, rx) = mpsc::unbounded_channel();
        let forwarder = self.spawn_progress_forwarder(job.id, rx);
        let written = self
            .ingest
            .upsert_documents(collection, &documents, Some(&tx))
            .await;
        drop(tx);
        let _ = forwarder.await;

        let written = written?;
        Ok(format!("Successfully upserted {written} docs"))
    }

    async fn run_create_collection(&self, job: &Job) -> Result<String> {
        let name = require_str(&job.payload, "name")?;
        let vector_size = job
            .payload
            .get("vector_size")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_VECTOR_SIZE as u64) as usize;
        self.vector_store
            .create_collection(name, &CollectionSpec::hybrid(vector_size))
            .await?;
        Ok(format!("Collection '{name}' created"))
    }

    async fn run_bm25_retrain(&self, job: &Job) -> Result<String> {
        let base_path = job
            .payload
            .get("base_path")
            .and_then(Value::as_str)
            .unwrap_or("./data")
            .to_owned();

        // Corpus collection and fitting are CPU/file bound; keep them off
        // the async scheduler.
        let sparse = Arc::clone(&self.sparse);
        let trained = tokio::task::spawn_blocking(move || -> Result<usize> {
            let corpus = collect_corpus(&PathBuf::from(base_path))?;
            let count = corpus.len();
            sparse.fit(&corpus)?;
            Ok(count)
        })
        .await
        .map_err(|e| Error::internal(format!("BM25 retrain task panicked: {e}")))??;

        Ok(format!("BM25 trained on {trained} docs"))
    }

    async fn run_create_snapshot(&self, job: &Job) -> Result<String> {
        let collection = require_str(&job.payload, "collection")?;
        let info = self.vector_store.create_snapshot(collection).await?;
        Ok(format!("Snapshot created: {}", info.name))
    }

    fn spawn_progress_forwarder(
        &self,
        job_id: uuid::Uuid,
        mut rx: mpsc::UnboundedReceiver<f64>,
    ) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let mut last = 0.0f64;
            while let Some(progress) = rx.recv().await {
                if progress > last {
                    last = progress;
                    let _ = store
                        .update_status(job_id, JobStatus::Running, None, Some(progress))
                        .await;
                }
            }
        })
    }

    async fn update(
        &self,
        job: &Job,
        status: JobStatus,
        message: Option<&str>,
        progress: Option<f64>,
    ) {
        if let Err(e) = self
            .store
            .update_status(job.id, status, message, progress)
            .await
        {
            tracing::error!(job_id = %job.id, error = %e, "job status update failed");
        }
    }
}

fn require_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_request(format!("job payload missing '{key}'")))
}

/// Gather text from every JSON file under a tree for BM25 fitting.
/// Also used by the server's cold-start fit when no model file exists yet.
pub fn collect_corpus(base_path: &std::path::Path) -> Result<Vec<String>> {
    let mut corpus = Vec::new();
    for entry in walkdir::WalkDir::new(base_path)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        if entry.path().extension().and_then(|x| x.to_str()) != Some("json") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            continue;
        };
        let Ok(parsed) = serde_json::from_str::<Value>(&content) else {
            continue;
        };
        let docs = match parsed {
            Value::Array(items) => items,
            single => vec![single],
        };
        for doc in docs {
            if let Some(text) = doc
                .get("content")
                .or_else(|| doc.get("contents"))
                .and_then(Value::as_str)
                && !text.trim().is_empty()
            {
                corpus.push(text.to_owned());
            }
        }
    }

    if corpus.is_empty() {
        return Err(Error::invalid_request("no data for BM25 fitting"));
    }
    Ok(corpus)
}
