//! Shared fixtures for the application test suite.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use vortex_application::ingest::{IngestConfig, IngestService};
use vortex_application::search::{HybridSearchPipeline, PipelineConfig};
use vortex_application::security::VectorAnomalyDetector;
use vortex_domain::entities::{Job, JobCounts, JobStatus, JobType, Role};
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::crypto::ContentCipher;
use vortex_domain::ports::encoders::{DenseEncoder, SparseEncoder, SpladeEncoder};
use vortex_domain::ports::jobs::{JobDispatcher, JobStore};
use vortex_domain::ports::vector_store::VectorStoreProvider;
use vortex_domain::value_objects::{AuthMethod, SparseVector, UserContext};
use vortex_infrastructure::crypto::TenantEncryption;
use vortex_providers::encoders::Bm25Encoder;
use vortex_providers::vector_store::InMemoryVectorStore;

/// Deterministic dense encoder: tokens hash into dimensions, so shared
/// vocabulary yields high cosine similarity.
pub struct TestDenseEncoder {
    dims: usize,
}

impl TestDenseEncoder {
    pub fn new(dims: usize) -> Self {
        Self { dims }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text.to_lowercase().split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let index = (hasher.finish() as usize) % self.dims;
            vector[index] += 1.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl DenseEncoder for TestDenseEncoder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// SPLADE stand-in that is switched off.
pub struct DisabledSplade;

#[async_trait]
impl SpladeEncoder for DisabledSplade {
    async fn encode(&self, _text: &str) -> Result<SparseVector> {
        Ok(SparseVector::default())
    }

    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<SparseVector>> {
        Ok(vec![SparseVector::default(); texts.len()])
    }

    fn enabled(&self) -> bool {
        false
    }
}

/// In-memory job table for engine tests.
#[derive(Default)]
pub struct MemJobStore {
    jobs: Mutex<HashMap<Uuid, Job>>,
}

#[async_trait]
impl JobStore for MemJobStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        let Ok(mut jobs) = self.jobs.lock() else {
            return Err(Error::internal("lock poisoned"));
        };
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        message: Option<&str>,
        progress: Option<f64>,
    ) -> Result<()> {
        let Ok(mut jobs) = self.jobs.lock() else {
            return Err(Error::internal("lock poisoned"));
        };
        let Some(job) = jobs.get_mut(&id) else {
            return Err(Error::not_found(format!("job '{id}'")));
        };
        job.status = status;
        if let Some(message) = message {
            job.message = Some(message.to_owned());
        }
        if let Some(progress) = progress {
            job.progress = progress;
        }
        job.updated_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        let Ok(jobs) = self.jobs.lock() else {
            return Err(Error::internal("lock poisoned"));
        };
        Ok(jobs.get(&id).cloned())
    }

    async fn list(&self, limit: usize) -> Result<(JobCounts, Vec<Job>)> {
        let Ok(jobs) = self.jobs.lock() else {
            return Err(Error::internal("lock poisoned"));
        };
        let mut counts = JobCounts::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Queued => counts.queued += 1,
                JobStatus::Running => counts.running += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        let mut rows: Vec<Job> = jobs.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.total_cmp(&a.created_at));
        rows.truncate(limit);
        Ok((counts, rows))
    }

    async fn is_active(&self, job_type: JobType) -> Result<bool> {
        let Ok(jobs) = self.jobs.lock() else {
            return Err(Error::internal("lock poisoned"));
        };
        Ok(jobs
            .values()
            .any(|j| j.job_type == job_type && !j.status.is_terminal()))
    }

    async fn last_completed_at(&self, job_type: JobType) -> Result<Option<f64>> {
        let Ok(jobs) = self.jobs.lock() else {
            return Err(Error::internal("lock poisoned"));
        };
        Ok(jobs
            .values()
            .filter(|j| j.job_type == job_type && j.status == JobStatus::Completed)
            .map(|j| j.updated_at)
            .fold(None, |acc, t| Some(acc.map_or(t, |a: f64| a.max(t)))))
    }
}

/// Dispatcher that accepts everything without delivering it.
pub struct NullDispatcher;

impl JobDispatcher for NullDispatcher {
    fn dispatch(&self, _job: &Job) -> Result<()> {
        Ok(())
    }
}

/// Dispatcher that always fails.
pub struct FailingDispatcher;

impl JobDispatcher for FailingDispatcher {
    fn dispatch(&self, _job: &Job) -> Result<()> {
        Err(Error::job_dispatch("worker queue closed"))
    }
}

/// A fully wired in-memory stack: store, encoders, cipher, ingest, pipeline.
pub struct TestStack {
    pub store: Arc<InMemoryVectorStore>,
    pub cipher: Arc<dyn ContentCipher>,
    pub ingest: Arc<IngestService>,
    pub pipeline: Arc<HybridSearchPipeline>,
    pub sparse: Arc<dyn SparseEncoder>,
    _dirs: (tempfile::TempDir, tempfile::TempDir),
}

pub fn build_stack(pipeline_config: PipelineConfig) -> TestStack {
    let snapshot_dir = tempfile::tempdir().expect("tempdir");
    let model_dir = tempfile::tempdir().expect("tempdir");

    let store = Arc::new(InMemoryVectorStore::new(snapshot_dir.path()));
    let dense: Arc<dyn DenseEncoder> = Arc::new(TestDenseEncoder::new(64));
    let sparse: Arc<dyn SparseEncoder> =
        Arc::new(Bm25Encoder::new(model_dir.path().join("bm25.json")));
    let splade: Arc<dyn SpladeEncoder> = Arc::new(DisabledSplade);
    let cipher: Arc<dyn ContentCipher> = Arc::new(TenantEncryption::new("test-master-key"));

    let ingest = Arc::new(IngestService::new(
        Arc::clone(&store) as Arc<dyn VectorStoreProvider>,
        Arc::clone(&dense),
        Arc::clone(&sparse),
        Arc::clone(&splade),
        Arc::clone(&cipher),
        VectorAnomalyDetector::default(),
        IngestConfig {
            vector_size: 64,
            ..IngestConfig::default()
        },
    ));

    let pipeline = Arc::new(HybridSearchPipeline::new(
        Arc::clone(&store) as Arc<dyn VectorStoreProvider>,
        dense,
        Arc::clone(&sparse),
        splade,
        None,
        Arc::clone(&cipher),
        pipeline_config,
    ));

    TestStack {
        store,
        cipher,
        ingest,
        pipeline,
        sparse,
        _dirs: (snapshot_dir, model_dir),
    }
}

pub fn user(user_id: &str, role: Role) -> UserContext {
    UserContext {
        user_id: user_id.to_owned(),
        role,
        team: None,
        is_contractor: false,
        emergency_access: false,
        auth: AuthMethod::Bearer,
    }
}
