//! Job engine: durable enqueue with type dedup, cooldowns, and dispatch.
//!
//! The engine owns the row lifecycle up to dispatch. Workers coordinate with
//! the gateway exclusively through the job table; the dispatcher is a bounded
//! in-process channel standing in for the external worker hand-off. A
//! dispatch failure marks the row failed so a polling client discovers it.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use uuid::Uuid;

use vortex_domain::entities::{Job, JobCounts, JobStatus, JobType};
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::jobs::{JobDispatcher, JobStore};

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Dispatcher backed by a bounded channel to the in-process worker task.
pub struct ChannelDispatcher {
    tx: mpsc::Sender<Job>,
}

impl ChannelDispatcher {
    /// Create a dispatcher plus the receiving end for a [`super::JobWorker`].
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Job>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl JobDispatcher for ChannelDispatcher {
    fn dispatch(&self, job: &Job) -> Result<()> {
        self.tx
            .try_send(job.clone())
            .map_err(|e| Error::job_dispatch(format!("worker queue unavailable: {e}")))
    }
}

/// The job engine.
pub struct JobEngine {
    store: Arc<dyn JobStore>,
    dispatcher: Arc<dyn JobDispatcher>,
    /// Cooldown between completed BM25 retrains, in minutes
    bm25_cooldown_min: i64,
}

impl JobEngine {
    /// Assemble the engine.
    pub fn new(
        store: Arc<dyn JobStore>,
        dispatcher: Arc<dyn JobDispatcher>,
        bm25_cooldown_min: i64,
    ) -> Self {
        Self {
            store,
            dispatcher,
            bm25_cooldown_min,
        }
    }

    /// Enqueue a job: uniqueness and cooldown checks, durable insert, then
    /// dispatch. Returns the queued job row.
    ///
    /// # Errors
    /// `JOB_SKIPPED` when an exclusive job type is already active or inside
    /// its cooldown; `JOB_DISPATCH_FAILURE` when the row was written but the
    /// worker hand-off failed (the row is marked failed).
    pub async fn enqueue(&self, job_type: JobType, payload: serde_json::Value) -> Result<Job> {
        if job_type.is_exclusive() {
            if self.store.is_active(job_type).await? {
                tracing::warn!(%job_type, "job already queued or running");
                return Err(Error::job_skipped(format!(
                    "{job_type} already queued or running"
                )));
            }
            if let Some(cooldown_err) = self.check_cooldown(job_type).await? {
                return Err(cooldown_err);
            }
        }

        let job = Job::new(job_type, payload, now_secs());
        self.store.insert(&job).await?;

        if let Err(dispatch_err) = self.dispatcher.dispatch(&job) {
            tracing::error!(job_id = %job.id, error = %dispatch_err, "job dispatch failed");
            self.store
                .update_status(
                    job.id,
                    JobStatus::Failed,
                    Some(&format!("Dispatch error: {dispatch_err}")),
                    None,
                )
                .await?;
            return Err(dispatch_err);
        }

        tracing::info!(job_id = %job.id, %job_type, "job dispatched");
        Ok(job)
    }

    async fn check_cooldown(&self, job_type: JobType) -> Result<Option<Error>> {
        if self.bm25_cooldown_min <= 0 || job_type != JobType::Bm25Retrain {
            return Ok(None);
        }
        let Some(last) = self.store.last_completed_at(job_type).await? else {
            return Ok(None);
        };
        let elapsed_min = (now_secs() - last) / 60.0;
        if elapsed_min < self.bm25_cooldown_min as f64 {
            return Ok(Some(Error::job_skipped(format!(
                "{job_type} completed {elapsed_min:.0} minutes ago; cooldown is {} minutes",
                self.bm25_cooldown_min
            ))));
        }
        Ok(None)
    }

    /// Fetch one job row.
    ///
    /// # Errors
    /// `DOCUMENT_NOT_FOUND` when no such job exists.
    pub async fn get_status(&self, id: Uuid) -> Result<Job> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("job '{id}'")))
    }

    /// Recent jobs plus counts by status.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn list(&self, limit: usize) -> Result<(JobCounts, Vec<Job>)> {
        self.store.list(limit).await
    }
}
