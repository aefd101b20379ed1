//! Durable job storage and dispatch ports.

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{Job, JobCounts, JobStatus, JobType};
use crate::error::Result;

/// Durable job table.
///
/// All writers share the same busy timeout; a single writer lock is expected
/// from the backing store.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job row
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Update a job's status, optionally its message and progress
    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        message: Option<&str>,
        progress: Option<f64>,
    ) -> Result<()>;

    /// Fetch one job
    async fn get(&self, id: Uuid) -> Result<Option<Job>>;

    /// Recent jobs plus counts by status
    async fn list(&self, limit: usize) -> Result<(JobCounts, Vec<Job>)>;

    /// True when a queued or running job of this type exists
    async fn is_active(&self, job_type: JobType) -> Result<bool>;

    /// Completion time of the most recent completed job of this type
    async fn last_completed_at(&self, job_type: JobType) -> Result<Option<f64>>;
}

/// Hands an accepted job to a worker.
///
/// Dispatch failure marks the row failed; the client sees `queued` then
/// discovers `failed` on poll.
pub trait JobDispatcher: Send + Sync {
    /// Dispatch the job for execution
    fn dispatch(&self, job: &Job) -> Result<()>;
}
