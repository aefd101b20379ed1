//! Background jobs tracked in the durable job table.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// The kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Walk a folder of JSON/JSONL files and upsert its documents
    #[display("batch_upsert")]
    BatchUpsert,
    /// Upsert an inline batch of documents
    #[display("upsert_batch_docs")]
    UpsertBatchDocs,
    /// Create a collection with the given dense size
    #[display("create_collection")]
    CreateCollection,
    /// Refit the BM25 model from a corpus tree; at most one active at a time
    #[display("bm25_retrain")]
    Bm25Retrain,
    /// Create a backend snapshot of a collection
    #[display("create_snapshot")]
    CreateSnapshot,
}

impl JobType {
    /// String form stored in the `type` column
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BatchUpsert => "batch_upsert",
            Self::UpsertBatchDocs => "upsert_batch_docs",
            Self::CreateCollection => "create_collection",
            Self::Bm25Retrain => "bm25_retrain",
            Self::CreateSnapshot => "create_snapshot",
        }
    }

    /// Only one queued/running job of these types may exist at a time
    #[must_use]
    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Bm25Retrain)
    }
}

impl std::str::FromStr for JobType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch_upsert" => Ok(Self::BatchUpsert),
            "upsert_batch_docs" => Ok(Self::UpsertBatchDocs),
            "create_collection" => Ok(Self::CreateCollection),
            "bm25_retrain" => Ok(Self::Bm25Retrain),
            "create_snapshot" => Ok(Self::CreateSnapshot),
            other => Err(Error::invalid_request(format!("Unknown job type: {other}"))),
        }
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for a worker
    #[display("queued")]
    Queued,
    /// Currently executing
    #[display("running")]
    Running,
    /// Finished successfully
    #[display("completed")]
    Completed,
    /// Terminated with an error
    #[display("failed")]
    Failed,
}

impl JobStatus {
    /// String form stored in the `status` column
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` once the job can no longer change state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(Error::invalid_request(format!(
                "Unknown job status: {other}"
            ))),
        }
    }
}

/// A durable job row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Job ID
    pub id: Uuid,
    /// What the job does
    pub job_type: JobType,
    /// Opaque job parameters
    pub payload: serde_json::Value,
    /// Current lifecycle status
    pub status: JobStatus,
    /// Last status message
    pub message: Option<String>,
    /// Progress 0..=100; monotonic within a single run
    pub progress: f64,
    /// Creation time (epoch seconds)
    pub created_at: f64,
    /// Last update time (epoch seconds)
    pub updated_at: f64,
}

impl Job {
    /// Create a queued job with the given parameters
    #[must_use]
    pub fn new(job_type: JobType, payload: serde_json::Value, now: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type,
            payload,
            status: JobStatus::Queued,
            message: Some("Waiting for worker".to_owned()),
            progress: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Summary counts of jobs grouped by status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobCounts {
    /// Jobs waiting to start
    pub queued: u64,
    /// Actively running jobs
    pub running: u64,
    /// Successfully completed jobs
    pub completed: u64,
    /// Failed jobs
    pub failed: u64,
}
