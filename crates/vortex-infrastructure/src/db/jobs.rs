//! SQLite job store.

use std::path::Path;

use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use vortex_domain::entities::{Job, JobCounts, JobStatus, JobType};
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::jobs::JobStore;

const DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS jobs (
        id TEXT PRIMARY KEY,
        type TEXT NOT NULL,
        payload TEXT NOT NULL,
        status TEXT NOT NULL,
        message TEXT,
        progress REAL DEFAULT 0.0,
        created_at REAL,
        updated_at REAL
    )",
    "CREATE INDEX IF NOT EXISTS idx_status_created ON jobs (status, created_at)",
];

/// Durable job table in SQLite.
pub struct SqliteJobStore {
    pool: sqlx::SqlitePool,
}

impl SqliteJobStore {
    /// Open (and migrate) the job database at `path`.
    ///
    /// # Errors
    /// Returns an error when the file cannot be opened or the DDL fails.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = super::connect(path).await?;
        for sql in DDL {
            sqlx::query(sql)
                .execute(&pool)
                .await
                .map_err(|e| Error::database_with_source("apply jobs DDL", e))?;
        }
        Ok(Self { pool })
    }

    fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job> {
        let id: String = row
            .try_get("id")
            .map_err(|e| Error::database_with_source("read job id", e))?;
        let job_type: String = row
            .try_get("type")
            .map_err(|e| Error::database_with_source("read job type", e))?;
        let payload: String = row
            .try_get("payload")
            .map_err(|e| Error::database_with_source("read job payload", e))?;
        let status: String = row
            .try_get("status")
            .map_err(|e| Error::database_with_source("read job status", e))?;

        Ok(Job {
            id: id
                .parse()
                .map_err(|_| Error::database(format!("malformed job id '{id}'")))?,
            job_type: job_type.parse()?,
            payload: serde_json::from_str(&payload)?,
            status: status.parse()?,
            message: row.try_get("message").ok(),
            progress: row.try_get("progress").unwrap_or(0.0),
            created_at: row.try_get("created_at").unwrap_or(0.0),
            updated_at: row.try_get("updated_at").unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn insert(&self, job: &Job) -> Result<()> {
        sqlx::query(
            "INSERT INTO jobs (id, type, payload, status, message, progress, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(job.id.to_string())
        .bind(job.job_type.as_str())
        .bind(serde_json::to_string(&job.payload)?)
        .bind(job.status.as_str())
        .bind(job.message.as_deref())
        .bind(job.progress)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("insert job", e))?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: JobStatus,
        message: Option<&str>,
        progress: Option<f64>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        sqlx::query(
            "UPDATE jobs
             SET status = ?, message = COALESCE(?, message),
                 progress = COALESCE(?, progress), updated_at = ?
             WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(message)
        .bind(progress)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("update job status", e))?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("fetch job", e))?;
        row.as_ref().map(Self::row_to_job).transpose()
    }

    async fn list(&self, limit: usize) -> Result<(JobCounts, Vec<Job>)> {
        let mut counts = JobCounts::default();
        let count_rows = sqlx::query("SELECT status, COUNT(*) AS n FROM jobs GROUP BY status")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("count jobs", e))?;
        for row in count_rows {
            let status: String = row.try_get("status").unwrap_or_default();
            let n: i64 = row.try_get("n").unwrap_or(0);
            match status.as_str() {
                "queued" => counts.queued = n as u64,
                "running" => counts.running = n as u64,
                "completed" => counts.completed = n as u64,
                "failed" => counts.failed = n as u64,
                _ => {}
            }
        }

        let rows = sqlx::query("SELECT * FROM jobs ORDER BY created_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database_with_source("list jobs", e))?;
        let jobs = rows
            .iter()
            .map(Self::row_to_job)
            .collect::<Result<Vec<_>>>()?;
        Ok((counts, jobs))
    }

    async fn is_active(&self, job_type: JobType) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM jobs WHERE type = ? AND status IN ('queued', 'running') LIMIT 1",
        )
        .bind(job_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("check active jobs", e))?;
        Ok(row.is_some())
    }

    async fn last_completed_at(&self, job_type: JobType) -> Result<Option<f64>> {
        let row = sqlx::query(
            "SELECT updated_at FROM jobs
             WHERE type = ? AND status = 'completed'
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(job_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::database_with_source("query last completion", e))?;
        Ok(row.and_then(|r| r.try_get("updated_at").ok()))
    }
}
