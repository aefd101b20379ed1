//! SQLite-backed stores.
//!
//! Two separate database files: the job table and the security (user) table.
//! Both enable WAL mode and share a busy timeout so concurrent writers queue
//! instead of failing.

mod jobs;
mod users;

pub use jobs::SqliteJobStore;
pub use users::SqliteUserStore;

use std::path::Path;

use vortex_domain::constants::jobs::JOB_DB_BUSY_TIMEOUT_SECS;
use vortex_domain::error::{Error, Result};

/// Connect to a SQLite file, creating parent directories, enabling WAL mode
/// and the shared busy timeout.
pub(crate) async fn connect(path: &Path) -> Result<sqlx::SqlitePool> {
    tracing::info!(path = %path.display(), "connecting to SQLite database");

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::database_with_source("create db directory", e))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());
    let pool = sqlx::SqlitePool::connect(&db_url)
        .await
        .map_err(|e| Error::database_with_source("connect SQLite", e))?;

    sqlx::query("PRAGMA journal_mode = WAL;")
        .execute(&pool)
        .await
        .map_err(|e| Error::database_with_source("enable WAL mode", e))?;
    sqlx::query(&format!(
        "PRAGMA busy_timeout = {};",
        JOB_DB_BUSY_TIMEOUT_SECS * 1000
    ))
    .execute(&pool)
    .await
    .map_err(|e| Error::database_with_source("set busy timeout", e))?;

    Ok(pool)
}
