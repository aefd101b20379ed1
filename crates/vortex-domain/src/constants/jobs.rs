//! Job engine constants.

/// SQLite busy timeout for all job table writers, in seconds
pub const JOB_DB_BUSY_TIMEOUT_SECS: u64 = 30;

/// Default cooldown between completed BM25 retrains, in minutes
pub const DEFAULT_BM25_COOLDOWN_MIN: i64 = 30;

/// Maximum worker attempts for a job that fails transiently
pub const MAX_JOB_ATTEMPTS: u32 = 3;
/// Base delay for the worker's exponential backoff, in seconds
pub const JOB_RETRY_BASE_DELAY_SECS: u64 = 2;
