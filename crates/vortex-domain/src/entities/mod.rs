//! Core business entities with identity.

/// Append-only audit entries with hash chaining
pub mod audit;
/// Logical documents and their chunk points
pub mod document;
/// Background jobs
pub mod job;
/// User accounts and roles
pub mod user;

pub use audit::{AuditEntry, ChainedEntry, chain_hash, is_critical_event};
pub use document::NormalizedDocument;
pub use job::{Job, JobCounts, JobStatus, JobType};
pub use user::{Role, User};
