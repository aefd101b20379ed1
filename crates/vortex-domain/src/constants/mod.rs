//! Domain-level constants organized by area.

/// Audit log constants
pub mod audit;
/// Authentication constants
pub mod auth;
/// Ingestion constants
pub mod ingest;
/// Job engine constants
pub mod jobs;
/// Rate limit and quota constants
pub mod limits;
/// Search pipeline constants
pub mod search;
/// Multi-tenancy constants
pub mod tenancy;
