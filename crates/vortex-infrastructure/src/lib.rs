//! # Infrastructure Layer
//!
//! Everything that touches the host environment: configuration loading,
//! logging initialization, the tiered audit log, per-tenant encryption, JWT
//! issuance and validation, the SQLite-backed user and job stores, and
//! Prometheus metrics.

/// Tiered append-only audit log with hash chaining
pub mod audit;
/// JWT token service
pub mod auth;
/// Layered configuration
pub mod config;
/// Per-tenant AES-GCM content encryption
pub mod crypto;
/// SQLite-backed stores (users, jobs)
pub mod db;
/// Structured logging initialization
pub mod logging;
/// Prometheus metrics registry
pub mod metrics;
