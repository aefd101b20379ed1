//! # Application Layer
//!
//! Use-case services orchestrating the domain ports: the hybrid search
//! pipeline, ingestion, the job engine and its worker, access control,
//! request defenses, and user management. Everything here depends only on
//! `vortex-domain` traits; concrete providers are injected at composition
//! time.

/// Ingestion pipeline
pub mod ingest;
/// Job engine, dispatcher, and worker
pub mod jobs;
/// Hybrid search pipeline
pub mod search;
/// Access control and request defenses
pub mod security;
/// User management
pub mod users;
