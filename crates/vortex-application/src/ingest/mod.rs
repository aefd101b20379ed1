//! Ingestion pipeline.

mod service;

pub use service::{IngestConfig, IngestService, ProgressSender};
