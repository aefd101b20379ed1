//! Ingestion constants.

/// Default character budget per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap carried between adjacent chunks
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Internal upsert sub-batch size
pub const INTERNAL_BATCH_SIZE: usize = 100;
/// Default batch size when walking a folder of JSON files
pub const DEFAULT_FOLDER_BATCH_SIZE: usize = 50;

/// Progress reported by the ingest loop is capped here; the job caller
/// marks 100 on completion.
pub const PROGRESS_CAP: f64 = 99.0;

/// Dense encoder batch size used during bulk ingestion
pub const DENSE_ENCODE_BATCH_SIZE: usize = 4;

/// Default dense vector dimensionality for auto-created collections
pub const DEFAULT_VECTOR_SIZE: usize = 1024;
