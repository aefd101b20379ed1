//! # Provider Layer
//!
//! Concrete implementations of the domain's provider ports.
//!
//! | Module | Implements | Backed by |
//! |--------|------------|-----------|
//! | [`vector_store`] | `VectorStoreProvider` | Qdrant REST API, in-memory store |
//! | [`encoders`] | `DenseEncoder`, `SparseEncoder`, `SpladeEncoder`, `CrossEncoder` | Remote inference endpoints, in-process BM25 |
//! | [`limits`] | `RateLimiter`, `QuotaCounter` | Redis, in-memory fallback |

/// Encoder set implementations
pub mod encoders;
/// Rate limiting and quota implementations
pub mod limits;
/// Vector store implementations
pub mod vector_store;
