//! External Provider Ports
//!
//! Contracts for everything the domain depends on but does not own: the
//! vector store backend, the encoder set, durable job and user storage, the
//! audit sink, content encryption, and request limiting.
//!
//! ## Provider Ports
//!
//! | Port | Description |
//! | ------ | ------------- |
//! | `VectorStoreProvider` | Collection/point CRUD, named-vector search, snapshots |
//! | `DenseEncoder` / `SparseEncoder` / `SpladeEncoder` / `CrossEncoder` | The encoder set |
//! | `JobStore` / `JobDispatcher` | Durable job table and worker hand-off |
//! | `UserStore` | User persistence |
//! | `AuditSink` | Append-only audit logging |
//! | `ContentCipher` | Per-tenant content encryption |
//! | `RateLimiter` / `QuotaCounter` | Sliding-window limiting and daily quota |

/// Audit sink port
pub mod audit;
/// Per-tenant content encryption port
pub mod crypto;
/// Encoder set ports
pub mod encoders;
/// Durable job storage and dispatch ports
pub mod jobs;
/// Rate limiting and quota ports
pub mod limits;
/// User persistence port
pub mod users;
/// Vector store provider port
pub mod vector_store;

pub use audit::AuditSink;
pub use crypto::ContentCipher;
pub use encoders::{CrossEncoder, DenseEncoder, SparseEncoder, SpladeEncoder};
pub use jobs::{JobDispatcher, JobStore};
pub use limits::{QuotaCounter, QuotaTier, RateLimiter};
pub use users::UserStore;
pub use vector_store::{CollectionSpec, Distance, VectorStoreProvider};
