//! # Domain Layer
//!
//! Core business types and rules for the VortexDB hybrid search gateway.
//! Contains entities, value objects, provider ports, and the pure helpers
//! every other layer builds on (identity derivation, chunking, payload
//! normalization).
//!
//! ## Architecture
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`entities`] | Core business entities with identity |
//! | [`value_objects`] | Immutable value objects (vectors, filters, search results) |
//! | [`ports`] | External provider port interfaces |
//! | [`identity`] | Deterministic content hashes and point IDs |
//! | [`chunking`] | Recursive separator-based text splitting |
//! | [`payload`] | Universal JSON payload normalization |
//! | [`constants`] | Domain constants |
//! | [`error`] | Domain error taxonomy |
//!
//! ## Clean Architecture Principles
//!
//! - **Entities** are at the center with business rules
//! - **Ports** define what the outside world must provide
//! - **No infrastructure concerns**; no I/O, no network, no clocks beyond
//!   timestamps handed in by callers

/// Recursive text chunker
pub mod chunking;
/// Domain-level constants
pub mod constants;
/// Core business entities with identity
pub mod entities;
/// Domain error types
pub mod error;
/// Deterministic document and point identity
pub mod identity;
/// Universal JSON payload normalization
pub mod payload;
/// External provider port interfaces
pub mod ports;
/// Immutable value objects
pub mod value_objects;

// Re-export commonly used types for convenience
pub use entities::*;
pub use error::{Error, Result};
pub use value_objects::*;
