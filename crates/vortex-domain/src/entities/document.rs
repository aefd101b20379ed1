//! Logical documents as prepared for ingestion.

use serde::{Deserialize, Serialize};

use crate::value_objects::Payload;

/// A client document after payload normalization and identity derivation,
/// ready for chunking and encoding.
///
/// Every chunk cut from this document shares its `db_id`, `tenant_id`, and
/// `access_level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDocument {
    /// SHA-256 content hash; stable across re-ingestion of identical content
    pub db_id: String,
    /// Client-supplied ID (not unique)
    pub original_id: Option<String>,
    /// Owning tenant; `"public"` when unset
    pub tenant_id: String,
    /// Visibility ceiling, 1 = most open
    pub access_level: i64,
    /// Pre-chunking text selected by the normalizer
    pub text: String,
    /// Flattened payload fields (includes `_text` and `_hash`)
    pub payload: Payload,
}
