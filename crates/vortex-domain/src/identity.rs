//! Deterministic document and point identity.
//!
//! `doc_hash` fingerprints a document's canonical JSON; `point_id` derives a
//! stable UUID v5 per chunk. Re-ingesting identical content therefore neither
//! duplicates points nor churns IDs.

use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::constants::tenancy::RESERVED_FIELDS;

/// Fixed namespace for all point IDs; must never change across releases.
const POINT_NAMESPACE: Uuid = Uuid::from_u128(0x8f1d_52b7_43aa_4e0b_9d6c_02e7_a1c4_5f38);

/// Serialize a JSON value canonically: object keys sorted recursively,
/// compact separators.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    fn write(value: &Value, out: &mut String) {
        match value {
            Value::Object(map) => {
                out.push('{');
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&serde_json::to_string(key).unwrap_or_default());
                    out.push(':');
                    write(&map[*key], out);
                }
                out.push('}');
            }
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write(item, out);
                }
                out.push(']');
            }
            other => out.push_str(&other.to_string()),
        }
    }

    let mut out = String::new();
    write(value, &mut out);
    out
}

/// Content-hash ID for a document: reserved fields stripped, canonical JSON,
/// SHA-256 hex.
#[must_use]
pub fn doc_hash(doc: &Value) -> String {
    let cleaned = match doc {
        Value::Object(map) => {
            let mut cleaned = map.clone();
            for reserved in RESERVED_FIELDS {
                cleaned.remove(*reserved);
            }
            Value::Object(cleaned)
        }
        other => other.clone(),
    };
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(&cleaned).as_bytes());
    hex::encode(hasher.finalize())
}

/// Deterministic point ID for one chunk of a document.
///
/// Same `(db_id, chunk_index)` yields the same UUID across processes.
#[must_use]
pub fn point_id(db_id: &str, chunk_index: usize) -> Uuid {
    Uuid::new_v5(&POINT_NAMESPACE, format!("{db_id}:{chunk_index}").as_bytes())
}

/// Deterministic point ID for a semantic cache entry, scoped per user.
#[must_use]
pub fn cache_point_id(query_text: &str, user_id: &str) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(query_text.as_bytes());
    hasher.update(user_id.as_bytes());
    point_id(&hex::encode(hasher.finalize()), 0)
}
