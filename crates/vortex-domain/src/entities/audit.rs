//! Append-only audit entries with hash chaining.
//!
//! Two chains exist: *critical* (written synchronously) and *hot*
//! (batched asynchronously). Each persisted line is a [`ChainedEntry`];
//! `hash = SHA-256(prev_hash || canonical_json(entry))`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::audit::CRITICAL_EVENTS;
use crate::identity::canonical_json;

/// The payload of one audit event, before chaining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Event time (RFC 3339, UTC)
    pub timestamp: String,
    /// Event type, e.g. `access_denied`
    pub event_type: String,
    /// Structured event data
    pub data: serde_json::Value,
}

/// A chained audit record as persisted, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainedEntry {
    /// The bare entry
    pub entry: AuditEntry,
    /// Hash of the previous record in the same chain
    pub prev_hash: String,
    /// `SHA-256(prev_hash || canonical_json(entry))`
    pub hash: String,
}

impl ChainedEntry {
    /// Chain an entry onto `prev_hash`
    #[must_use]
    pub fn chain(entry: AuditEntry, prev_hash: &str) -> Self {
        let hash = chain_hash(prev_hash, &entry);
        Self {
            entry,
            prev_hash: prev_hash.to_owned(),
            hash,
        }
    }

    /// Verify this record's hash against its own `prev_hash`
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        chain_hash(&self.prev_hash, &self.entry) == self.hash
    }
}

/// Compute the chain hash for an entry.
#[must_use]
pub fn chain_hash(prev_hash: &str, entry: &AuditEntry) -> String {
    let serialized = serde_json::to_value(entry)
        .map(|v| canonical_json(&v))
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}

/// True when the event type belongs on the synchronously-written chain.
#[must_use]
pub fn is_critical_event(event_type: &str) -> bool {
    CRITICAL_EVENTS.contains(&event_type)
}
