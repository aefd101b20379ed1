//! Audit log constants.

/// Events written synchronously to the critical chain
pub const CRITICAL_EVENTS: &[&str] = &[
    "user_login_failed",
    "user_login_success",
    "access_denied",
    "privilege_escalation",
    "data_delete",
    "collection_deleted",
    "bulk_export",
    "config_changed",
    "role_changed",
    "brute_force_detected",
    "injection_detected",
    "service_auth_failed",
];

/// Capacity of the hot-chain queue; overflow falls back to a sync write
pub const HOT_QUEUE_CAPACITY: usize = 10_000;
/// Hot-chain batch size trigger
pub const HOT_BATCH_SIZE: usize = 1000;
/// Hot-chain flush interval in milliseconds
pub const HOT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Genesis hash for an empty chain
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
