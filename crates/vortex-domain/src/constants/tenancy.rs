//! Multi-tenancy constants.

/// The distinguished tenant whose documents are visible to everyone
pub const PUBLIC_TENANT: &str = "public";

/// Default access level for documents that do not specify one
pub const DEFAULT_ACCESS_LEVEL: i64 = 1;

/// Payload fields reserved by the gateway; stripped before hashing
pub const RESERVED_FIELDS: &[&str] = &["_id", "_vector", "_timestamp", "_hash", "_collection"];
