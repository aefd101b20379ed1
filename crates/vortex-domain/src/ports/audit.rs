//! Audit sink port.

use async_trait::async_trait;

/// Append-only audit logging.
///
/// Critical events are persisted synchronously before this call returns;
/// everything else is enqueued for the background batcher. Failures are
/// logged internally; audit logging never fails the request path.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one event
    async fn log_event(&self, event_type: &str, data: serde_json::Value);
}
