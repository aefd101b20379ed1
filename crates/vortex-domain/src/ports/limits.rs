//! Rate limiting and quota ports.

use async_trait::async_trait;
use derive_more::Display;

use crate::constants::limits::{QUOTA_FREE_DAILY, QUOTA_PRO_DAILY};
use crate::entities::Role;

/// Sliding-window request limiter.
///
/// Fail policy: implementations fail open when the backing store is
/// unreachable; availability over precision for a gateway.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// True when the request under `key` fits in the window
    async fn is_allowed(&self, key: &str, max_requests: u64, window_secs: u64) -> bool;
}

/// Quota tier with a daily export cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum QuotaTier {
    /// 10k results per day
    #[display("free")]
    Free,
    /// 1M results per day
    #[display("pro")]
    Pro,
    /// Unlimited
    #[display("enterprise")]
    Enterprise,
    /// Unlimited
    #[display("admin")]
    Admin,
}

impl QuotaTier {
    /// Daily cap; `None` means unlimited
    #[must_use]
    pub fn daily_cap(&self) -> Option<u64> {
        match self {
            Self::Free => Some(QUOTA_FREE_DAILY),
            Self::Pro => Some(QUOTA_PRO_DAILY),
            Self::Enterprise | Self::Admin => None,
        }
    }

    /// Tier assigned to a role
    #[must_use]
    pub fn from_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Engineer | Role::Analyst => Self::Pro,
            Role::Viewer | Role::Service | Role::Guest => Self::Free,
        }
    }
}

/// Per-user daily export counter.
#[async_trait]
pub trait QuotaCounter: Send + Sync {
    /// Atomically add `count` to today's usage; returns whether the tier cap
    /// still holds and a human-readable message
    async fn consume(&self, user_id: &str, count: u64, tier: QuotaTier) -> (bool, String);
}
