//! In-memory rate limiter and quota counter.
//!
//! Per-process fallbacks running the same algorithms as the Redis variants:
//! a sliding-window log of request timestamps, and a daily usage counter.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use vortex_domain::ports::limits::{QuotaCounter, QuotaTier, RateLimiter};

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Sliding-window log limiter over a per-process map.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    store: Mutex<HashMap<String, Vec<f64>>>,
}

impl InMemoryRateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn is_allowed(&self, key: &str, max_requests: u64, window_secs: u64) -> bool {
        let now = now_secs();
        let cutoff = now - window_secs as f64;

        let Ok(mut store) = self.store.lock() else {
            // Fail open, same as an unreachable Redis.
            return true;
        };
        let history = store.entry(key.to_owned()).or_default();
        history.retain(|t| *t > cutoff);

        if (history.len() as u64) < max_requests {
            history.push(now);
            true
        } else {
            false
        }
    }
}

/// Daily quota counter over a per-process map.
#[derive(Default)]
pub struct InMemoryQuotaCounter {
    store: Mutex<HashMap<String, u64>>,
}

impl InMemoryQuotaCounter {
    /// Create an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaCounter for InMemoryQuotaCounter {
    async fn consume(&self, user_id: &str, count: u64, tier: QuotaTier) -> (bool, String) {
        let Some(cap) = tier.daily_cap() else {
            return (true, "unlimited".to_owned());
        };

        let today = chrono::Utc::now().format("%Y-%m-%d");
        let key = format!("quota:{user_id}:{today}");

        let Ok(mut store) = self.store.lock() else {
            return (true, "error_open".to_owned());
        };
        let usage = store.entry(key).or_insert(0);
        *usage += count;

        if *usage > cap {
            (
                false,
                format!("Daily export limit exceeded ({usage}/{cap})"),
            )
        } else {
            (true, "ok".to_owned())
        }
    }
}
