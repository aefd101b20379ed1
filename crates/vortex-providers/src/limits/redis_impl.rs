//! Redis-backed rate limiter and quota counter.
//!
//! Rate limiting is a sliding-window log over a ZSET: drop entries older than
//! the window, count the rest, add the current request, refresh expiry. Quota
//! is an atomic `INCRBY` with a 24-hour expiry. Both fail open when Redis is
//! unreachable; availability over precision for a gateway.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use vortex_domain::constants::limits::QUOTA_EXPIRE_SECS;
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::limits::{QuotaCounter, QuotaTier, RateLimiter};

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Distributed sliding-window limiter.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: ConnectionManager,
}

impl RedisRateLimiter {
    /// Connect to Redis at `url`.
    ///
    /// # Errors
    /// Returns an error when the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::upstream_with_source("invalid Redis URL", e))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::upstream_with_source("Redis connection failed", e))?;
        tracing::info!(url, "connected to Redis");
        Ok(Self { conn })
    }

    /// Build from an existing connection (shared with the quota counter).
    #[must_use]
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// The underlying connection, for sharing.
    #[must_use]
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    async fn check(&self, key: &str, max_requests: u64, window_secs: u64) -> Result<bool> {
        let now = now_secs();
        let cutoff = now - window_secs as f64;
        // Unique member per request; the score carries the timestamp.
        let member = format!("{now:.6}");

        let mut conn = self.conn.clone();
        let (_, current, _, _): (i64, u64, i64, i64) = redis::pipe()
            .zrembyscore(key, f64::NEG_INFINITY, cutoff)
            .zcard(key)
            .zadd(key, member, now)
            .expire(key, window_secs as i64 + 1)
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::upstream_with_source("rate limit check failed", e))?;

        Ok(current < max_requests)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn is_allowed(&self, key: &str, max_requests: u64, window_secs: u64) -> bool {
        match self.check(key, max_requests, window_secs).await {
            Ok(allowed) => allowed,
            Err(e) => {
                tracing::warn!(error = %e, key, "rate limiter failing open");
                true
            }
        }
    }
}

/// Distributed daily quota counter.
#[derive(Clone)]
pub struct RedisQuotaCounter {
    conn: ConnectionManager,
}

impl RedisQuotaCounter {
    /// Build from a connection shared with the rate limiter.
    #[must_use]
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    async fn add(&self, key: &str, count: u64) -> Result<u64> {
        let mut conn = self.conn.clone();
        let usage: u64 = conn
            .incr(key, count)
            .await
            .map_err(|e| Error::upstream_with_source("quota increment failed", e))?;
        let _: std::result::Result<i64, _> = conn.expire(key, QUOTA_EXPIRE_SECS as i64).await;
        Ok(usage)
    }
}

#[async_trait]
impl QuotaCounter for RedisQuotaCounter {
    async fn consume(&self, user_id: &str, count: u64, tier: QuotaTier) -> (bool, String) {
        let Some(cap) = tier.daily_cap() else {
            return (true, "unlimited".to_owned());
        };

        let today = chrono::Utc::now().format("%Y-%m-%d");
        let key = format!("quota:{user_id}:{today}");

        match self.add(&key, count).await {
            Ok(usage) if usage > cap => (
                false,
                format!("Daily export limit exceeded ({usage}/{cap})"),
            ),
            Ok(_) => (true, "ok".to_owned()),
            Err(e) => {
                tracing::warn!(error = %e, user_id, "quota counter failing open");
                (true, "error_open".to_owned())
            }
        }
    }
}
