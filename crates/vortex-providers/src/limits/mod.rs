//! Rate limiting and quota implementations.
//!
//! Redis-backed variants for distributed deployments; in-memory fallbacks for
//! single-instance or Redis-less setups. Both fail open on store errors.

mod memory;
mod redis_impl;

pub use memory::{InMemoryQuotaCounter, InMemoryRateLimiter};
pub use redis_impl::{RedisQuotaCounter, RedisRateLimiter};
