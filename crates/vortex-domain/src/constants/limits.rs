//! Rate limit and quota constants.

/// Default request cap per window for one principal
pub const DEFAULT_RATE_LIMIT_MAX: u64 = 100;
/// Default sliding window length in seconds
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Daily export cap for the free tier
pub const QUOTA_FREE_DAILY: u64 = 10_000;
/// Daily export cap for the pro tier
pub const QUOTA_PRO_DAILY: u64 = 1_000_000;

/// Quota counter expiry (24 hours)
pub const QUOTA_EXPIRE_SECS: u64 = 86_400;
