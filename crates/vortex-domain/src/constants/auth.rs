//! Authentication constants.

/// HTTP header carrying the internal service API key
pub const API_KEY_HEADER: &str = "x-api-key";
/// HTTP header carrying the bearer token
pub const AUTHORIZATION_HEADER: &str = "authorization";
/// Bearer scheme prefix
pub const BEARER_PREFIX: &str = "Bearer ";
/// Correlation ID header, generated when absent
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Access token lifetime in minutes
pub const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 60;
/// Minimum accepted JWT secret length
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Internal services allowed to authenticate via API key
pub const SERVICE_WHITELIST: &[&str] = &["ingest_worker", "dashboard_api", "feedback_worker"];
