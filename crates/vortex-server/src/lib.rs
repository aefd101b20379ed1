//! # HTTP Gateway
//!
//! Axum surface for VortexDB: request routing, the security middleware
//! (correlation ID → auth → rate limit → audit), the error envelope, and
//! application wiring.

/// Error envelope mapping
pub mod error;
/// Security middleware
pub mod middleware;
/// Route handlers
pub mod routes;
/// Application state composition
pub mod state;

use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn_with_state;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Per-request deadline; propagates to all downstream calls.
const REQUEST_DEADLINE: Duration = Duration::from_secs(60);

/// Build the full application router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    routes::router(state.clone())
        .layer(from_fn_with_state(state, middleware::security_middleware))
        .layer(TimeoutLayer::new(REQUEST_DEADLINE))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
