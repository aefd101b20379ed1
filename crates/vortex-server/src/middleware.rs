//! Security middleware.
//!
//! Runs on every inbound request, in order: correlation-ID assignment,
//! authentication (bearer JWT, service API key, or guest), rate limiting,
//! and, after the handler, an audit event and the request metrics. Public
//! read endpoints bypass auth and rate limits.

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use vortex_domain::constants::auth::{
    API_KEY_HEADER, AUTHORIZATION_HEADER, BEARER_PREFIX, CORRELATION_ID_HEADER, SERVICE_WHITELIST,
};
use vortex_domain::error::Error;
use vortex_domain::value_objects::UserContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Routes reachable without credentials or rate limiting.
const PUBLIC_PATHS: [&str; 4] = ["/health", "/health/status", "/metrics", "/auth/login"];

/// The request extension carrying the caller's security context.
#[derive(Clone)]
pub struct RequestContext {
    /// Authenticated caller
    pub user: UserContext,
    /// Correlation ID propagated through logs and audit
    pub correlation_id: String,
}

/// The security middleware. See the module docs for ordering.
pub async fn security_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(
            vortex_infrastructure::logging::new_correlation_id,
            str::to_owned,
        );

    let is_public = PUBLIC_PATHS.contains(&path.as_str());

    let user = if is_public {
        UserContext::guest()
    } else {
        match authenticate(&state, &request).await {
            Ok(user) => user,
            Err(err) => {
                let response = ApiError(err).into_response();
                return finalize(state, response, &path, "anonymous", &correlation_id).await;
            }
        }
    };

    if !is_public {
        let key = format!("user:{}:{path}", user.user_id);
        let allowed = state
            .rate_limiter
            .is_allowed(
                &key,
                state.config.security.rate_limit_max,
                state.config.security.rate_limit_window_secs,
            )
            .await;
        if !allowed {
            let response = ApiError(Error::RateLimited).into_response();
            return finalize(state, response, &path, &user.user_id, &correlation_id).await;
        }
    }

    let user_id = user.user_id.clone();
    request.extensions_mut().insert(RequestContext {
        user,
        correlation_id: correlation_id.clone(),
    });

    let response = next.run(request).await;
    finalize(state, response, &path, &user_id, &correlation_id).await
}

async fn authenticate(state: &AppState, request: &Request<Body>) -> Result<UserContext, Error> {
    let headers = request.headers();

    if let Some(value) = headers.get(AUTHORIZATION_HEADER) {
        let raw = value
            .to_str()
            .map_err(|_| Error::unauthorized("malformed authorization header"))?;
        let token = raw
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| Error::unauthorized("expected bearer scheme"))?;
        return state.tokens.validate(token);
    }

    if let Some(value) = headers.get(API_KEY_HEADER) {
        let raw = value
            .to_str()
            .map_err(|_| Error::unauthorized("malformed API key header"))?;
        return authenticate_service(state, raw).await;
    }

    Ok(UserContext::guest())
}

/// API-key format: `<service_id>:<admin_secret>`. The service must be
/// whitelisted and the shared secret must match.
async fn authenticate_service(state: &AppState, raw: &str) -> Result<UserContext, Error> {
    let deny = |reason: &str| Error::unauthorized(format!("service auth failed: {reason}"));

    let Some((service_id, secret)) = raw.split_once(':') else {
        state
            .audit
            .log_event("service_auth_failed", json!({"reason": "malformed key"}))
            .await;
        return Err(deny("malformed key"));
    };

    let expected = state.config.security.admin_secret.as_deref();
    if expected.is_none() || expected != Some(secret) {
        state
            .audit
            .log_event("service_auth_failed", json!({"service": service_id}))
            .await;
        return Err(deny("bad secret"));
    }
    if !SERVICE_WHITELIST.contains(&service_id) {
        state
            .audit
            .log_event("service_auth_failed", json!({"service": service_id}))
            .await;
        return Err(deny("unknown service"));
    }

    Ok(UserContext::service(service_id))
}

/// After-handler duties: audit trail, metrics, correlation-ID echo.
async fn finalize(
    state: AppState,
    mut response: Response,
    path: &str,
    user_id: &str,
    correlation_id: &str,
) -> Response {
    let status = response.status();

    state
        .audit
        .log_event(
            "http_request",
            json!({
                "route": path,
                "status": status.as_u16(),
                "user": user_id,
                "correlation_id": correlation_id,
            }),
        )
        .await;

    state
        .metrics
        .http_requests
        .with_label_values(&[path, status.as_str()])
        .inc();

    if let Ok(value) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }
    response
}
