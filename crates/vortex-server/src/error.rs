//! The HTTP error envelope.
//!
//! Structured domain errors pass through unchanged as
//! `{status: "error", code, detail}`; unknown failures become
//! `INTERNAL_ERROR` with a scrubbed message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use vortex_domain::error::Error;

/// Wrapper turning a domain error into the HTTP envelope.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::AccessDenied { .. } => StatusCode::FORBIDDEN,
        Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        Error::InvalidRequest { .. } | Error::AnomalyDetected { .. } => StatusCode::BAD_REQUEST,
        Error::Json { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::RateLimited | Error::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::Upstream { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Error::JobSkipped { .. } => StatusCode::CONFLICT,
        Error::Encryption { .. }
        | Error::JobDispatch { .. }
        | Error::Encoder { .. }
        | Error::Database { .. }
        | Error::Config { .. }
        | Error::Io { .. }
        | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Never leak internals; the full error goes to the logs.
            tracing::error!(error = %self.0, "internal error");
            "internal error".to_owned()
        } else {
            self.0.to_string()
        };

        let body = json!({
            "status": "error",
            "code": self.0.code(),
            "detail": detail,
        });
        (status, Json(body)).into_response()
    }
}

/// Handler result alias.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
