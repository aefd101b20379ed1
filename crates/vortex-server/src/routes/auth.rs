//! Authentication endpoints.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::json;

use vortex_domain::error::Error;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = state
        .users
        .authenticate(&body.username, &body.password)
        .await
        .map_err(ApiError)?;

    let Some(user) = user else {
        state
            .audit
            .log_event("user_login_failed", json!({"username": body.username}))
            .await;
        return Err(ApiError(Error::unauthorized(
            "invalid username or password",
        )));
    };

    let token = state
        .tokens
        .issue(&user.username, user.role, None)
        .map_err(ApiError)?;

    state
        .audit
        .log_event(
            "user_login_success",
            json!({"username": user.username, "role": user.role.as_str()}),
        )
        .await;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_owned(),
    }))
}
