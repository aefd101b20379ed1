//! Health and metrics endpoints.

use axum::Json;
use axum::extract::State;
use serde_json::{Map, Value, json};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// `GET /health/status`
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let infos = state.store.list_collections().await.map_err(ApiError)?;

    let mut collections = Map::new();
    for info in infos {
        collections.insert(
            info.name.clone(),
            json!({
                "count": info.points_count,
                "vector_size": info.vector_size,
                "status": info.status,
            }),
        );
    }
    Ok(Json(json!({"collections": collections})))
}

/// `GET /metrics`: Prometheus exposition.
pub async fn metrics(State(state): State<AppState>) -> ApiResult<String> {
    state
        .metrics
        .collect_job_metrics(state.job_store.as_ref())
        .await;
    state.metrics.render().map_err(ApiError)
}
