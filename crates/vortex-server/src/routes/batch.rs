//! Asynchronous batch endpoints backed by the job engine.

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use vortex_application::security::{Resource, ResourceAction};
use vortex_domain::entities::JobType;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestContext;
use crate::routes::require_permission;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct BatchIngestRequest {
    pub collection: String,
    #[serde(default)]
    pub documents: Vec<Value>,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

/// `POST /batch/ingest` and `POST /batch/upsert_batch`
pub async fn enqueue_ingest(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<BatchIngestRequest>,
) -> ApiResult<Json<Value>> {
    require_permission(&state, &rc.user, &Resource::default(), ResourceAction::Write).await?;

    let job = state
        .jobs
        .enqueue(
            JobType::UpsertBatchDocs,
            json!({
                "collection": body.collection,
                "documents": body.documents,
            }),
        )
        .await
        .map_err(ApiError)?;

    Ok(Json(json!({"status": "queued", "job_id": job.id})))
}

/// `GET /batch/jobs/status/{id}`
pub async fn job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let job = state.jobs.get_status(id).await.map_err(ApiError)?;
    Ok(Json(json!({
        "job": {
            "id": job.id,
            "type": job.job_type.as_str(),
            "status": job.status.as_str(),
            "message": job.message,
            "progress": job.progress,
            "created_at": job.created_at,
            "updated_at": job.updated_at,
        }
    })))
}

/// `GET /batch/jobs/list?limit=N`
pub async fn job_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let (counts, jobs) = state.jobs.list(query.limit).await.map_err(ApiError)?;
    let rows: Vec<Value> = jobs
        .into_iter()
        .map(|job| {
            json!({
                "id": job.id,
                "type": job.job_type.as_str(),
                "status": job.status.as_str(),
                "message": job.message,
                "progress": job.progress,
                "created_at": job.created_at,
                "updated_at": job.updated_at,
            })
        })
        .collect();
    Ok(Json(json!({"counts": counts, "jobs": rows})))
}
