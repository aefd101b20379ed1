//! Administrative lifecycle endpoints. All of them require the admin role.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};

use vortex_application::security::{Resource, ResourceAction};
use vortex_domain::constants::search::SEMANTIC_CACHE_COLLECTION;
use vortex_domain::entities::JobType;
use vortex_domain::error::Error;
use vortex_domain::ports::vector_store::CollectionSpec;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestContext;
use crate::routes::require_permission;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub vector_size: usize,
}

#[derive(Deserialize)]
pub struct DeleteCollectionRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct SnapshotCreateRequest {
    pub collection: String,
}

#[derive(Deserialize)]
pub struct SnapshotPathRequest {
    pub path: String,
}

#[derive(Deserialize, Default)]
pub struct Bm25RetrainRequest {
    #[serde(default)]
    pub base_path: Option<String>,
}

async fn require_admin(state: &AppState, rc: &RequestContext) -> Result<(), ApiError> {
    require_permission(
        state,
        &rc.user,
        &Resource::default(),
        ResourceAction::ManageConfig,
    )
    .await
}

/// Snapshot paths are whitelisted: under the snapshot directory or the
/// backend's `collections/` namespace, and free of traversal segments.
fn validate_snapshot_path(state: &AppState, path: &str) -> Result<(), ApiError> {
    let in_snapshot_dir = path.starts_with(&state.config.paths.snapshot_dir);
    let in_backend = path.starts_with("collections/");
    if path.contains("..") || (!in_snapshot_dir && !in_backend) {
        return Err(ApiError(Error::invalid_request(format!(
            "snapshot path '{path}' is not whitelisted"
        ))));
    }
    Ok(())
}

/// `POST /admin/collections/create`
pub async fn create_collection(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<CreateCollectionRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;

    state
        .store
        .create_collection(&body.name, &CollectionSpec::hybrid(body.vector_size))
        .await
        .map_err(ApiError)?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Collection '{}' created", body.name),
    })))
}

/// `POST /admin/collections/delete`
pub async fn delete_collection(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<DeleteCollectionRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;

    state
        .store
        .delete_collection(&body.name)
        .await
        .map_err(ApiError)?;

    state
        .audit
        .log_event(
            "collection_deleted",
            json!({"user": rc.user.user_id, "collection": body.name}),
        )
        .await;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Collection '{}' deleted", body.name),
    })))
}

/// `GET /admin/collections/list`
pub async fn list_collections(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;

    let infos = state.store.list_collections().await.map_err(ApiError)?;
    let total_count = infos.len();
    Ok(Json(json!({
        "collections": infos,
        "total_count": total_count,
    })))
}

/// `POST /admin/snapshot/create`: queued as a job.
pub async fn create_snapshot(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<SnapshotCreateRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;

    let job = state
        .jobs
        .enqueue(
            JobType::CreateSnapshot,
            json!({"collection": body.collection}),
        )
        .await
        .map_err(ApiError)?;

    Ok(Json(json!({
        "status": "queued",
        "message": format!("Snapshot creation queued. Job ID: {}", job.id),
    })))
}

/// `GET /admin/snapshot/list`
pub async fn list_snapshots(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;
    let snapshots = state.store.list_snapshots().await.map_err(ApiError)?;
    Ok(Json(json!({"snapshots": snapshots})))
}

/// `POST /admin/snapshot/restore`
pub async fn restore_snapshot(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<SnapshotPathRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;
    validate_snapshot_path(&state, &body.path)?;

    state
        .store
        .restore_snapshot(&body.path)
        .await
        .map_err(ApiError)?;
    Ok(Json(json!({"status": "restored", "path": body.path})))
}

/// `POST /admin/snapshot/delete`
pub async fn delete_snapshot(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<SnapshotPathRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;
    validate_snapshot_path(&state, &body.path)?;

    state
        .store
        .delete_snapshot(&body.path)
        .await
        .map_err(ApiError)?;
    Ok(Json(json!({"status": "deleted", "path": body.path})))
}

/// `POST /admin/bm25/retrain`: queued, deduplicated, cooled down.
pub async fn bm25_retrain(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<Bm25RetrainRequest>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;

    if !state.config.jobs.allow_bm25_batch {
        return Err(ApiError(Error::access_denied(
            "BM25 retraining is disabled by configuration",
        )));
    }

    let payload = json!({
        "base_path": body.base_path.unwrap_or_else(|| "./data".to_owned()),
    });

    match state.jobs.enqueue(JobType::Bm25Retrain, payload).await {
        Ok(job) => Ok(Json(json!({
            "status": "queued",
            "job_id": job.id,
            "type": JobType::Bm25Retrain.as_str(),
        }))),
        Err(Error::JobSkipped { message }) => Ok(Json(json!({
            "status": "skipped",
            "detail": message,
            "type": JobType::Bm25Retrain.as_str(),
        }))),
        Err(e) => Err(ApiError(e)),
    }
}

/// `POST /admin/cache/clear`: drop the semantic cache collection.
pub async fn clear_cache(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;

    match state.store.delete_collection(SEMANTIC_CACHE_COLLECTION).await {
        Ok(()) | Err(Error::NotFound { .. }) => Ok(Json(json!({"status": "cleared"}))),
        Err(e) => Err(ApiError(e)),
    }
}

/// `POST /admin/reset_db`: drop every collection.
pub async fn reset_db(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
) -> ApiResult<Json<Value>> {
    require_admin(&state, &rc).await?;

    let infos = state.store.list_collections().await.map_err(ApiError)?;
    for info in &infos {
        state
            .store
            .delete_collection(&info.name)
            .await
            .map_err(ApiError)?;
    }

    state
        .audit
        .log_event(
            "data_delete",
            json!({
                "user": rc.user.user_id,
                "scope": "reset_db",
                "collections": infos.len(),
            }),
        )
        .await;

    Ok(Json(json!({"status": "success"})))
}
