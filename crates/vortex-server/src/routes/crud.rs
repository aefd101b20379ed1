//! Document CRUD endpoints.

use axum::extract::{Multipart, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};

use vortex_application::security::{Resource, ResourceAction};
use vortex_domain::error::Error;
use vortex_domain::value_objects::Payload;

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestContext;
use crate::routes::require_permission;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpsertBatchRequest {
    pub collection: String,
    #[serde(default)]
    pub documents: Vec<Value>,
}

#[derive(Deserialize)]
pub struct UpdateRequest {
    pub collection: String,
    pub db_id: String,
    pub new_payload: Payload,
    #[serde(default = "default_merge")]
    pub merge: bool,
}

fn default_merge() -> bool {
    true
}

#[derive(Deserialize)]
pub struct DeleteRequest {
    pub collection: String,
    pub db_id: String,
}

/// `POST /crud/upsert`: multipart: `collection` field plus one JSON file.
pub async fn upsert_file(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    require_permission(&state, &rc.user, &Resource::default(), ResourceAction::Write).await?;

    let mut collection: Option<String> = None;
    let mut filename: Option<String> = None;
    let mut docs: Vec<Value> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError(Error::invalid_request(format!("malformed multipart: {e}"))))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("collection") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError(Error::invalid_request(format!("bad field: {e}"))))?;
                collection = Some(value);
            }
            _ => {
                filename = field.file_name().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError(Error::invalid_request(format!("bad upload: {e}"))))?;
                let parsed: Value = serde_json::from_slice(&bytes)
                    .map_err(|e| ApiError(Error::from(e)))?;
                match parsed {
                    Value::Array(items) => docs.extend(items),
                    single => docs.push(single),
                }
            }
        }
    }

    let collection = collection
        .ok_or_else(|| ApiError(Error::invalid_request("missing 'collection' field")))?;

    state
        .ingest
        .upsert_documents(&collection, &docs, None)
        .await
        .map_err(ApiError)?;

    Ok(Json(json!({
        "status": "success",
        "collection": collection,
        "filename": filename.unwrap_or_default(),
    })))
}

/// `POST /crud/upsert_batch`: inline document batch.
pub async fn upsert_batch(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<UpsertBatchRequest>,
) -> ApiResult<Json<Value>> {
    require_permission(&state, &rc.user, &Resource::default(), ResourceAction::Write).await?;

    // An empty batch is an accepted no-op.
    let count = state
        .ingest
        .upsert_documents(&body.collection, &body.documents, None)
        .await
        .map_err(ApiError)?;

    Ok(Json(json!({"status": "success", "count": count})))
}

/// `PATCH /crud/update`: payload-only update; vectors are untouched.
pub async fn update(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<UpdateRequest>,
) -> ApiResult<Json<Value>> {
    require_permission(&state, &rc.user, &Resource::default(), ResourceAction::Write).await?;

    let updated = state
        .ingest
        .update_payload(&body.collection, &body.db_id, &body.new_payload, body.merge)
        .await
        .map_err(ApiError)?;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Updated payload on {updated} chunks"),
    })))
}

/// `DELETE /crud/delete`: delete a document and all of its chunks.
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<DeleteRequest>,
) -> ApiResult<Json<Value>> {
    require_permission(&state, &rc.user, &Resource::default(), ResourceAction::Delete).await?;

    state
        .ingest
        .delete_document(&body.collection, &body.db_id)
        .await
        .map_err(ApiError)?;

    state
        .audit
        .log_event(
            "data_delete",
            json!({
                "user": rc.user.user_id,
                "collection": body.collection,
                "db_id": body.db_id,
                "correlation_id": rc.correlation_id,
            }),
        )
        .await;

    Ok(Json(json!({
        "status": "success",
        "message": format!("Deleted document {}", body.db_id),
    })))
}
