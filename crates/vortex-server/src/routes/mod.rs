//! Route handlers.

pub mod admin;
pub mod auth;
pub mod batch;
pub mod crud;
pub mod health;
pub mod query;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use serde_json::json;

use vortex_application::security::{Resource, ResourceAction};
use vortex_domain::error::Error;
use vortex_domain::value_objects::UserContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Assemble the full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/health", get(health::health))
        .route("/health/status", get(health::status))
        .route("/metrics", get(health::metrics))
        .route("/query/hybrid", post(query::hybrid))
        .route("/query/keyword", post(query::keyword))
        .route("/crud/upsert", post(crud::upsert_file))
        .route("/crud/upsert_batch", post(crud::upsert_batch))
        .route("/crud/update", patch(crud::update))
        .route("/crud/delete", delete(crud::delete_document))
        .route("/batch/ingest", post(batch::enqueue_ingest))
        .route("/batch/upsert_batch", post(batch::enqueue_ingest))
        .route("/batch/jobs/status/{id}", get(batch::job_status))
        .route("/batch/jobs/list", get(batch::job_list))
        .route("/admin/collections/create", post(admin::create_collection))
        .route("/admin/collections/delete", post(admin::delete_collection))
        .route("/admin/collections/list", get(admin::list_collections))
        .route("/admin/snapshot/create", post(admin::create_snapshot))
        .route("/admin/snapshot/list", get(admin::list_snapshots))
        .route("/admin/snapshot/restore", post(admin::restore_snapshot))
        .route("/admin/snapshot/delete", post(admin::delete_snapshot))
        .route("/admin/bm25/retrain", post(admin::bm25_retrain))
        .route("/admin/cache/clear", post(admin::clear_cache))
        .route("/admin/reset_db", post(admin::reset_db))
        .with_state(state)
}

/// Evaluate a permission, auditing denials.
pub(crate) async fn require_permission(
    state: &AppState,
    ctx: &UserContext,
    resource: &Resource,
    action: ResourceAction,
) -> Result<(), ApiError> {
    let (allowed, reason) = state.access.check_permission(ctx, resource, action);
    if allowed {
        return Ok(());
    }
    state
        .audit
        .log_event(
            "access_denied",
            json!({
                "user": ctx.user_id,
                "action": action.to_string(),
                "reason": reason,
            }),
        )
        .await;
    Err(ApiError(Error::access_denied(reason)))
}
