//! Query endpoints: hybrid and keyword search.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};

use vortex_application::search::SearchRequest;
use vortex_application::security::{Resource, ResourceAction};
use vortex_domain::error::Error;
use vortex_domain::ports::limits::QuotaTier;
use vortex_domain::value_objects::{FusionStrategy, ScoredDocument, SearchTuning, UserContext};

use crate::error::{ApiError, ApiResult};
use crate::middleware::RequestContext;
use crate::routes::require_permission;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct HybridQueryRequest {
    pub query_text: String,
    pub top_k: usize,
    #[serde(default)]
    pub collections: Option<Vec<String>>,
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub tuning_mode: Option<String>,
}

#[derive(Deserialize)]
pub struct KeywordQueryRequest {
    pub query: String,
    pub top_k: usize,
    #[serde(default)]
    pub collections: Option<Vec<String>>,
}

fn results_json(results: Vec<ScoredDocument>) -> Value {
    let rows: Vec<Value> = results
        .into_iter()
        .map(|doc| {
            json!({
                "id": doc.db_id,
                "score": doc.score,
                "collection": doc.collection,
                "payload": Value::Object(doc.payload),
            })
        })
        .collect();
    json!({"status": "success", "results": rows})
}

/// Reject queries matching an injection pattern and audit the attempt.
async fn injection_check(state: &AppState, ctx: &UserContext, text: &str) -> Result<(), ApiError> {
    let Some(pattern) = state.injection.detect(text) else {
        return Ok(());
    };
    state
        .audit
        .log_event(
            "injection_detected",
            json!({
                "user": ctx.user_id,
                "query": text,
                "reason": format!("pattern_match:{pattern}"),
            }),
        )
        .await;
    Err(ApiError(Error::anomaly(format!("pattern_match:{pattern}"))))
}

/// Drop collections the caller may not read; an empty result short-circuits
/// to an empty success response upstream.
async fn readable_collections(
    state: &AppState,
    ctx: &UserContext,
    requested: Option<Vec<String>>,
) -> Vec<String> {
    let requested =
        requested.unwrap_or_else(|| vec![state.config.search.default_collection.clone()]);

    let mut allowed = Vec::with_capacity(requested.len());
    for collection in requested {
        let resource = Resource {
            collection: Some(collection.clone()),
            team: None,
        };
        let (ok, _) = state
            .access
            .check_permission(ctx, &resource, ResourceAction::Read);
        if ok {
            allowed.push(collection);
        }
    }
    allowed
}

async fn quota_check(
    state: &AppState,
    ctx: &UserContext,
    count: usize,
    audit_event: &str,
) -> Result<(), ApiError> {
    let tier = QuotaTier::from_role(ctx.role);
    let (ok, reason) = state.quota.consume(&ctx.user_id, count as u64, tier).await;
    if ok {
        return Ok(());
    }
    state
        .audit
        .log_event(
            audit_event,
            json!({"user": ctx.user_id, "attempt": count, "reason": reason}),
        )
        .await;
    Err(ApiError(Error::quota_exceeded(reason)))
}

/// `POST /query/hybrid`
pub async fn hybrid(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<HybridQueryRequest>,
) -> ApiResult<Json<Value>> {
    let ctx = &rc.user;

    injection_check(&state, ctx, &body.query_text).await?;
    require_permission(&state, ctx, &Resource::default(), ResourceAction::Search).await?;
    quota_check(&state, ctx, body.top_k, "quota_exceeded_search").await?;

    let collections = readable_collections(&state, ctx, body.collections).await;
    if collections.is_empty() {
        return Ok(Json(json!({"status": "success", "results": []})));
    }

    let strategy = match body.tuning_mode.as_deref() {
        Some("rrf") => Some(FusionStrategy::ReciprocalRank),
        Some("weighted") => Some(FusionStrategy::Weighted),
        _ => None,
    };

    let request = SearchRequest {
        query_text: body.query_text.clone(),
        top_k: body.top_k,
        collections: collections.clone(),
        tuning: SearchTuning {
            alpha: body.alpha,
            strategy,
            ..SearchTuning::default()
        },
    };

    let timer = state.metrics.search_latency.start_timer();
    let results = state.pipeline.query(&request, ctx).await.map_err(ApiError)?;
    timer.observe_duration();

    state
        .audit
        .log_event(
            "vector_search",
            json!({
                "user": ctx.user_id,
                "collections": collections,
                "result_count": results.len(),
                "correlation_id": rc.correlation_id,
            }),
        )
        .await;

    Ok(Json(results_json(results)))
}

/// `POST /query/keyword`: BM25 only, no rerank.
pub async fn keyword(
    State(state): State<AppState>,
    Extension(rc): Extension<RequestContext>,
    Json(body): Json<KeywordQueryRequest>,
) -> ApiResult<Json<Value>> {
    let ctx = &rc.user;

    injection_check(&state, ctx, &body.query).await?;
    require_permission(&state, ctx, &Resource::default(), ResourceAction::Search).await?;
    quota_check(&state, ctx, body.top_k, "quota_exceeded_keyword").await?;

    let collections = readable_collections(&state, ctx, body.collections).await;
    if collections.is_empty() {
        return Ok(Json(json!({"status": "success", "results": []})));
    }

    let results = state
        .pipeline
        .keyword(&body.query, body.top_k, collections, ctx)
        .await
        .map_err(ApiError)?;

    state
        .audit
        .log_event(
            "keyword_search",
            json!({"user": ctx.user_id, "result_count": results.len()}),
        )
        .await;

    Ok(Json(results_json(results)))
}
