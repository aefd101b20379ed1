//! Tenancy filtering and result scrubbing.
//!
//! The tenancy filter scopes every backend query; the scrub runs on every
//! result list right before it leaves the pipeline; including semantic
//! cache hits, which are never trusted to encode authorization.

use std::sync::Arc;

use serde_json::Value;

use vortex_domain::constants::tenancy::PUBLIC_TENANT;
use vortex_domain::ports::crypto::ContentCipher;
use vortex_domain::value_objects::{Filter, ScoredDocument, UserContext};

/// Highest access level expressible in the equality-based filter grammar.
const MAX_FILTERABLE_LEVEL: i64 = 10;

/// Build the per-collection tenancy filter for a caller.
///
/// Non-admin callers see their own tenant plus `"public"`; admins are scoped
/// to `"public"` only. The access-level ceiling becomes an any-of condition
/// over the admissible levels (admins skip it).
#[must_use]
pub fn tenancy_filter(ctx: &UserContext) -> Filter {
    let mut filter = Filter::new();

    if ctx.is_admin() {
        filter = filter.must_match("tenant_id", PUBLIC_TENANT);
    } else {
        let tenants = vec![
            Value::String(ctx.user_id.clone()),
            Value::String(PUBLIC_TENANT.to_owned()),
        ];
        filter = filter.must_match_any("tenant_id", tenants);

        let ceiling = ctx.access_ceiling().min(MAX_FILTERABLE_LEVEL);
        let levels: Vec<Value> = (1..=ceiling).map(Value::from).collect();
        filter = filter.must_match_any("access_level", levels);
    }

    filter
}

/// True when a document with the given tenancy attributes is visible to the
/// caller.
#[must_use]
pub fn is_visible_to(ctx: &UserContext, tenant_id: &str, access_level: i64) -> bool {
    if access_level > ctx.access_ceiling() {
        return false;
    }
    if tenant_id == PUBLIC_TENANT {
        return true;
    }
    // Admins are deliberately blind to private tenants.
    !ctx.is_admin() && ctx.user_id == tenant_id
}

/// Scrub a result list for the caller: drop invisible documents and decrypt
/// content only for the owning tenant. Everyone else keeps the ciphertext
/// unchanged.
#[must_use]
pub fn scrub_results(
    results: Vec<ScoredDocument>,
    ctx: &UserContext,
    cipher: &Arc<dyn ContentCipher>,
) -> Vec<ScoredDocument> {
    results
        .into_iter()
        .filter_map(|mut doc| {
            let tenant_id = doc
                .payload
                .get("tenant_id")
                .and_then(Value::as_str)
                .unwrap_or(PUBLIC_TENANT)
                .to_owned();
            let access_level = doc
                .payload
                .get("access_level")
                .and_then(Value::as_i64)
                .unwrap_or(1);

            if !is_visible_to(ctx, &tenant_id, access_level) {
                return None;
            }

            let encrypted = doc
                .payload
                .get("content_encrypted")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            if encrypted && ctx.user_id == tenant_id {
                if let Some(Value::String(ciphertext)) = doc.payload.get("content").cloned() {
                    match cipher.decrypt(&tenant_id, &ciphertext) {
                        Ok(plaintext) => {
                            doc.payload
                                .insert("content".to_owned(), Value::String(plaintext));
                            doc.payload
                                .insert("content_encrypted".to_owned(), Value::Bool(false));
                        }
                        Err(e) => {
                            tracing::warn!(db_id = %doc.db_id, error = %e, "content decryption failed; returning ciphertext");
                        }
                    }
                }
            }

            Some(doc)
        })
        .collect()
}
