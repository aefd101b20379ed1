//! End-to-end hybrid search scenarios over the in-memory stack.

use serde_json::json;

use vortex_application::search::{PipelineConfig, SearchRequest};
use vortex_domain::entities::Role;
use vortex_domain::value_objects::{SearchTuning, UserContext};

use crate::test_support::{build_stack, user};

fn request(query: &str, top_k: usize) -> SearchRequest {
    SearchRequest {
        query_text: query.to_owned(),
        top_k,
        collections: vec!["docs".to_owned()],
        tuning: SearchTuning::default(),
    }
}

async fn seed_tenancy_docs(stack: &crate::test_support::TestStack) {
    let docs = vec![
        json!({"id": "pub", "content": "public info", "tenant_id": "public", "access_level": 1}),
        json!({"id": "priv", "content": "secret", "tenant_id": "user_a", "access_level": 1}),
    ];
    stack
        .ingest
        .upsert_documents("docs", &docs, None)
        .await
        .expect("seed");
}

#[tokio::test]
async fn guest_sees_public_but_never_private() {
    let stack = build_stack(PipelineConfig::default());
    seed_tenancy_docs(&stack).await;

    let results = stack
        .pipeline
        .query(&request("info secret", 10), &UserContext::guest())
        .await
        .expect("query");

    let ids: Vec<&str> = results
        .iter()
        .filter_map(|r| r.payload.get("id").and_then(|v| v.as_str()))
        .collect();
    assert!(ids.contains(&"pub"), "guest should find the public doc");
    assert!(!ids.contains(&"priv"), "guest must never see a private doc");
}

#[tokio::test]
async fn owner_recalls_decrypted_content() {
    let stack = build_stack(PipelineConfig::default());
    seed_tenancy_docs(&stack).await;

    let owner = user("user_a", Role::Engineer);
    let results = stack
        .pipeline
        .query(&request("secret", 10), &owner)
        .await
        .expect("query");

    let private: Vec<_> = results
        .iter()
        .filter(|r| r.payload.get("id") == Some(&json!("priv")))
        .collect();
    assert_eq!(private.len(), 1, "owner should find their private doc");
    assert_eq!(
        private[0].payload.get("content"),
        Some(&json!("secret")),
        "owner receives decrypted plaintext"
    );
    assert_eq!(
        private[0].payload.get("content_encrypted"),
        Some(&json!(false))
    );
}

#[tokio::test]
async fn content_is_encrypted_at_rest() {
    let stack = build_stack(PipelineConfig::default());
    seed_tenancy_docs(&stack).await;

    // Raw store access: the private chunk must not expose its plaintext.
    use vortex_domain::ports::vector_store::VectorStoreProvider;
    use vortex_domain::value_objects::Filter;
    let filter = Filter::new().must_match("id", "priv");
    let (hits, _) = stack
        .store
        .scroll("docs", Some(&filter), 10, None)
        .await
        .expect("scroll");

    assert!(!hits.is_empty());
    for hit in hits {
        assert_eq!(hit.payload["content_encrypted"], json!(true));
        let stored = hit.payload["content"].as_str().unwrap_or_default();
        assert_ne!(stored, "secret");
    }
}

#[tokio::test]
async fn admin_is_blind_to_private_tenants() {
    let stack = build_stack(PipelineConfig::default());
    seed_tenancy_docs(&stack).await;

    let admin = user("root", Role::Admin);
    let results = stack
        .pipeline
        .query(&request("secret info", 10), &admin)
        .await
        .expect("query");

    let ids: Vec<&str> = results
        .iter()
        .filter_map(|r| r.payload.get("id").and_then(|v| v.as_str()))
        .collect();
    assert!(ids.contains(&"pub"));
    assert!(!ids.contains(&"priv"), "admin is scoped to the public tenant");
}

#[tokio::test]
async fn semantic_cache_never_leaks_across_users() {
    let stack = build_stack(PipelineConfig::default());
    seed_tenancy_docs(&stack).await;

    let owner = user("user_a", Role::Engineer);
    let results_a = stack
        .pipeline
        .query(&request("secret", 10), &owner)
        .await
        .expect("owner query");
    assert!(
        results_a
            .iter()
            .any(|r| r.payload.get("id") == Some(&json!("priv")))
    );

    // Same query text from another user: the cache key and filter are
    // user-scoped, and results are scrubbed on read regardless.
    let other = user("user_b", Role::Engineer);
    let results_b = stack
        .pipeline
        .query(&request("secret", 10), &other)
        .await
        .expect("other query");
    assert!(
        !results_b
            .iter()
            .any(|r| r.payload.get("id") == Some(&json!("priv"))),
        "user_b must not see user_a's private doc, cached or not"
    );
}

#[tokio::test]
async fn access_level_ceiling_is_enforced() {
    let stack = build_stack(PipelineConfig::default());
    let docs = vec![
        json!({"id": "open", "content": "quarterly report summary", "tenant_id": "public", "access_level": 1}),
        json!({"id": "sealed", "content": "quarterly report restricted", "tenant_id": "public", "access_level": 3}),
    ];
    stack
        .ingest
        .upsert_documents("docs", &docs, None)
        .await
        .expect("seed");

    let viewer = user("v", Role::Viewer);
    let results = stack
        .pipeline
        .query(&request("quarterly report", 10), &viewer)
        .await
        .expect("query");
    let ids: Vec<&str> = results
        .iter()
        .filter_map(|r| r.payload.get("id").and_then(|v| v.as_str()))
        .collect();
    assert!(ids.contains(&"open"));
    assert!(!ids.contains(&"sealed"), "level 3 is above the viewer ceiling");
}

#[tokio::test]
async fn top_k_zero_returns_empty() {
    let stack = build_stack(PipelineConfig::default());
    seed_tenancy_docs(&stack).await;
    let results = stack
        .pipeline
        .query(&request("info", 0), &UserContext::guest())
        .await
        .expect("query");
    assert!(results.is_empty());
}

#[tokio::test]
async fn oversized_top_k_is_rejected() {
    let stack = build_stack(PipelineConfig::default());
    let err = stack
        .pipeline
        .query(&request("info", 1000), &UserContext::guest())
        .await
        .expect_err("should reject");
    assert_eq!(err.code(), "INVALID_REQUEST");
}

#[tokio::test]
async fn empty_store_yields_empty_success() {
    let stack = build_stack(PipelineConfig::default());
    // Collection does not even exist: per-collection failures degrade to an
    // empty contribution only when at least one succeeds, so create it.
    use vortex_domain::ports::vector_store::{CollectionSpec, VectorStoreProvider};
    stack
        .store
        .create_collection("docs", &CollectionSpec::hybrid(64))
        .await
        .expect("create");

    let results = stack
        .pipeline
        .query(&request("anything", 5), &UserContext::guest())
        .await
        .expect("query");
    assert!(results.is_empty());
}

#[tokio::test]
async fn keyword_search_works_once_bm25_is_fitted() {
    let stack = build_stack(PipelineConfig::default());
    let docs = vec![
        json!({"id": "auth", "content": "authenticate credentials securely", "tenant_id": "public", "access_level": 1}),
        json!({"id": "store", "content": "compress archives for storage", "tenant_id": "public", "access_level": 1}),
    ];
    stack
        .ingest
        .upsert_documents("docs", &docs, None)
        .await
        .expect("seed");

    use vortex_domain::ports::encoders::SparseEncoder;
    stack
        .sparse
        .fit(&[
            "authenticate credentials securely".to_owned(),
            "compress archives for storage".to_owned(),
        ])
        .expect("fit");

    // Re-ingest so the stored sparse vectors reflect the fitted model.
    stack
        .ingest
        .upsert_documents("docs", &docs, None)
        .await
        .expect("re-seed");

    let results = stack
        .pipeline
        .keyword(
            "authenticate credentials",
            5,
            vec!["docs".to_owned()],
            &UserContext::guest(),
        )
        .await
        .expect("keyword");

    assert!(!results.is_empty());
    assert_eq!(results[0].payload.get("id"), Some(&json!("auth")));
}

#[tokio::test]
async fn rrf_tuning_mode_still_ranks_relevant_docs_first() {
    let stack = build_stack(PipelineConfig::default());
    let docs = vec![
        json!({"id": "rust", "content": "rust ownership borrowing lifetimes", "tenant_id": "public", "access_level": 1}),
        json!({"id": "cooking", "content": "pasta tomato basil recipe", "tenant_id": "public", "access_level": 1}),
    ];
    stack
        .ingest
        .upsert_documents("docs", &docs, None)
        .await
        .expect("seed");

    let mut req = request("rust ownership", 5);
    req.tuning.strategy = Some(vortex_domain::value_objects::FusionStrategy::ReciprocalRank);
    let results = stack
        .pipeline
        .query(&req, &UserContext::guest())
        .await
        .expect("query");

    assert!(!results.is_empty());
    assert_eq!(results[0].payload.get("id"), Some(&json!("rust")));
}
