//! Ingestion pipeline tests.

use serde_json::json;

use vortex_application::search::PipelineConfig;
use vortex_domain::ports::vector_store::VectorStoreProvider;

use crate::test_support::build_stack;

#[tokio::test]
async fn reingesting_identical_batch_is_a_noop() {
    let stack = build_stack(PipelineConfig::default());
    let docs = vec![
        json!({"id": "a", "content": "first document body", "tenant_id": "public"}),
        json!({"id": "b", "content": "second document body", "tenant_id": "public"}),
        json!({"id": "c", "content": "third document body", "tenant_id": "public"}),
    ];

    stack
        .ingest
        .upsert_documents("docs", &docs, None)
        .await
        .expect("first ingest");
    let first = stack.store.count("docs").await.expect("count");

    stack
        .ingest
        .upsert_documents("docs", &docs, None)
        .await
        .expect("second ingest");
    let second = stack.store.count("docs").await.expect("count");

    assert_eq!(first, second, "identical re-ingest must add zero points");
}

#[tokio::test]
async fn empty_batch_is_accepted() {
    let stack = build_stack(PipelineConfig::default());
    let written = stack
        .ingest
        .upsert_documents("docs", &[], None)
        .await
        .expect("empty batch");
    assert_eq!(written, 0);
}

#[tokio::test]
async fn collection_is_auto_created_on_first_batch() {
    let stack = build_stack(PipelineConfig::default());
    assert!(!stack.store.collection_exists("fresh").await.unwrap());

    stack
        .ingest
        .upsert_documents(
            "fresh",
            &[json!({"content": "hello world", "tenant_id": "public"})],
            None,
        )
        .await
        .expect("ingest");
    assert!(stack.store.collection_exists("fresh").await.unwrap());
}

#[tokio::test]
async fn chunks_share_parent_identity() {
    let stack = build_stack(PipelineConfig::default());
    let long_text = "sentence about storage systems. ".repeat(120);
    stack
        .ingest
        .upsert_documents(
            "docs",
            &[json!({"id": "big", "content": long_text, "tenant_id": "team_x", "access_level": 2})],
            None,
        )
        .await
        .expect("ingest");

    let (hits, _) = stack.store.scroll("docs", None, 100, None).await.unwrap();
    assert!(hits.len() > 1, "long document should split into chunks");

    let db_ids: Vec<&str> = hits
        .iter()
        .filter_map(|h| h.payload.get("db_id").and_then(|v| v.as_str()))
        .collect();
    let first = db_ids[0];
    assert!(db_ids.iter().all(|id| *id == first));
    for hit in &hits {
        assert_eq!(hit.payload["parent_id"], hit.payload["db_id"]);
        assert_eq!(hit.payload["tenant_id"], json!("team_x"));
        assert_eq!(hit.payload["access_level"], json!(2));
        assert_eq!(hit.payload["total_chunks"], json!(hits.len()));
    }
}

#[tokio::test]
async fn progress_is_monotonic_and_capped() {
    let stack = build_stack(PipelineConfig::default());
    let docs: Vec<serde_json::Value> = (0..250)
        .map(|i| json!({"id": format!("d{i}"), "content": format!("document number {i}"), "tenant_id": "public"}))
        .collect();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    stack
        .ingest
        .upsert_documents("docs", &docs, Some(&tx))
        .await
        .expect("ingest");
    drop(tx);

    let mut updates = Vec::new();
    while let Some(p) = rx.recv().await {
        updates.push(p);
    }
    assert!(!updates.is_empty());
    for pair in updates.windows(2) {
        assert!(pair[1] >= pair[0], "progress must be monotonic");
    }
    assert!(updates.iter().all(|p| *p <= 99.0), "progress caps at 99");
}

#[tokio::test]
async fn update_payload_merges_across_chunks() {
    let stack = build_stack(PipelineConfig::default());
    stack
        .ingest
        .upsert_documents(
            "docs",
            &[json!({"id": "doc", "content": "payload update target", "tenant_id": "public"})],
            None,
        )
        .await
        .expect("ingest");

    let (hits, _) = stack.store.scroll("docs", None, 10, None).await.unwrap();
    let db_id = hits[0].payload["db_id"].as_str().unwrap().to_owned();

    let mut patch = vortex_domain::value_objects::Payload::new();
    patch.insert("verified".to_owned(), json!(true));
    let updated = stack
        .ingest
        .update_payload("docs", &db_id, &patch, true)
        .await
        .expect("update");
    assert!(updated >= 1);

    let (hits, _) = stack.store.scroll("docs", None, 10, None).await.unwrap();
    assert_eq!(hits[0].payload["verified"], json!(true));
    // Merge keeps the original fields.
    assert_eq!(hits[0].payload["db_id"], json!(db_id));
}

#[tokio::test]
async fn update_payload_on_missing_document_errors() {
    let stack = build_stack(PipelineConfig::default());
    stack
        .ingest
        .upsert_documents(
            "docs",
            &[json!({"content": "filler", "tenant_id": "public"})],
            None,
        )
        .await
        .expect("ingest");

    let patch = vortex_domain::value_objects::Payload::new();
    let err = stack
        .ingest
        .update_payload("docs", "no-such-id", &patch, true)
        .await
        .expect_err("missing doc");
    assert_eq!(err.code(), "DOCUMENT_NOT_FOUND");
}

#[tokio::test]
async fn delete_document_removes_every_chunk() {
    let stack = build_stack(PipelineConfig::default());
    let long_text = "deletable sentence. ".repeat(150);
    stack
        .ingest
        .upsert_documents(
            "docs",
            &[
                json!({"id": "gone", "content": long_text, "tenant_id": "public"}),
                json!({"id": "kept", "content": "a survivor", "tenant_id": "public"}),
            ],
            None,
        )
        .await
        .expect("ingest");

    let (hits, _) = stack.store.scroll("docs", None, 100, None).await.unwrap();
    let doomed_id = hits
        .iter()
        .find(|h| h.payload.get("id") == Some(&json!("gone")))
        .and_then(|h| h.payload.get("db_id"))
        .and_then(|v| v.as_str())
        .unwrap()
        .to_owned();

    stack
        .ingest
        .delete_document("docs", &doomed_id)
        .await
        .expect("delete");

    let (hits, _) = stack.store.scroll("docs", None, 100, None).await.unwrap();
    assert!(hits.iter().all(|h| h.payload.get("id") != Some(&json!("gone"))));
    assert!(hits.iter().any(|h| h.payload.get("id") == Some(&json!("kept"))));
}

#[tokio::test]
async fn folder_ingest_reads_json_and_jsonl() {
    let stack = build_stack(PipelineConfig::default());
    let data_dir = tempfile::tempdir().expect("tempdir");

    std::fs::write(
        data_dir.path().join("one.json"),
        serde_json::to_vec(&json!([
            {"id": "j1", "content": "json array doc one", "tenant_id": "public"},
            {"id": "j2", "content": "json array doc two", "tenant_id": "public"}
        ]))
        .unwrap(),
    )
    .unwrap();
    std::fs::write(
        data_dir.path().join("two.jsonl"),
        "{\"id\": \"l1\", \"content\": \"jsonl doc\", \"tenant_id\": \"public\"}\n",
    )
    .unwrap();

    let written = stack
        .ingest
        .upsert_folder(data_dir.path(), "docs", 10, None)
        .await
        .expect("folder ingest");
    assert_eq!(written, 3);
    assert_eq!(stack.store.count("docs").await.unwrap(), 3);
}
