//! Tests for the in-memory vector store.

use serde_json::json;
use uuid::Uuid;

use vortex_domain::identity::point_id;
use vortex_domain::ports::vector_store::{CollectionSpec, VectorStoreProvider};
use vortex_domain::value_objects::{
    Filter, NamedVectors, Payload, PointRecord, QueryVector, SparseVector, VectorKind,
};
use vortex_providers::vector_store::InMemoryVectorStore;

fn store() -> (InMemoryVectorStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    (InMemoryVectorStore::new(dir.path()), dir)
}

fn payload(fields: serde_json::Value) -> Payload {
    match fields {
        serde_json::Value::Object(map) => map,
        _ => Payload::new(),
    }
}

fn point(db_id: &str, index: usize, dense: Vec<f32>, extra: serde_json::Value) -> PointRecord {
    let mut p = payload(extra);
    p.insert("db_id".to_owned(), json!(db_id));
    PointRecord {
        id: point_id(db_id, index),
        vectors: NamedVectors {
            dense,
            sparse: SparseVector::default(),
            splade: SparseVector::default(),
        },
        payload: p,
    }
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();

    let points = vec![
        point("a", 0, vec![1.0, 0.0], json!({})),
        point("b", 0, vec![0.0, 1.0], json!({})),
    ];
    store.upsert("c", points.clone()).await.unwrap();
    let first = store.count("c").await.unwrap();
    store.upsert("c", points).await.unwrap();
    let second = store.count("c").await.unwrap();

    assert_eq!(first, 2);
    assert_eq!(first, second);
}

#[tokio::test]
async fn dense_search_orders_by_cosine() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();
    store
        .upsert(
            "c",
            vec![
                point("close", 0, vec![1.0, 0.1], json!({})),
                point("far", 0, vec![0.0, 1.0], json!({})),
            ],
        )
        .await
        .unwrap();

    let hits = store
        .search(
            "c",
            VectorKind::Dense,
            QueryVector::Dense(vec![1.0, 0.0]),
            10,
            None,
            None,
        )
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].payload["db_id"], json!("close"));
    assert!(hits[0].score > hits[1].score);
}

#[tokio::test]
async fn filter_restricts_hits() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();
    store
        .upsert(
            "c",
            vec![
                point("pub", 0, vec![1.0, 0.0], json!({"tenant_id": "public"})),
                point("priv", 0, vec![1.0, 0.0], json!({"tenant_id": "user_a"})),
            ],
        )
        .await
        .unwrap();

    let filter = Filter::new().must_match("tenant_id", "public");
    let hits = store
        .search(
            "c",
            VectorKind::Dense,
            QueryVector::Dense(vec![1.0, 0.0]),
            10,
            Some(&filter),
            None,
        )
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload["db_id"], json!("pub"));
}

#[tokio::test]
async fn score_threshold_prunes_weak_hits() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();
    store
        .upsert(
            "c",
            vec![
                point("strong", 0, vec![1.0, 0.0], json!({})),
                point("weak", 0, vec![0.0, 1.0], json!({})),
            ],
        )
        .await
        .unwrap();

    let hits = store
        .search(
            "c",
            VectorKind::Dense,
            QueryVector::Dense(vec![1.0, 0.0]),
            10,
            None,
            Some(0.9),
        )
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload["db_id"], json!("strong"));
}

#[tokio::test]
async fn sparse_search_uses_dot_product() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();

    let mut matching = point("match", 0, vec![0.0, 0.0], json!({}));
    matching.vectors.sparse = SparseVector::from_pairs(vec![(1, 2.0), (5, 1.0)]);
    let mut other = point("other", 0, vec![0.0, 0.0], json!({}));
    other.vectors.sparse = SparseVector::from_pairs(vec![(9, 3.0)]);
    store.upsert("c", vec![matching, other]).await.unwrap();

    let query = SparseVector::from_pairs(vec![(1, 1.0)]);
    let hits = store
        .search(
            "c",
            VectorKind::Sparse,
            QueryVector::Sparse(query),
            10,
            None,
            Some(0.1),
        )
        .await
        .unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload["db_id"], json!("match"));
}

#[tokio::test]
async fn scroll_pages_through_everything() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();
    let points: Vec<PointRecord> = (0..25)
        .map(|i| point(&format!("doc{i:02}"), 0, vec![1.0, 0.0], json!({})))
        .collect();
    store.upsert("c", points).await.unwrap();

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let (page, next) = store.scroll("c", None, 10, cursor).await.unwrap();
        seen.extend(page.into_iter().map(|h| h.id));
        match next {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }

    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 25);
}

#[tokio::test]
async fn delete_by_filter_removes_all_chunks() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();
    store
        .upsert(
            "c",
            vec![
                point("doomed", 0, vec![1.0, 0.0], json!({})),
                point("doomed", 1, vec![1.0, 0.0], json!({})),
                point("kept", 0, vec![1.0, 0.0], json!({})),
            ],
        )
        .await
        .unwrap();

    let filter = Filter::new().must_match("db_id", "doomed");
    let deleted = store.delete_by_filter("c", &filter).await.unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(store.count("c").await.unwrap(), 1);
}

#[tokio::test]
async fn retrieve_fetches_by_point_id() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();
    store
        .upsert("c", vec![point("a", 0, vec![1.0, 0.0], json!({}))])
        .await
        .unwrap();

    let hits = store.retrieve("c", &[point_id("a", 0)]).await.unwrap();
    assert_eq!(hits.len(), 1);

    let missing = store.retrieve("c", &[Uuid::new_v4()]).await.unwrap();
    assert!(missing.is_empty());
}

#[tokio::test]
async fn snapshot_round_trip_restores_points() {
    let (store, _dir) = store();
    store
        .create_collection("c", &CollectionSpec::hybrid(2))
        .await
        .unwrap();
    store
        .upsert("c", vec![point("a", 0, vec![1.0, 0.0], json!({}))])
        .await
        .unwrap();

    let info = store.create_snapshot("c").await.unwrap();
    store.delete_collection("c").await.unwrap();
    assert!(!store.collection_exists("c").await.unwrap());

    store.restore_snapshot(&info.path).await.unwrap();
    assert_eq!(store.count("c").await.unwrap(), 1);

    let listed = store.list_snapshots().await.unwrap();
    assert!(listed.iter().any(|s| s.name == info.name));

    store.delete_snapshot(&info.path).await.unwrap();
    assert!(store.list_snapshots().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_collection_errors() {
    let (store, _dir) = store();
    assert!(store.count("missing").await.is_err());
    assert!(store.delete_collection("missing").await.is_err());
}
