//! SQLite job store tests.

use serde_json::json;

use vortex_domain::entities::{Job, JobStatus, JobType};
use vortex_domain::ports::jobs::JobStore;
use vortex_infrastructure::db::SqliteJobStore;

async fn open_store() -> (SqliteJobStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteJobStore::open(&dir.path().join("jobs.db"))
        .await
        .expect("open");
    (store, dir)
}

fn queued_job(job_type: JobType, created_at: f64) -> Job {
    Job::new(job_type, json!({"collection": "c"}), created_at)
}

#[tokio::test]
async fn insert_and_get_round_trip() {
    let (store, _dir) = open_store().await;
    let job = queued_job(JobType::UpsertBatchDocs, 100.0);
    store.insert(&job).await.expect("insert");

    let fetched = store.get(job.id).await.expect("get").expect("present");
    assert_eq!(fetched.id, job.id);
    assert_eq!(fetched.job_type, JobType::UpsertBatchDocs);
    assert_eq!(fetched.status, JobStatus::Queued);
    assert_eq!(fetched.payload, json!({"collection": "c"}));
}

#[tokio::test]
async fn missing_job_is_none() {
    let (store, _dir) = open_store().await;
    assert!(store.get(uuid::Uuid::new_v4()).await.expect("get").is_none());
}

#[tokio::test]
async fn update_status_merges_message_and_progress() {
    let (store, _dir) = open_store().await;
    let job = queued_job(JobType::BatchUpsert, 100.0);
    store.insert(&job).await.expect("insert");

    store
        .update_status(job.id, JobStatus::Running, Some("working"), Some(40.0))
        .await
        .expect("update");
    // COALESCE keeps the previous message when none is given.
    store
        .update_status(job.id, JobStatus::Running, None, Some(80.0))
        .await
        .expect("update");

    let fetched = store.get(job.id).await.expect("get").expect("present");
    assert_eq!(fetched.status, JobStatus::Running);
    assert_eq!(fetched.message.as_deref(), Some("working"));
    assert!((fetched.progress - 80.0).abs() < f64::EPSILON);
    assert!(fetched.updated_at > 0.0);
}

#[tokio::test]
async fn list_counts_by_status() {
    let (store, _dir) = open_store().await;
    for i in 0..3 {
        store
            .insert(&queued_job(JobType::UpsertBatchDocs, 100.0 + f64::from(i)))
            .await
            .expect("insert");
    }
    let failed = queued_job(JobType::CreateSnapshot, 200.0);
    store.insert(&failed).await.expect("insert");
    store
        .update_status(failed.id, JobStatus::Failed, Some("boom"), None)
        .await
        .expect("update");

    let (counts, jobs) = store.list(10).await.expect("list");
    assert_eq!(counts.queued, 3);
    assert_eq!(counts.failed, 1);
    assert_eq!(jobs.len(), 4);
    // Most recent first.
    assert_eq!(jobs[0].id, failed.id);
}

#[tokio::test]
async fn list_respects_limit() {
    let (store, _dir) = open_store().await;
    for i in 0..5 {
        store
            .insert(&queued_job(JobType::UpsertBatchDocs, f64::from(i)))
            .await
            .expect("insert");
    }
    let (_, jobs) = store.list(2).await.expect("list");
    assert_eq!(jobs.len(), 2);
}

#[tokio::test]
async fn exclusive_type_activity_tracking() {
    let (store, _dir) = open_store().await;
    assert!(!store.is_active(JobType::Bm25Retrain).await.expect("check"));

    let job = queued_job(JobType::Bm25Retrain, 100.0);
    store.insert(&job).await.expect("insert");
    assert!(store.is_active(JobType::Bm25Retrain).await.expect("check"));

    store
        .update_status(job.id, JobStatus::Running, None, None)
        .await
        .expect("update");
    assert!(store.is_active(JobType::Bm25Retrain).await.expect("check"));

    store
        .update_status(job.id, JobStatus::Completed, Some("done"), Some(100.0))
        .await
        .expect("update");
    assert!(!store.is_active(JobType::Bm25Retrain).await.expect("check"));

    let last = store
        .last_completed_at(JobType::Bm25Retrain)
        .await
        .expect("query");
    assert!(last.is_some());
}

#[tokio::test]
async fn rows_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("jobs.db");
    let job = queued_job(JobType::CreateCollection, 100.0);
    {
        let store = SqliteJobStore::open(&path).await.expect("open");
        store.insert(&job).await.expect("insert");
    }
    let store = SqliteJobStore::open(&path).await.expect("reopen");
    let fetched = store.get(job.id).await.expect("get");
    assert!(fetched.is_some());
}
