//! Job engine and worker tests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use vortex_application::jobs::{ChannelDispatcher, JobEngine, JobWorker};
use vortex_application::search::PipelineConfig;
use vortex_domain::entities::{JobStatus, JobType};
use vortex_domain::ports::jobs::JobStore;
use vortex_domain::ports::vector_store::VectorStoreProvider;

use crate::test_support::{FailingDispatcher, MemJobStore, NullDispatcher, build_stack};

fn engine_with(
    store: Arc<MemJobStore>,
    dispatcher: Arc<dyn vortex_domain::ports::jobs::JobDispatcher>,
) -> JobEngine {
    JobEngine::new(store, dispatcher, 30)
}

#[tokio::test]
async fn bm25_retrain_enqueue_is_deduplicated() {
    let store = Arc::new(MemJobStore::default());
    let engine = engine_with(Arc::clone(&store), Arc::new(NullDispatcher));

    let first = engine
        .enqueue(JobType::Bm25Retrain, json!({"base_path": "./data"}))
        .await
        .expect("first enqueue");
    assert_eq!(first.status, JobStatus::Queued);

    let second = engine
        .enqueue(JobType::Bm25Retrain, json!({"base_path": "./data"}))
        .await
        .expect_err("second enqueue must be skipped");
    assert_eq!(second.code(), "JOB_SKIPPED");

    // Exactly one active row of the exclusive type.
    assert!(store.is_active(JobType::Bm25Retrain).await.unwrap());
    let (counts, _) = store.list(10).await.unwrap();
    assert_eq!(counts.queued, 1);
}

#[tokio::test]
async fn cooldown_skips_recent_retrain() {
    let store = Arc::new(MemJobStore::default());
    let engine = engine_with(Arc::clone(&store), Arc::new(NullDispatcher));

    let job = engine
        .enqueue(JobType::Bm25Retrain, json!({}))
        .await
        .expect("enqueue");
    store
        .update_status(job.id, JobStatus::Completed, Some("done"), Some(100.0))
        .await
        .unwrap();
    // Freshly completed → updated_at is now → inside the 30 minute cooldown.
    let err = engine
        .enqueue(JobType::Bm25Retrain, json!({}))
        .await
        .expect_err("cooldown applies");
    assert_eq!(err.code(), "JOB_SKIPPED");
}

#[tokio::test]
async fn non_exclusive_types_enqueue_concurrently() {
    let store = Arc::new(MemJobStore::default());
    let engine = engine_with(store, Arc::new(NullDispatcher));

    engine
        .enqueue(JobType::UpsertBatchDocs, json!({"collection": "c", "documents": []}))
        .await
        .expect("first");
    engine
        .enqueue(JobType::UpsertBatchDocs, json!({"collection": "c", "documents": []}))
        .await
        .expect("second");
}

#[tokio::test]
async fn dispatch_failure_marks_row_failed() {
    let store = Arc::new(MemJobStore::default());
    let engine = engine_with(Arc::clone(&store), Arc::new(FailingDispatcher));

    let err = engine
        .enqueue(JobType::CreateCollection, json!({"name": "c"}))
        .await
        .expect_err("dispatch fails");
    assert_eq!(err.code(), "JOB_DISPATCH_FAILURE");

    let (_, jobs) = store.list(10).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert!(jobs[0].message.as_deref().unwrap_or("").contains("Dispatch"));
}

async fn wait_for_terminal(store: &MemJobStore, id: uuid::Uuid) -> JobStatus {
    for _ in 0..100 {
        if let Ok(Some(job)) = store.get(id).await
            && job.status.is_terminal()
        {
            return job.status;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job never reached a terminal state");
}

#[tokio::test]
async fn worker_executes_create_collection_job() {
    let stack = build_stack(PipelineConfig::default());
    let store = Arc::new(MemJobStore::default());
    let (dispatcher, rx) = ChannelDispatcher::new(8);
    let engine = JobEngine::new(
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::new(dispatcher),
        0,
    );

    let worker = JobWorker::new(
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::clone(&stack.store) as Arc<dyn VectorStoreProvider>,
        Arc::clone(&stack.ingest),
        Arc::clone(&stack.sparse),
    );
    tokio::spawn(worker.run(rx));

    let job = engine
        .enqueue(
            JobType::CreateCollection,
            json!({"name": "made_by_worker", "vector_size": 64}),
        )
        .await
        .expect("enqueue");

    let status = wait_for_terminal(&store, job.id).await;
    assert_eq!(status, JobStatus::Completed);
    assert!(
        stack
            .store
            .collection_exists("made_by_worker")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn worker_executes_ingest_job_with_progress() {
    let stack = build_stack(PipelineConfig::default());
    let store = Arc::new(MemJobStore::default());
    let (dispatcher, rx) = ChannelDispatcher::new(8);
    let engine = JobEngine::new(
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::new(dispatcher),
        0,
    );

    let worker = JobWorker::new(
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::clone(&stack.store) as Arc<dyn VectorStoreProvider>,
        Arc::clone(&stack.ingest),
        Arc::clone(&stack.sparse),
    );
    tokio::spawn(worker.run(rx));

    let documents: Vec<serde_json::Value> = (0..5)
        .map(|i| json!({"id": format!("d{i}"), "content": format!("text {i}"), "tenant_id": "public"}))
        .collect();
    let job = engine
        .enqueue(
            JobType::UpsertBatchDocs,
            json!({"collection": "worker_docs", "documents": documents}),
        )
        .await
        .expect("enqueue");

    let status = wait_for_terminal(&store, job.id).await;
    assert_eq!(status, JobStatus::Completed);

    let finished = store.get(job.id).await.unwrap().unwrap();
    assert!((finished.progress - 100.0).abs() < f64::EPSILON);
    assert_eq!(stack.store.count("worker_docs").await.unwrap(), 5);
}

#[tokio::test]
async fn worker_marks_bad_payload_failed() {
    let stack = build_stack(PipelineConfig::default());
    let store = Arc::new(MemJobStore::default());
    let (dispatcher, rx) = ChannelDispatcher::new(8);
    let engine = JobEngine::new(
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::new(dispatcher),
        0,
    );

    let worker = JobWorker::new(
        Arc::clone(&store) as Arc<dyn JobStore>,
        Arc::clone(&stack.store) as Arc<dyn VectorStoreProvider>,
        Arc::clone(&stack.ingest),
        Arc::clone(&stack.sparse),
    );
    tokio::spawn(worker.run(rx));

    // Missing the required `name` field.
    let job = engine
        .enqueue(JobType::CreateCollection, json!({}))
        .await
        .expect("enqueue");

    let status = wait_for_terminal(&store, job.id).await;
    assert_eq!(status, JobStatus::Failed);
}
