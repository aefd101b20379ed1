//! Application state composition.
//!
//! Everything is constructed once at startup and injected into handlers
//! through this state; no module-level singletons.

use std::path::PathBuf;
use std::sync::Arc;

use vortex_application::ingest::{IngestConfig, IngestService};
use vortex_application::jobs::{ChannelDispatcher, JobEngine, JobWorker};
use vortex_application::search::{HybridSearchPipeline, PipelineConfig};
use vortex_application::security::{AccessControl, InjectionDetector, VectorAnomalyDetector};
use vortex_application::users::UserService;
use vortex_domain::error::Result;
use vortex_domain::ports::audit::AuditSink;
use vortex_domain::ports::crypto::ContentCipher;
use vortex_domain::ports::encoders::{CrossEncoder, SparseEncoder};
use vortex_domain::ports::jobs::JobStore;
use vortex_domain::ports::limits::{QuotaCounter, RateLimiter};
use vortex_domain::ports::vector_store::VectorStoreProvider;
use vortex_infrastructure::audit::{AuditLog, AuditLogSettings};
use vortex_infrastructure::auth::TokenService;
use vortex_infrastructure::config::{AppConfig, EngineKind};
use vortex_infrastructure::crypto::TenantEncryption;
use vortex_infrastructure::db::{SqliteJobStore, SqliteUserStore};
use vortex_infrastructure::metrics::Metrics;
use vortex_providers::encoders::{
    Bm25Encoder, HttpCrossEncoder, HttpDenseEncoder, HttpSpladeEncoder, SpladeSettings,
};
use vortex_providers::limits::{
    InMemoryQuotaCounter, InMemoryRateLimiter, RedisQuotaCounter, RedisRateLimiter,
};
use vortex_providers::vector_store::{InMemoryVectorStore, QdrantConfig, QdrantVectorStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Vector store backend
    pub store: Arc<dyn VectorStoreProvider>,
    /// Hybrid search pipeline
    pub pipeline: Arc<HybridSearchPipeline>,
    /// Ingestion service
    pub ingest: Arc<IngestService>,
    /// Job engine
    pub jobs: Arc<JobEngine>,
    /// Job table (for metrics and polling)
    pub job_store: Arc<dyn JobStore>,
    /// User management
    pub users: Arc<UserService>,
    /// Token issuance and validation
    pub tokens: Arc<TokenService>,
    /// Audit sink
    pub audit: Arc<dyn AuditSink>,
    /// RBAC + ABAC evaluator
    pub access: Arc<AccessControl>,
    /// Injection pattern matcher
    pub injection: Arc<InjectionDetector>,
    /// Request rate limiter
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Daily export quota
    pub quota: Arc<dyn QuotaCounter>,
    /// Metrics registry
    pub metrics: Arc<Metrics>,
}

/// With no fitted BM25 model, try an initial training pass over `./data`.
/// An empty or absent data directory leaves the encoder unfitted, which is a
/// legal startup condition (dense and SPLADE still function).
fn cold_start_bm25(sparse: &Arc<dyn SparseEncoder>) {
    if sparse.is_ready() {
        return;
    }
    let data_dir = std::path::Path::new("./data");
    if !data_dir.exists() {
        tracing::warn!("no BM25 model and no ./data directory; BM25 stays uninitialized");
        return;
    }
    match vortex_application::jobs::collect_corpus(data_dir) {
        Ok(corpus) => match sparse.fit(&corpus) {
            Ok(()) => tracing::info!(docs = corpus.len(), "initial BM25 training complete"),
            Err(e) => tracing::error!(error = %e, "initial BM25 training failed"),
        },
        Err(e) => tracing::warn!(error = %e, "no corpus for initial BM25 training"),
    }
}

/// Build the application state and spawn the background workers (job worker,
/// audit batcher).
///
/// # Errors
/// Fails when a durable store cannot be opened or an invariant of the
/// configuration is violated.
pub async fn bootstrap(config: AppConfig) -> Result<AppState> {
    let config = Arc::new(config);

    let store: Arc<dyn VectorStoreProvider> = match config.engine.kind {
        EngineKind::Qdrant => Arc::new(QdrantVectorStore::new(QdrantConfig::new(
            config.engine.qdrant_url.clone(),
            config.engine.qdrant_api_key.clone(),
        ))?),
        EngineKind::Memory => Arc::new(InMemoryVectorStore::new(&config.paths.snapshot_dir)),
    };

    let dense = Arc::new(HttpDenseEncoder::new(
        config.dense.endpoint.clone(),
        config.dense.model.clone(),
        config.dense.dimensions,
    ));
    let sparse: Arc<dyn SparseEncoder> =
        Arc::new(Bm25Encoder::new(PathBuf::from(&config.paths.bm25_model)));
    cold_start_bm25(&sparse);
    let splade = Arc::new(HttpSpladeEncoder::new(SpladeSettings {
        endpoint: config.splade.endpoint.clone(),
        model: config.splade.model.clone(),
        max_length: config.splade.max_length,
        threshold: config.splade.threshold,
        top_k: config.splade.top_k,
        enabled: config.splade.enabled,
    }));
    let cross: Option<Arc<dyn CrossEncoder>> = if config.cross_encoder.enabled {
        Some(Arc::new(HttpCrossEncoder::new(
            config.cross_encoder.endpoint.clone(),
            config.cross_encoder.model.clone(),
        )))
    } else {
        None
    };

    let cipher: Arc<dyn ContentCipher> =
        Arc::new(TenantEncryption::new(&config.security.master_key));

    let pipeline_config = PipelineConfig {
        use_splade: config.splade.enabled,
        use_reranker: config.search.use_reranker && config.cross_encoder.enabled,
        date_boost: config.search.date_boost,
        semantic_cache: config.search.semantic_cache,
        ..PipelineConfig::default()
    };
    let pipeline = Arc::new(HybridSearchPipeline::new(
        Arc::clone(&store),
        dense.clone(),
        Arc::clone(&sparse),
        splade.clone(),
        cross,
        Arc::clone(&cipher),
        pipeline_config,
    ));

    let ingest = Arc::new(IngestService::new(
        Arc::clone(&store),
        dense,
        Arc::clone(&sparse),
        splade,
        Arc::clone(&cipher),
        VectorAnomalyDetector::default(),
        IngestConfig {
            vector_size: config.engine.vector_size,
            ..IngestConfig::default()
        },
    ));

    let job_store: Arc<dyn JobStore> =
        Arc::new(SqliteJobStore::open(PathBuf::from(&config.paths.jobs_db).as_path()).await?);
    let (dispatcher, job_rx) = ChannelDispatcher::new(config.jobs.queue_capacity);
    let jobs = Arc::new(JobEngine::new(
        Arc::clone(&job_store),
        Arc::new(dispatcher),
        config.jobs.bm25_cooldown_min,
    ));
    let worker = JobWorker::new(
        Arc::clone(&job_store),
        Arc::clone(&store),
        Arc::clone(&ingest),
        Arc::clone(&sparse),
    );
    tokio::spawn(worker.run(job_rx));

    let user_store =
        SqliteUserStore::open(PathBuf::from(&config.paths.security_db).as_path()).await?;
    let users = Arc::new(UserService::new(Arc::new(user_store)));

    let tokens = Arc::new(TokenService::new(&config.security.jwt_secret));

    let audit: Arc<dyn AuditSink> = Arc::new(AuditLog::start(AuditLogSettings::new(
        &config.paths.audit_dir,
    ))?);

    let (rate_limiter, quota): (Arc<dyn RateLimiter>, Arc<dyn QuotaCounter>) =
        match &config.redis.url {
            Some(url) => match RedisRateLimiter::connect(url).await {
                Ok(limiter) => {
                    let quota = RedisQuotaCounter::from_connection(limiter.connection());
                    (Arc::new(limiter), Arc::new(quota))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable; using in-memory limiting");
                    (
                        Arc::new(InMemoryRateLimiter::new()),
                        Arc::new(InMemoryQuotaCounter::new()),
                    )
                }
            },
            None => (
                Arc::new(InMemoryRateLimiter::new()),
                Arc::new(InMemoryQuotaCounter::new()),
            ),
        };

    Ok(AppState {
        config,
        store,
        pipeline,
        ingest,
        jobs,
        job_store,
        users,
        tokens,
        audit,
        access: Arc::new(AccessControl::new()),
        injection: Arc::new(InjectionDetector::new()),
        rate_limiter,
        quota,
        metrics: Arc::new(Metrics::new()?),
    })
}
