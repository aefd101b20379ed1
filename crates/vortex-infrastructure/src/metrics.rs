//! Prometheus metrics registry.
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `vortex_http_requests_total` | CounterVec (`route`, `status`) | Request count per route |
//! | `vortex_search_latency_seconds` | Histogram | Hybrid search latency |
//! | `vortex_job_queue_count` | Gauge | Queued jobs |
//! | `vortex_job_active_count` | Gauge | Running jobs |
//! | `vortex_job_completed_count` | Gauge | Completed jobs |
//! | `vortex_job_failed_count` | Gauge | Failed jobs |
//! | `vortex_last_bm25_training_timestamp` | Gauge | Last BM25 retrain completion |
//! | `vortex_last_snapshot_timestamp` | Gauge | Last snapshot completion |

use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Registry, TextEncoder, opts,
};

use vortex_domain::entities::{JobCounts, JobType};
use vortex_domain::error::{Error, Result};
use vortex_domain::ports::jobs::JobStore;

/// All gateway metrics, backed by one registry.
pub struct Metrics {
    registry: Registry,
    /// Request count per route and status class
    pub http_requests: CounterVec,
    /// Hybrid search latency histogram
    pub search_latency: Histogram,
    /// Queued jobs
    pub job_queue: Gauge,
    /// Running jobs
    pub job_active: Gauge,
    /// Completed jobs
    pub job_completed: Gauge,
    /// Failed jobs
    pub job_failed: Gauge,
    /// Last BM25 retrain completion (epoch seconds)
    pub last_bm25_training: Gauge,
    /// Last snapshot completion (epoch seconds)
    pub last_snapshot: Gauge,
}

impl Metrics {
    /// Create and register all metrics.
    ///
    /// # Errors
    /// Returns an error when registration fails (duplicate names).
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests = CounterVec::new(
            opts!("vortex_http_requests_total", "HTTP requests by route"),
            &["route", "status"],
        )
        .map_err(metric_err)?;
        let search_latency = Histogram::with_opts(HistogramOpts::new(
            "vortex_search_latency_seconds",
            "Hybrid search latency in seconds",
        ))
        .map_err(metric_err)?;
        let job_queue = Gauge::with_opts(opts!(
            "vortex_job_queue_count",
            "Number of jobs in queue"
        ))
        .map_err(metric_err)?;
        let job_active = Gauge::with_opts(opts!(
            "vortex_job_active_count",
            "Number of active jobs"
        ))
        .map_err(metric_err)?;
        let job_completed = Gauge::with_opts(opts!(
            "vortex_job_completed_count",
            "Number of completed jobs"
        ))
        .map_err(metric_err)?;
        let job_failed = Gauge::with_opts(opts!(
            "vortex_job_failed_count",
            "Number of failed jobs"
        ))
        .map_err(metric_err)?;
        let last_bm25_training = Gauge::with_opts(opts!(
            "vortex_last_bm25_training_timestamp",
            "Timestamp of the last successful BM25 training"
        ))
        .map_err(metric_err)?;
        let last_snapshot = Gauge::with_opts(opts!(
            "vortex_last_snapshot_timestamp",
            "Timestamp of the last successful snapshot"
        ))
        .map_err(metric_err)?;

        registry
            .register(Box::new(http_requests.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(search_latency.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(job_queue.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(job_active.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(job_completed.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(job_failed.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(last_bm25_training.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(last_snapshot.clone()))
            .map_err(metric_err)?;

        Ok(Self {
            registry,
            http_requests,
            search_latency,
            job_queue,
            job_active,
            job_completed,
            job_failed,
            last_bm25_training,
            last_snapshot,
        })
    }

    /// Refresh job gauges from the job table.
    pub async fn collect_job_metrics(&self, store: &dyn JobStore) {
        match store.list(1).await {
            Ok((counts, _)) => self.set_job_counts(&counts),
            Err(e) => tracing::error!(error = %e, "job metrics collection failed"),
        }
        if let Ok(Some(ts)) = store.last_completed_at(JobType::Bm25Retrain).await {
            self.last_bm25_training.set(ts);
        }
        if let Ok(Some(ts)) = store.last_completed_at(JobType::CreateSnapshot).await {
            self.last_snapshot.set(ts);
        }
    }

    fn set_job_counts(&self, counts: &JobCounts) {
        self.job_queue.set(counts.queued as f64);
        self.job_active.set(counts.running as f64);
        self.job_completed.set(counts.completed as f64);
        self.job_failed.set(counts.failed as f64);
    }

    /// Render the registry in Prometheus text exposition format.
    ///
    /// # Errors
    /// Returns an error when encoding fails.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(metric_err)?;
        String::from_utf8(buffer).map_err(|e| Error::internal(format!("metrics not UTF-8: {e}")))
    }
}

fn metric_err<E: std::fmt::Display>(e: E) -> Error {
    Error::internal(format!("metrics error: {e}"))
}
