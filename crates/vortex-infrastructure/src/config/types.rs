//! Configuration data types.
//!
//! Every section has serde defaults so a partial YAML file (or none at all)
//! still yields a runnable configuration.

use serde::{Deserialize, Serialize};

use vortex_domain::constants::ingest::DEFAULT_VECTOR_SIZE;
use vortex_domain::constants::jobs::DEFAULT_BM25_COOLDOWN_MIN;
use vortex_domain::constants::limits::{DEFAULT_RATE_LIMIT_MAX, DEFAULT_RATE_LIMIT_WINDOW_SECS};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server binding
    pub server: ServerConfig,
    /// Vector store backend selection
    pub engine: EngineConfig,
    /// Redis connection (rate limiting, quota)
    pub redis: RedisConfig,
    /// Persisted-state locations
    pub paths: PathsConfig,
    /// Dense encoder endpoint
    pub dense: DenseConfig,
    /// SPLADE encoder endpoint and thresholds
    pub splade: SpladeConfig,
    /// Cross-encoder endpoint
    pub cross_encoder: CrossEncoderConfig,
    /// Search pipeline toggles
    pub search: SearchConfig,
    /// Security settings
    pub security: SecurityConfig,
    /// Job engine settings
    pub jobs: JobsConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Deployment mode tag (`standalone`, `cluster`, ...)
    pub app_mode: String,
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8001,
        }
    }
}

/// Which vector store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Qdrant over REST
    Qdrant,
    /// Process-local store (tests, single-node demos)
    Memory,
}

/// Vector store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend kind
    pub kind: EngineKind,
    /// Qdrant base URL
    pub qdrant_url: String,
    /// Qdrant API key
    pub qdrant_api_key: Option<String>,
    /// Dense vector size for new collections
    pub vector_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Memory,
            qdrant_url: "http://localhost:6333".to_owned(),
            qdrant_api_key: None,
            vector_size: DEFAULT_VECTOR_SIZE,
        }
    }
}

/// Redis connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Connection URL; unset falls back to in-memory limiting
    pub url: Option<String>,
}

/// Persisted-state locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// SQLite jobs database
    pub jobs_db: String,
    /// SQLite security (users) database
    pub security_db: String,
    /// Snapshot directory
    pub snapshot_dir: String,
    /// BM25 model statistics file
    pub bm25_model: String,
    /// Audit log directory
    pub audit_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            jobs_db: "./.vortex/db/jobs.db".to_owned(),
            security_db: "./.vortex/db/security.db".to_owned(),
            snapshot_dir: "./snapshots".to_owned(),
            bm25_model: "./models/bm25_vectorizer.json".to_owned(),
            audit_dir: "./logs".to_owned(),
        }
    }
}

/// Dense encoder endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenseConfig {
    /// Embeddings endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Output dimensionality
    pub dimensions: usize,
}

impl Default for DenseConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/embeddings".to_owned(),
            model: "bge-m3".to_owned(),
            dimensions: DEFAULT_VECTOR_SIZE,
        }
    }
}

/// SPLADE encoder endpoint and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpladeConfig {
    /// Inference endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Token truncation length
    pub max_length: usize,
    /// Minimum kept activation
    pub threshold: f32,
    /// Maximum terms kept per vector
    pub top_k: usize,
    /// Device hint forwarded to the service
    pub device: String,
    /// Master toggle
    pub enabled: bool,
}

impl Default for SpladeConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081/splade".to_owned(),
            model: "naver/splade-v3".to_owned(),
            max_length: 256,
            threshold: 0.01,
            top_k: 256,
            device: "cpu".to_owned(),
            enabled: true,
        }
    }
}

/// Cross-encoder endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossEncoderConfig {
    /// Rerank endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Whether the rerank stage is available at all
    pub enabled: bool,
}

impl Default for CrossEncoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8082/rerank".to_owned(),
            model: "bge-reranker-v2-m3".to_owned(),
            enabled: true,
        }
    }
}

/// Search pipeline toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default collection queried when the request names none
    pub default_collection: String,
    /// Rerank stage default
    pub use_reranker: bool,
    /// Recency boost default
    pub date_boost: bool,
    /// Semantic cache default
    pub semantic_cache: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_collection: "documents".to_owned(),
            use_reranker: true,
            date_boost: false,
            semantic_cache: true,
        }
    }
}

/// Security settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    /// Shared secret for admin bootstrap endpoints
    pub admin_secret: Option<String>,
    /// Master key from which per-tenant content keys derive
    pub master_key: String,
    /// Requests allowed per principal per window
    pub rate_limit_max: u64,
    /// Sliding window length in seconds
    pub rate_limit_window_secs: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change_me_in_production_please_32b".to_owned(),
            admin_secret: None,
            master_key: "change_me_master_key".to_owned(),
            rate_limit_max: DEFAULT_RATE_LIMIT_MAX,
            rate_limit_window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

/// Job engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Cooldown between completed BM25 retrains, in minutes
    pub bm25_cooldown_min: i64,
    /// Whether `/admin/bm25/retrain` is enabled
    pub allow_bm25_batch: bool,
    /// Dispatch channel capacity
    pub queue_capacity: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            bm25_cooldown_min: DEFAULT_BM25_COOLDOWN_MIN,
            allow_bm25_batch: true,
            queue_capacity: 256,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter (`info`, `debug`, ...)
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Redaction key for sensitive log fields
    pub key: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
            key: None,
        }
    }
}
