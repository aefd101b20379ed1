//! Configuration loader.
//!
//! Reads `config/{env}.yaml` and applies the environment variable overrides
//! from the deployment contract. Environment variables always override file
//! values; a missing file falls back to built-in defaults with a warning.

use std::env;
use std::path::{Path, PathBuf};

use vortex_domain::constants::auth::MIN_JWT_SECRET_LENGTH;
use vortex_domain::error::{Error, Result};

use super::types::{AppConfig, EngineKind};

/// Configuration loader service.
#[derive(Clone, Default)]
pub struct ConfigLoader {
    /// Optional explicit config file path (overrides environment resolution)
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader using environment-based file resolution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an explicit configuration file path.
    #[must_use]
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load, override from the environment, and validate.
    ///
    /// # Errors
    /// Returns an error when an explicit path is missing, the YAML is
    /// malformed, or validation fails.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = match self.find_yaml_config_path()? {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| Error::io_with_source("read config file", e))?;
                let config: AppConfig = serde_yaml::from_str(&content)
                    .map_err(|e| Error::config(format!("malformed config file: {e}")))?;
                tracing::info!(path = %path.display(), "configuration loaded");
                config
            }
            None => {
                tracing::warn!("no configuration file found; using defaults");
                AppConfig::default()
            }
        };

        apply_env_overrides(&mut config);
        validate(&config)?;
        Ok(config)
    }

    fn find_yaml_config_path(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Ok(Some(path.clone()));
            }
            return Err(Error::config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }

        let env_name = env::var("VECTORDB_ENV").unwrap_or_else(|_| "development".to_owned());
        let filename = format!("{env_name}.yaml");

        if let Ok(current_dir) = env::current_dir() {
            for dir in current_dir.ancestors() {
                let candidate = dir.join("config").join(&filename);
                if candidate.exists() {
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_flag(name: &str) -> Option<bool> {
    env_string(name).map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes"))
}

/// Authoritative environment override list; file values lose.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(host) = env_string("VECTORDB_HOST") {
        config.server.host = host;
    }
    if let Some(port) = env_string("VECTORDB_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
    if let Some(engine) = env_string("VECTORDB_ENGINE") {
        config.engine.kind = match engine.as_str() {
            "memory" => EngineKind::Memory,
            _ => EngineKind::Qdrant,
        };
    }
    if let Some(url) = env_string("QDRANT_URL") {
        config.engine.qdrant_url = url;
    }
    if let Some(key) = env_string("QDRANT_API_KEY").or_else(|| env_string("VECTORDB_API_KEY")) {
        config.engine.qdrant_api_key = Some(key);
    }
    if let Some(url) = env_string("REDIS_URL") {
        config.redis.url = Some(url);
    }
    if let Some(path) = env_string("JOBS_DB_PATH") {
        config.paths.jobs_db = path;
    }
    if let Some(path) = env_string("VORTEX_SECURITY_DB") {
        config.paths.security_db = path;
    }
    if let Some(path) = env_string("SNAPSHOT_DIR") {
        config.paths.snapshot_dir = path;
    }
    if let Some(path) = env_string("BM25_PATH") {
        config.paths.bm25_model = path;
    }
    if let Some(model) = env_string("SPLADE_MODEL_NAME") {
        config.splade.model = model;
    }
    if let Some(len) = env_string("SPLADE_MAX_LENGTH").and_then(|v| v.parse().ok()) {
        config.splade.max_length = len;
    }
    if let Some(threshold) = env_string("SPLADE_THRESHOLD").and_then(|v| v.parse().ok()) {
        config.splade.threshold = threshold;
    }
    if let Some(device) = env_string("SPLADE_DEVICE") {
        config.splade.device = device;
    }
    if let Some(enabled) = env_flag("ENABLE_SPLADE") {
        config.splade.enabled = enabled;
    }
    if let Some(allowed) = env_flag("ALLOW_BM25_BATCH") {
        config.jobs.allow_bm25_batch = allowed;
    }
    if let Some(min) = env_string("BM25_COOLDOWN_MIN").and_then(|v| v.parse().ok()) {
        config.jobs.bm25_cooldown_min = min;
    }
    if let Some(secret) = env_string("ADMIN_SECRET") {
        config.security.admin_secret = Some(secret);
    }
    if let Some(secret) = env_string("JWT_SECRET") {
        config.security.jwt_secret = secret;
    }
    if let Some(level) = env_string("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(key) = env_string("LOG_KEY") {
        config.logging.key = Some(key);
    }
    if let Some(mode) = env_string("APP_MODE") {
        config.app_mode = mode;
    }
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.security.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
        return Err(Error::config(format!(
            "security.jwt_secret must be at least {MIN_JWT_SECRET_LENGTH} characters"
        )));
    }
    if config.engine.vector_size == 0 {
        return Err(Error::config("engine.vector_size cannot be 0"));
    }
    if config.security.rate_limit_window_secs == 0 {
        return Err(Error::config("security.rate_limit_window_secs cannot be 0"));
    }
    if config.dense.dimensions == 0 {
        return Err(Error::config("dense.dimensions cannot be 0"));
    }
    Ok(())
}
