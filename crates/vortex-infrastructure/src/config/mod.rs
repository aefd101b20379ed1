//! Layered configuration.
//!
//! Resolution order: `config/{env}.yaml` (environment from `VECTORDB_ENV`,
//! default `development`), then environment variable overrides. Environment
//! variables always win over file values.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    AppConfig, CrossEncoderConfig, DenseConfig, EngineConfig, EngineKind, JobsConfig,
    LoggingConfig, PathsConfig, RedisConfig, SearchConfig, SecurityConfig, ServerConfig,
    SpladeConfig,
};
