//! Configuration loading and override tests.

use vortex_infrastructure::config::{AppConfig, ConfigLoader, EngineKind};

#[test]
fn defaults_are_valid() {
    let config = AppConfig::default();
    assert_eq!(config.server.port, 8001);
    assert_eq!(config.engine.kind, EngineKind::Memory);
    assert!(config.splade.enabled);
    assert_eq!(config.jobs.bm25_cooldown_min, 30);
}

#[test]
fn explicit_file_is_loaded_and_parsed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("production.yaml");
    std::fs::write(
        &path,
        r"
server:
  host: 0.0.0.0
  port: 9000
engine:
  kind: qdrant
  qdrant_url: http://qdrant:6333
security:
  jwt_secret: an-extremely-long-test-secret-value-1234
jobs:
  bm25_cooldown_min: 5
",
    )
    .expect("write config");

    let config = ConfigLoader::new()
        .with_config_path(&path)
        .load()
        .expect("load");

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.engine.kind, EngineKind::Qdrant);
    assert_eq!(config.engine.qdrant_url, "http://qdrant:6333");
    assert_eq!(config.jobs.bm25_cooldown_min, 5);
    // Untouched sections keep their defaults.
    assert_eq!(config.paths.jobs_db, "./.vortex/db/jobs.db");
}

#[test]
fn missing_explicit_file_errors() {
    let result = ConfigLoader::new()
        .with_config_path("/nonexistent/nowhere.yaml")
        .load();
    assert!(result.is_err());
}

#[test]
fn short_jwt_secret_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dev.yaml");
    std::fs::write(
        &path,
        r"
security:
  jwt_secret: short
",
    )
    .expect("write config");

    let result = ConfigLoader::new().with_config_path(&path).load();
    assert!(result.is_err());
}

#[test]
fn env_vars_override_file_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dev.yaml");
    std::fs::write(
        &path,
        r"
server:
  port: 9000
",
    )
    .expect("write config");

    // Set-and-clear inside one test to avoid cross-test interference.
    unsafe {
        std::env::set_var("VECTORDB_PORT", "7777");
        std::env::set_var("BM25_PATH", "/tmp/custom_bm25.json");
        std::env::set_var("ENABLE_SPLADE", "0");
    }
    let config = ConfigLoader::new()
        .with_config_path(&path)
        .load()
        .expect("load");
    unsafe {
        std::env::remove_var("VECTORDB_PORT");
        std::env::remove_var("BM25_PATH");
        std::env::remove_var("ENABLE_SPLADE");
    }

    assert_eq!(config.server.port, 7777);
    assert_eq!(config.paths.bm25_model, "/tmp/custom_bm25.json");
    assert!(!config.splade.enabled);
}
