//! VortexDB gateway binary.

use anyhow::Context;

use vortex_infrastructure::config::ConfigLoader;
use vortex_infrastructure::logging;
use vortex_server::{build_router, state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .load()
        .context("configuration loading failed")?;
    logging::init(&config.logging);

    let bind = format!("{}:{}", config.server.host, config.server.port);
    let state = state::bootstrap(config)
        .await
        .context("application bootstrap failed")?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    tracing::info!(addr = %bind, "vortex gateway listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
