use anyhow::Context;
use bookswap::api::{self, AppState};
use bookswap::config::Config;
use bookswap::gateway::JwtGateway;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    let db = sled::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    let db = Arc::new(db);

    let gateway = Arc::new(JwtGateway::new(config.jwt_secret.as_bytes()));
    let state = AppState::open(db.clone(), gateway)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.flush_async().await?;
    tracing::info!("database flushed, shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
