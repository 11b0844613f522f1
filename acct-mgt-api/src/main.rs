use acct_mgt_api::config::AcctMgtConfig;
use acct_mgt_api::{build_router, logging, shutdown, AppState};
use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AcctMgtConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = logging::init(&config.logging).context("failed to initialize logging")?;

    let addr = config.bind_address();
    let state = AppState::from_config(config).context("failed to build cluster client")?;
    info!(
        backend = ?state.config.cluster.backend,
        api_url = %state.config.cluster.api_url,
        "cluster API configured"
    );

    let app = build_router(Arc::new(state));

    // Set up graceful shutdown
    let coordinator = shutdown::ShutdownCoordinator::new();
    let signal_watcher = coordinator.clone();
    tokio::spawn(async move { signal_watcher.wait_for_signal().await });

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("acct-mgt API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(coordinator.signal())
        .await?;

    info!("server stopped");
    Ok(())
}
