use std::net::SocketAddr;

use anyhow::Context;
use shop_server::db::DbService;
use shop_server::utils::init_logger;
use shop_server::{Config, ServerState, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let log_json = std::env::var("LOG_JSON").is_ok_and(|v| v == "true" || v == "1");
    let log_dir = std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty());
    init_logger(&log_level, log_json, log_dir.as_deref());

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        api_version = %config.api_version,
        "Starting shop server"
    );

    let db = DbService::new(&config.database_path, config.store_timeout)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database {}: {e}", config.database_path))?;
    tracing::info!(path = %config.database_path, "Database ready");
    let state = ServerState::new(config, db);
    state
        .bootstrap()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bootstrap admin account: {e}"))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    let app = build_app(state.clone());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    state.shutdown();
    state.db.close().await;
    tracing::info!("Shop server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
