//! Keygen API
//!
//! HTTP server for deterministic per-user key issuance.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keygen_api::database::{initialize_database, SqlxKeyRecordRepository};
use keygen_api::{router, AppState, Cli, ServiceConfig};
use keygen_core::KeyManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.load_env_file()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()
        .context("Failed to load configuration")?
        .apply_cli(&cli);

    let pool = initialize_database(&config.database)
        .await
        .context("Failed to initialize database")?;
    let store = Arc::new(SqlxKeyRecordRepository::new(pool.clone()));

    let key_manager = KeyManager::from_config(&config.keygen, store);
    key_manager
        .initialize()
        .await
        .context("Failed to initialize key manager")?;

    let app = router(AppState::new(key_manager));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Keygen API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Keygen API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
