//! Calendar server - serves the /api/calendars endpoints over HTTP.

use anyhow::Context;
use api_gateway::{router, AppState};
use shared::{db, Config, PgStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug,sqlx=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .json()
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = db::create_pool(&config);

    info!(
        host = %config.db_host,
        port = config.db_port,
        database = %config.db_name,
        attempts = config.startup_attempts,
        "Waiting for database"
    );

    tokio::select! {
        ready = db::wait_until_ready(&pool, config.startup_policy()) => {
            ready.context("Database did not become ready")?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown requested before the database was ready");
            return Ok(());
        }
    }

    db::ensure_schema(&pool)
        .await
        .context("Failed to create database schema")?;

    let bind_addr = config.bind_addr;
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), config);
    let app = router(state)?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!(addr = %bind_addr, "Calendar server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Calendar server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
