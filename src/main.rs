//! tapi - Todo API
//!
//! A small REST service for managing todo items, protected by a shared
//! API key.

use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod domain;
mod error;
mod logging;
mod storage;

use crate::api::build_router;
use crate::auth::ApiKeyValidator;
use crate::config::Config;
use crate::storage::TodoRepository;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database repository.
    pub repository: TodoRepository,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    // This is optional and won't fail if .env doesn't exist
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting tapi v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        database = %config.database.url,
        max_connections = config.database.max_connections(),
        pool_timeout_secs = config.database.pool_timeout_secs,
        "Configuration loaded"
    );

    let pool = storage::connect_pool(&config.database).map_err(|e| {
        tracing::error!(error = %e, "Invalid database configuration");
        anyhow::anyhow!("Database configuration error: {}", e)
    })?;

    let repository = TodoRepository::new(pool);

    // Keep serving if the store is unreachable; requests will surface
    // StoreUnavailable until it comes back.
    match repository.init_schema().await {
        Ok(()) => tracing::info!("Database schema initialized"),
        Err(e) => tracing::error!(error = %e, "Could not create tables on database"),
    }

    let api_key_validator = ApiKeyValidator::new(&config.auth.api_key);

    let state = AppState {
        repository: repository.clone(),
    };

    let app = build_router(state, api_key_validator);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repository.pool().close().await;
    tracing::info!("Connection pool closed, shutdown complete");

    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
