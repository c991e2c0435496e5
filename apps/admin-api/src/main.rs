//! Binary entry point for the back-office admin API server.
//!
//! All real logic lives in the library crate; this file wires together
//! configuration, the database pool, the admin bootstrap, and the HTTP
//! server with graceful shutdown.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use backoffice_admin_api::auth::bootstrap_admin;
use backoffice_admin_api::routes::build_router;
use backoffice_admin_api::{AdminConfig, AppState};
use backoffice_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BACKOFFICE_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Backoffice Admin API server...");

    // Load configuration
    let config = AdminConfig::load()?;
    info!(
        bind_addr = %config.bind_addr,
        database_path = %config.database_path,
        "Configuration loaded"
    );

    // Connect to database (migrations run on connect)
    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;
    info!("Connected to SQLite");

    // Create the first admin account if the users table is empty
    bootstrap_admin(&db, config.admin_password.as_deref()).await?;

    let bind_addr = config.bind_addr;
    let state = Arc::new(AppState::new(db, config));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "Starting HTTP server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
