//! PlastoPack UI - Main entry point
//!
//! Serves the rate-card web service: authentication, user
//! administration, material-rate management with history, and the BOPP
//! tape cost calculator.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plastopack_common::config;
use plastopack_common::db::init_database;
use plastopack_ui::{create_router, AppState};

/// Command-line arguments for plastopack-ui
#[derive(Parser, Debug)]
#[command(name = "plastopack-ui")]
#[command(about = "Rate card and material-rate service for J M PlastoPack")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5730", env = "PLASTOPACK_UI_PORT")]
    port: u16,

    /// Folder holding the SQLite database
    #[arg(short, long, env = "PLASTOPACK_DATA")]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plastopack_ui=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting PlastoPack UI on port {}", args.port);

    let data_folder = config::resolve_data_folder(args.data_folder.as_deref(), "PLASTOPACK_DATA")
        .context("Failed to resolve data folder")?;
    info!("Data folder: {}", data_folder.display());

    let db_path = config::database_path(&data_folder);
    let db = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    // Build the application router
    let app = create_router(AppState { db });

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
