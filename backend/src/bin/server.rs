//! CSIP HTTP Server Binary
//!
//! This is the main entry point for the CSIP REST API server.
//! It loads the analytics configuration, initializes the repository, sets up
//! the HTTP router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Run with the seeded in-memory repository (default)
//! cargo run --bin csip-server
//!
//! # Run with a custom analytics configuration
//! CSIP_CONFIG=./csip.toml cargo run --bin csip-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `CSIP_CONFIG`: Path to the analytics TOML (default: search csip.toml)
//! - `REPOSITORY_TYPE`: Repository backend (default: local)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use csip_rust::config::AnalyticsConfig;
use csip_rust::db;
use csip_rust::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting CSIP HTTP Server");

    let config_path = env::var("CSIP_CONFIG").ok().map(PathBuf::from);
    let config = AnalyticsConfig::load(config_path.as_deref())
        .context("Failed to load analytics configuration")?;
    info!(
        "P-Score weights: hvi={} iss={} rcs={}",
        config.weights.hvi, config.weights.iss, config.weights.rcs
    );

    // Initialize global repository once and reuse it across the app
    db::init_repository()?;
    let repository = std::sync::Arc::clone(db::get_repository()?);
    let districts = db::list_districts(repository.as_ref()).await?;
    info!("Repository initialized with {} districts", districts.len());

    let state = AppState::with_config(repository, config);
    let app = create_router(state);

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
