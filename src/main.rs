//! Dungeoneer Engine - server-authoritative dungeon mission backend
//!
//! The engine is the backend server that:
//! - Runs mission sessions as phased sequences of random dungeon events
//! - Resolves combat authoritatively (attacks, telegraphs, blocks, parries)
//! - Distributes loot and settles the party's currency ledger
//! - Serves polling clients over a REST API

mod application;
mod domain;
mod infrastructure;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http;
use crate::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dungeoneer_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Dungeoneer Engine");

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Port: {}", config.server_port);
    tracing::info!("  Tick interval: {}ms", config.tick_interval_ms);

    let server_port = config.server_port;
    let tick_interval_ms = config.tick_interval_ms;

    // Initialize application state
    let state = Arc::new(AppState::new(config));
    tracing::info!("Application state initialized");

    // Orchestrator tick worker: spawn checks, monster attacks, event expiry,
    // rest completion and session cleanup
    let tick_worker = {
        let orchestrator = state.orchestrator.clone();
        tokio::spawn(async move {
            tracing::info!("Starting orchestrator tick worker");
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_millis(tick_interval_ms));
            loop {
                interval.tick().await;
                orchestrator.tick(chrono::Utc::now()).await;
            }
        })
    };

    // Build the router
    let app = Router::new()
        .route("/health", get(health_check))
        .merge(http::create_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run server with graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping workers...");
            tick_worker.abort();
            tracing::info!("Workers stopped");
        }
    }

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
