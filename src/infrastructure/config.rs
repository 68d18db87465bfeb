//! Application configuration

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP server port
    pub server_port: u16,
    /// Orchestrator tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// How long terminal sessions stay queryable before cleanup, in seconds
    pub session_cleanup_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            tick_interval_ms: env::var("TICK_INTERVAL_MS")
                .unwrap_or_else(|_| "250".to_string())
                .parse()
                .context("TICK_INTERVAL_MS must be a number of milliseconds")?,
            session_cleanup_secs: env::var("SESSION_CLEANUP_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .context("SESSION_CLEANUP_SECS must be a number of seconds")?,
        })
    }
}
