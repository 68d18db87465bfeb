//! Infrastructure layer - External adapters and implementations
//!
//! This layer contains:
//! - Persistence: in-memory adapters for the outbound ports
//! - HTTP: REST API routes
//! - Config: Application configuration
//! - State: Shared application state and the session registry

pub mod config;
pub mod http;
pub mod persistence;
pub mod state;
