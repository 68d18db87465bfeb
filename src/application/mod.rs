//! Application layer - use cases and boundary interfaces
//!
//! Services orchestrate the domain; ports declare what the core needs from
//! the outside world; DTOs are the read models served over HTTP.

pub mod dto;
pub mod error;
pub mod ports;
pub mod services;
