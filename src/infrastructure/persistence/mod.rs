//! Persistence adapters for the outbound ports
//!
//! Character records, party rosters, catalog content and inventory live in
//! external services in production; these in-memory adapters implement the
//! same port contracts for local runs and tests.

mod catalog_repository;
mod character_repository;
mod inventory_repository;
mod party_repository;

pub use catalog_repository::InMemoryCatalog;
pub use character_repository::InMemoryCharacterDirectory;
pub use inventory_repository::InMemoryInventory;
pub use party_repository::InMemoryPartyDirectory;
