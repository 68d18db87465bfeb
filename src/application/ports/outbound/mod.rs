//! Outbound ports - interfaces to external collaborators
//!
//! Character/party CRUD, catalog content management and generic inventory
//! live outside the mission core; these traits are the only way the core
//! reaches them.

mod catalog_port;
mod character_port;
mod inventory_port;
mod party_port;

pub use catalog_port::CatalogPort;
pub use character_port::CharacterStatsPort;
pub use inventory_port::InventoryPort;
pub use party_port::PartyPort;

/// Failure inside an outbound adapter
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}
