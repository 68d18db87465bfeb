use async_trait::async_trait;

use super::PortError;
use crate::domain::value_objects::{CharacterId, ItemId};

/// Inventory primitives consumed by the mission core.
///
/// Gold lives as a quantity on a reserved, non-equippable currency stack per
/// character. The currency operations are atomic per character inside the
/// adapter; that atomicity is what the ledger's conservation guarantees rest
/// on.
#[async_trait]
pub trait InventoryPort: Send + Sync {
    /// Current currency quantity; 0 when the character has no record
    async fn currency_quantity(&self, character_id: CharacterId) -> Result<u64, PortError>;

    /// Create or increment the currency record, returning the new balance
    async fn credit_currency(
        &self,
        character_id: CharacterId,
        amount: u64,
    ) -> Result<u64, PortError>;

    /// Decrement the currency record if the balance covers `amount`,
    /// deleting it when it reaches exactly zero. Returns false (and mutates
    /// nothing) when the balance is short.
    async fn debit_currency(
        &self,
        character_id: CharacterId,
        amount: u64,
    ) -> Result<bool, PortError>;

    /// Grant a full item stack to a character
    async fn grant_item(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), PortError>;
}
