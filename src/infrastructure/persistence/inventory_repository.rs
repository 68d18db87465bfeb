//! In-memory inventory adapter
//!
//! Gold is a quantity on one reserved currency record per character. Credit
//! and debit take the write lock for their whole read-modify-write, which is
//! the per-character atomicity the ledger's conservation rests on.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{InventoryPort, PortError};
use crate::domain::value_objects::{CharacterId, ItemId};

#[derive(Default)]
struct Store {
    /// Currency quantity per character; absent means zero
    currency: HashMap<CharacterId, u64>,
    items: HashMap<(CharacterId, ItemId), u32>,
}

#[derive(Default)]
pub struct InMemoryInventory {
    store: RwLock<Store>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item stack quantity, for inspection in tests
    pub async fn item_quantity(&self, character_id: CharacterId, item_id: ItemId) -> u32 {
        self.store
            .read()
            .await
            .items
            .get(&(character_id, item_id))
            .copied()
            .unwrap_or(0)
    }

    /// True when the character has no currency record at all
    pub async fn currency_record_absent(&self, character_id: CharacterId) -> bool {
        !self.store.read().await.currency.contains_key(&character_id)
    }
}

#[async_trait]
impl InventoryPort for InMemoryInventory {
    async fn currency_quantity(&self, character_id: CharacterId) -> Result<u64, PortError> {
        Ok(self
            .store
            .read()
            .await
            .currency
            .get(&character_id)
            .copied()
            .unwrap_or(0))
    }

    async fn credit_currency(
        &self,
        character_id: CharacterId,
        amount: u64,
    ) -> Result<u64, PortError> {
        let mut store = self.store.write().await;
        let balance = store.currency.entry(character_id).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }

    async fn debit_currency(
        &self,
        character_id: CharacterId,
        amount: u64,
    ) -> Result<bool, PortError> {
        let mut store = self.store.write().await;
        let balance = store.currency.get(&character_id).copied().unwrap_or(0);
        if balance < amount {
            return Ok(false);
        }
        let remaining = balance - amount;
        if remaining == 0 {
            // A zero-quantity record is deleted, never kept around
            store.currency.remove(&character_id);
        } else {
            store.currency.insert(character_id, remaining);
        }
        Ok(true)
    }

    async fn grant_item(
        &self,
        character_id: CharacterId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), PortError> {
        let mut store = self.store.write().await;
        *store.items.entry((character_id, item_id)).or_insert(0) += quantity;
        Ok(())
    }
}
