//! Currency ledger - atomic gold balance operations
//!
//! Gold is a quantity on a reserved currency stack per character, reached
//! through the inventory port. Absence of a record is a valid "never had
//! gold" state and degrades to zero/false, never to an error. Value is
//! conserved: nothing here creates or destroys gold outside explicit reward
//! grants.

use std::sync::Arc;

use crate::application::error::{CoreError, CoreResult};
use crate::application::ports::outbound::InventoryPort;
use crate::domain::value_objects::CharacterId;

pub struct CurrencyLedger {
    inventory: Arc<dyn InventoryPort>,
}

impl CurrencyLedger {
    pub fn new(inventory: Arc<dyn InventoryPort>) -> Self {
        Self { inventory }
    }

    /// Current balance, 0 when no record exists
    pub async fn balance(&self, character_id: CharacterId) -> CoreResult<u64> {
        Ok(self.inventory.currency_quantity(character_id).await?)
    }

    /// Create or increment the balance. A zero amount is a no-op. Retries are
    /// the caller's responsibility; this is not internally deduplicated.
    pub async fn credit(&self, character_id: CharacterId, amount: u64) -> CoreResult<u64> {
        if amount == 0 {
            return self.balance(character_id).await;
        }
        let new_balance = self.inventory.credit_currency(character_id, amount).await?;
        tracing::debug!(%character_id, amount, new_balance, "credited gold");
        Ok(new_balance)
    }

    /// Decrement the balance. Returns false without mutating when the
    /// balance is short; never produces a negative balance.
    pub async fn debit(&self, character_id: CharacterId, amount: u64) -> CoreResult<bool> {
        if amount == 0 {
            return Ok(true);
        }
        let debited = self.inventory.debit_currency(character_id, amount).await?;
        if debited {
            tracing::debug!(%character_id, amount, "debited gold");
        }
        Ok(debited)
    }

    /// Move gold between characters: debit first, credit only if the debit
    /// succeeded. Self-transfer is legal and balance-neutral.
    pub async fn transfer(
        &self,
        from: CharacterId,
        to: CharacterId,
        amount: u64,
    ) -> CoreResult<()> {
        if amount == 0 {
            return Ok(());
        }
        if !self.debit(from, amount).await? {
            let balance = self.balance(from).await?;
            return Err(CoreError::InsufficientFunds {
                balance,
                requested: amount,
            });
        }
        self.credit(to, amount).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::InMemoryInventory;

    fn ledger() -> CurrencyLedger {
        CurrencyLedger::new(Arc::new(InMemoryInventory::new()))
    }

    #[tokio::test]
    async fn missing_record_reads_as_zero() {
        let ledger = ledger();
        assert_eq!(ledger.balance(CharacterId::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn zero_credit_is_a_noop() {
        let ledger = ledger();
        let who = CharacterId::new();
        assert_eq!(ledger.credit(who, 0).await.unwrap(), 0);
        assert_eq!(ledger.balance(who).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn overdraft_fails_without_mutation() {
        let ledger = ledger();
        let who = CharacterId::new();
        ledger.credit(who, 30).await.unwrap();
        assert!(!ledger.debit(who, 31).await.unwrap());
        assert_eq!(ledger.balance(who).await.unwrap(), 30);
    }

    #[tokio::test]
    async fn debit_to_zero_deletes_the_record() {
        let ledger = ledger();
        let who = CharacterId::new();
        ledger.credit(who, 30).await.unwrap();
        assert!(ledger.debit(who, 30).await.unwrap());
        assert_eq!(ledger.balance(who).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transfer_moves_value_exactly() {
        let ledger = ledger();
        let from = CharacterId::new();
        let to = CharacterId::new();
        ledger.credit(from, 100).await.unwrap();
        ledger.transfer(from, to, 40).await.unwrap();
        assert_eq!(ledger.balance(from).await.unwrap(), 60);
        assert_eq!(ledger.balance(to).await.unwrap(), 40);
    }

    #[tokio::test]
    async fn failed_transfer_credits_nothing() {
        let ledger = ledger();
        let from = CharacterId::new();
        let to = CharacterId::new();
        ledger.credit(from, 10).await.unwrap();
        let err = ledger.transfer(from, to, 50).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientFunds {
                balance: 10,
                requested: 50
            }
        ));
        assert_eq!(ledger.balance(from).await.unwrap(), 10);
        assert_eq!(ledger.balance(to).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn self_transfer_is_balance_neutral() {
        let ledger = ledger();
        let who = CharacterId::new();
        ledger.credit(who, 75).await.unwrap();
        ledger.transfer(who, who, 50).await.unwrap();
        assert_eq!(ledger.balance(who).await.unwrap(), 75);
    }

    #[tokio::test]
    async fn conservation_holds_across_operation_sequences() {
        let ledger = ledger();
        let a = CharacterId::new();
        let b = CharacterId::new();
        let c = CharacterId::new();

        // Total granted by explicit rewards
        let granted = 100 + 250 + 5;
        ledger.credit(a, 100).await.unwrap();
        ledger.credit(b, 250).await.unwrap();
        ledger.credit(c, 5).await.unwrap();

        ledger.transfer(a, b, 60).await.unwrap();
        ledger.transfer(b, c, 200).await.unwrap();
        let _ = ledger.debit(c, 9999).await.unwrap(); // fails, no mutation
        ledger.transfer(c, c, 100).await.unwrap();

        let total = ledger.balance(a).await.unwrap()
            + ledger.balance(b).await.unwrap()
            + ledger.balance(c).await.unwrap();
        assert_eq!(total, granted);
    }
}
