//! In-memory character directory
//!
//! Serves stat snapshots and accepts health write-backs. Health is clamped
//! into `0..=max_health` on write so a downed write-back never goes negative.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{CharacterStatsPort, PortError};
use crate::domain::value_objects::{CharacterId, StatSnapshot};

#[derive(Default)]
pub struct InMemoryCharacterDirectory {
    records: RwLock<HashMap<CharacterId, StatSnapshot>>,
}

impl InMemoryCharacterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, character_id: CharacterId, stats: StatSnapshot) {
        self.records.write().await.insert(character_id, stats);
    }
}

#[async_trait]
impl CharacterStatsPort for InMemoryCharacterDirectory {
    async fn stat_snapshot(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<StatSnapshot>, PortError> {
        Ok(self.records.read().await.get(&character_id).cloned())
    }

    async fn write_back_health(
        &self,
        character_id: CharacterId,
        health: i32,
    ) -> Result<(), PortError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&character_id).ok_or_else(|| {
            PortError::Storage(format!("character {character_id} has no record"))
        })?;
        record.health = health.clamp(0, record.max_health);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_back_clamps_to_the_valid_range() {
        let directory = InMemoryCharacterDirectory::new();
        let who = CharacterId::new();
        let stats = StatSnapshot {
            health: 80,
            max_health: 100,
            attack: 10,
            defense: 5,
            agility: 5,
            block_strength: 2,
            level: 3,
            crit_chance: 0.05,
        };
        directory.put(who, stats).await;

        directory.write_back_health(who, 140).await.unwrap();
        assert_eq!(
            directory.stat_snapshot(who).await.unwrap().unwrap().health,
            100
        );
        directory.write_back_health(who, -5).await.unwrap();
        assert_eq!(
            directory.stat_snapshot(who).await.unwrap().unwrap().health,
            0
        );
    }
}
