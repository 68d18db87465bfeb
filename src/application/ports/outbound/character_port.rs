use async_trait::async_trait;

use super::PortError;
use crate::domain::value_objects::{CharacterId, StatSnapshot};

/// Read/write access to persistent character and companion records.
///
/// The core reads a stat snapshot at combat start and writes back nothing
/// but final health.
#[async_trait]
pub trait CharacterStatsPort: Send + Sync {
    async fn stat_snapshot(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<StatSnapshot>, PortError>;

    async fn write_back_health(
        &self,
        character_id: CharacterId,
        health: i32,
    ) -> Result<(), PortError>;
}
