use async_trait::async_trait;

use super::PortError;
use crate::domain::entities::PartyRoster;
use crate::domain::value_objects::PartyId;

/// Read access to party rosters and loot designations
#[async_trait]
pub trait PartyPort: Send + Sync {
    async fn roster(&self, party_id: PartyId) -> Result<Option<PartyRoster>, PortError>;
}
