//! In-memory party roster directory

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{PartyPort, PortError};
use crate::domain::entities::PartyRoster;
use crate::domain::value_objects::PartyId;

#[derive(Default)]
pub struct InMemoryPartyDirectory {
    rosters: RwLock<HashMap<PartyId, PartyRoster>>,
}

impl InMemoryPartyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, roster: PartyRoster) {
        self.rosters.write().await.insert(roster.party_id, roster);
    }
}

#[async_trait]
impl PartyPort for InMemoryPartyDirectory {
    async fn roster(&self, party_id: PartyId) -> Result<Option<PartyRoster>, PortError> {
        Ok(self.rosters.read().await.get(&party_id).cloned())
    }
}
