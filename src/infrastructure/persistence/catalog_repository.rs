//! In-memory catalog of mission, event and monster templates

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::outbound::{CatalogPort, PortError};
use crate::domain::entities::{EventTemplate, MissionTemplate, MonsterTemplate};
use crate::domain::value_objects::{MissionId, MonsterTemplateId};

#[derive(Default)]
struct Content {
    missions: HashMap<MissionId, MissionTemplate>,
    events: Vec<EventTemplate>,
    monsters: HashMap<MonsterTemplateId, MonsterTemplate>,
}

#[derive(Default)]
pub struct InMemoryCatalog {
    content: RwLock<Content>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_mission(&self, template: MissionTemplate) {
        self.content
            .write()
            .await
            .missions
            .insert(template.id, template);
    }

    pub async fn put_event(&self, template: EventTemplate) {
        self.content.write().await.events.push(template);
    }

    pub async fn put_monster(&self, template: MonsterTemplate) {
        self.content
            .write()
            .await
            .monsters
            .insert(template.id, template);
    }

    pub async fn clear_events(&self) {
        self.content.write().await.events.clear();
    }
}

#[async_trait]
impl CatalogPort for InMemoryCatalog {
    async fn mission_template(
        &self,
        mission_id: MissionId,
    ) -> Result<Option<MissionTemplate>, PortError> {
        Ok(self.content.read().await.missions.get(&mission_id).cloned())
    }

    async fn event_templates(&self) -> Result<Vec<EventTemplate>, PortError> {
        Ok(self.content.read().await.events.clone())
    }

    async fn monster_template(
        &self,
        template_id: MonsterTemplateId,
    ) -> Result<Option<MonsterTemplate>, PortError> {
        Ok(self.content.read().await.monsters.get(&template_id).cloned())
    }
}
