use async_trait::async_trait;

use super::PortError;
use crate::domain::entities::{EventTemplate, MissionTemplate, MonsterTemplate};
use crate::domain::value_objects::{MissionId, MonsterTemplateId};

/// Read access to mission, event and monster catalogs
#[async_trait]
pub trait CatalogPort: Send + Sync {
    async fn mission_template(
        &self,
        mission_id: MissionId,
    ) -> Result<Option<MissionTemplate>, PortError>;

    async fn event_templates(&self) -> Result<Vec<EventTemplate>, PortError>;

    async fn monster_template(
        &self,
        template_id: MonsterTemplateId,
    ) -> Result<Option<MonsterTemplate>, PortError>;
}
