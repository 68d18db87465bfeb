//! Catalog templates consumed from the content-management collaborator
//!
//! Missions, event templates and monster templates are authored elsewhere;
//! the mission core reads them through the catalog port and never mutates
//! them.

use serde::{Deserialize, Serialize};

use crate::domain::entities::event::EventType;
use crate::domain::value_objects::{EventTemplateId, ItemId, MissionId, MonsterTemplateId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterRarity {
    Common,
    Elite,
    Rare,
    Boss,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterTemplate {
    pub id: MonsterTemplateId,
    pub name: String,
    pub health: i32,
    pub attack: i32,
    pub defense: i32,
    pub attack_interval_ms: i64,
    pub rarity: MonsterRarity,
    pub is_boss: bool,
    pub difficulty: u32,
}

/// One entry in a mission's completion loot table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEntry {
    pub item_id: ItemId,
    pub quantity: u32,
    /// Probability in [0, 1] that this entry drops at mission completion
    pub drop_chance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionTemplate {
    pub id: MissionId,
    pub name: String,
    pub difficulty: u32,
    pub total_phases: u32,
    /// Events resolved per phase before the rest boundary opens
    pub events_per_phase: u32,
    pub spawn_interval_min_secs: u64,
    pub spawn_interval_max_secs: u64,
    pub rest_duration_secs: u64,
    pub reward_gold: u64,
    pub reward_items: Vec<RewardEntry>,
    pub monster_pool: Vec<MonsterTemplateId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTemplate {
    pub id: EventTemplateId,
    pub name: String,
    pub event_type: EventType,
    /// Templates are compatible with missions of at least this difficulty
    pub difficulty: u32,
    pub time_limit_secs: Option<u64>,
    /// Monster pool override for combat/boss templates; empty means use the
    /// mission's pool
    pub monster_pool: Vec<MonsterTemplateId>,
}
