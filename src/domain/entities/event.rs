//! Dungeon event entity - a randomly spawned, timed encounter
//!
//! Events pause the mission clock for their whole lifetime. At most one event
//! is active per session. Non-combat events complete once every player member
//! has submitted an action, or when their time limit expires; combat events
//! complete through the combat engine's win/loss detection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    CharacterId, EventId, EventTemplateId, ItemId, MonsterTemplateId, SessionId,
};

/// Types of dungeon events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Combat,
    Treasure,
    Trap,
    Puzzle,
    Choice,
    Rest,
    BetrayalOpportunity,
    NpcEncounter,
    Boss,
    EnvironmentalHazard,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        Self::Combat,
        Self::Treasure,
        Self::Trap,
        Self::Puzzle,
        Self::Choice,
        Self::Rest,
        Self::BetrayalOpportunity,
        Self::NpcEncounter,
        Self::Boss,
        Self::EnvironmentalHazard,
    ];

    /// Spawn weight at the given mission difficulty. Weights shift toward
    /// combat, bosses and hazards as difficulty rises.
    pub fn spawn_weight(&self, difficulty: u32) -> u32 {
        match self {
            Self::Combat => match difficulty {
                0..=3 => 30,
                4 => 40,
                _ => 35,
            },
            Self::Treasure => 20,
            Self::Trap => 15,
            Self::Puzzle => 10,
            Self::Choice => 10,
            Self::Rest => 5,
            Self::BetrayalOpportunity => 5,
            Self::NpcEncounter => 5,
            Self::Boss => match difficulty {
                0..=3 => 0,
                4 => 15,
                _ => 25,
            },
            Self::EnvironmentalHazard => match difficulty {
                0..=3 => 0,
                4 => 10,
                _ => 15,
            },
        }
    }

    /// Combat and boss events run through the combat engine
    pub fn is_combat(&self) -> bool {
        matches!(self, Self::Combat | Self::Boss)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Combat => "Combat",
            Self::Treasure => "Treasure",
            Self::Trap => "Trap",
            Self::Puzzle => "Puzzle",
            Self::Choice => "Choice",
            Self::Rest => "Rest",
            Self::BetrayalOpportunity => "Betrayal Opportunity",
            Self::NpcEncounter => "NPC Encounter",
            Self::Boss => "Boss",
            Self::EnvironmentalHazard => "Environmental Hazard",
        }
    }
}

/// Lifecycle status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Active,
    Completed,
}

/// An item stack inside a treasure payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasureItem {
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Event-specific generated data, keyed by event type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    Combat {
        monster_count: u32,
        pool: Vec<MonsterTemplateId>,
        gold_reward: u64,
    },
    Boss {
        monster_count: u32,
        pool: Vec<MonsterTemplateId>,
        gold_reward: u64,
    },
    Treasure {
        gold: u64,
        items: Vec<TreasureItem>,
    },
    Trap {
        damage: i32,
    },
    Puzzle {
        complexity: u32,
    },
    Choice {
        options: Vec<String>,
    },
    Rest {
        heal_fraction: f64,
    },
    BetrayalOpportunity {
        tempt_gold: u64,
    },
    NpcEncounter {
        npc_name: String,
    },
    EnvironmentalHazard {
        damage: i32,
    },
}

/// One player's submitted action against an event, in submission order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEventAction {
    pub character_id: CharacterId,
    pub action: String,
    pub submitted_at: DateTime<Utc>,
}

/// A spawned encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonEvent {
    pub id: EventId,
    pub session_id: SessionId,
    pub template_id: EventTemplateId,
    pub event_type: EventType,
    pub status: EventStatus,
    pub payload: EventPayload,
    /// Ordered list of per-player submitted actions
    pub actions: Vec<PlayerEventAction>,
    /// Advisory time limit; expired events are auto-skipped by the
    /// orchestrator on its next tick (combat events are exempt)
    pub time_limit_secs: Option<u64>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DungeonEvent {
    pub fn new(
        session_id: SessionId,
        template_id: EventTemplateId,
        event_type: EventType,
        payload: EventPayload,
        time_limit_secs: Option<u64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(),
            session_id,
            template_id,
            event_type,
            status: EventStatus::Active,
            payload,
            actions: Vec::new(),
            time_limit_secs,
            started_at: now,
            completed_at: None,
        }
    }

    pub fn has_action_from(&self, character_id: CharacterId) -> bool {
        self.actions.iter().any(|a| a.character_id == character_id)
    }

    /// Record an action; returns false if this character already acted
    pub fn record_action(
        &mut self,
        character_id: CharacterId,
        action: String,
        now: DateTime<Utc>,
    ) -> bool {
        if self.has_action_from(character_id) {
            return false;
        }
        self.actions.push(PlayerEventAction {
            character_id,
            action,
            submitted_at: now,
        });
        true
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.time_limit_secs
            .map(|limit| now >= self.started_at + chrono::Duration::seconds(limit as i64))
            .unwrap_or(false)
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = EventStatus::Completed;
        self.completed_at = Some(now);
    }
}
