//! Mission phase entity
//!
//! A session is a fixed sequence of phases. Each phase resolves a quota of
//! spawned events, then offers the party a rest-or-continue choice before the
//! next phase begins. The final phase skips resting entirely and hands off to
//! mission completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{MonsterId, MonsterTemplateId};

/// State machine status for a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    Active,
    Resting,
    Completed,
}

/// Persistent record of a monster spawned during this phase.
///
/// The live `Monster` only exists inside a combat event; its final health and
/// defeat flag are written back here when the combat resolves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseMonsterRecord {
    pub monster_id: MonsterId,
    pub template_id: MonsterTemplateId,
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub defeated: bool,
}

/// One phase within a mission session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionPhase {
    pub number: u32,
    pub status: PhaseStatus,
    /// Monsters spawned for this phase (mutable health snapshot)
    pub roster: Vec<PhaseMonsterRecord>,
    pub events_completed: u32,
    /// Events required before the phase boundary opens
    pub events_required: u32,
    /// Time penalty imposed by choosing to rest, in seconds (0 if the party
    /// continued without resting)
    pub rest_penalty_secs: u64,
    /// Set while the phase is RESTING
    pub rest_ends_at: Option<DateTime<Utc>>,
}

impl MissionPhase {
    pub fn new(number: u32, events_required: u32) -> Self {
        Self {
            number,
            status: PhaseStatus::Pending,
            roster: Vec::new(),
            events_completed: 0,
            events_required,
            rest_penalty_secs: 0,
            rest_ends_at: None,
        }
    }

    pub fn activate(&mut self) {
        self.status = PhaseStatus::Active;
    }

    pub fn record_event_completed(&mut self) {
        self.events_completed += 1;
    }

    /// The phase boundary is open once the event quota is met and the phase
    /// is still active (the rest choice has not been made yet).
    pub fn boundary_ready(&self) -> bool {
        self.status == PhaseStatus::Active && self.events_completed >= self.events_required
    }

    pub fn begin_rest(&mut self, now: DateTime<Utc>, duration_secs: u64) {
        self.status = PhaseStatus::Resting;
        self.rest_penalty_secs = duration_secs;
        self.rest_ends_at = Some(now + chrono::Duration::seconds(duration_secs as i64));
    }

    pub fn rest_over(&self, now: DateTime<Utc>) -> bool {
        self.status == PhaseStatus::Resting
            && self.rest_ends_at.map(|end| now >= end).unwrap_or(true)
    }

    pub fn complete(&mut self) {
        self.status = PhaseStatus::Completed;
        self.rest_ends_at = None;
    }
}
