//! Read-model DTOs served to polling clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::MissionRuntime;
use crate::domain::entities::{
    CombatState, DropKind, DungeonEvent, EventPayload, EventStatus, EventType, LootMode,
    PhaseStatus, SessionStatus,
};
use crate::domain::value_objects::{CharacterId, DropId, EventId, SessionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseView {
    pub number: u32,
    pub status: PhaseStatus,
    pub events_completed: u32,
    pub events_required: u32,
    pub rest_penalty_secs: u64,
    pub monsters_on_roster: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub current_phase: u32,
    pub total_phases: u32,
    pub elapsed_ms: i64,
    pub clock_paused: bool,
    pub active_event_id: Option<EventId>,
    pub next_event_spawn_time: Option<DateTime<Utc>>,
    pub phases: Vec<PhaseView>,
    pub pending_drops: usize,
}

impl SessionView {
    pub fn from_runtime(runtime: &MissionRuntime, now: DateTime<Utc>) -> Self {
        let session = &runtime.session;
        Self {
            session_id: session.id,
            status: session.status,
            current_phase: session.current_phase,
            total_phases: session.total_phases,
            elapsed_ms: session.elapsed(now).num_milliseconds(),
            clock_paused: session.paused_at.is_some(),
            active_event_id: session.current_event_id,
            next_event_spawn_time: session.next_event_spawn_time,
            phases: runtime
                .phases
                .iter()
                .map(|p| PhaseView {
                    number: p.number,
                    status: p.status,
                    events_completed: p.events_completed,
                    events_required: p.events_required,
                    rest_penalty_secs: p.rest_penalty_secs,
                    monsters_on_roster: p.roster.len(),
                })
                .collect(),
            pending_drops: runtime.unclaimed_drops().count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventView {
    pub event_id: EventId,
    pub event_type: EventType,
    pub status: EventStatus,
    pub payload: EventPayload,
    pub actions_submitted: usize,
    pub time_limit_secs: Option<u64>,
    pub started_at: DateTime<Utc>,
    /// Present while the event runs through the combat engine
    pub combat: Option<CombatState>,
}

impl EventView {
    pub fn new(event: &DungeonEvent, combat: Option<&CombatState>) -> Self {
        Self {
            event_id: event.id,
            event_type: event.event_type,
            status: event.status,
            payload: event.payload.clone(),
            actions_submitted: event.actions.len(),
            time_limit_secs: event.time_limit_secs,
            started_at: event.started_at,
            combat: combat.cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropView {
    pub drop_id: DropId,
    pub kind: DropKind,
    pub mode: LootMode,
    pub assigned_to: Option<CharacterId>,
    pub claimed_by: Option<CharacterId>,
    pub rolls_submitted: usize,
}

impl DropView {
    pub fn from_runtime(runtime: &MissionRuntime) -> Vec<Self> {
        runtime
            .drops
            .iter()
            .map(|d| Self {
                drop_id: d.id,
                kind: d.kind.clone(),
                mode: d.mode,
                assigned_to: d.assigned_to,
                claimed_by: d.claimed_by,
                rolls_submitted: runtime.rolls.get(&d.id).map(|r| r.len()).unwrap_or(0),
            })
            .collect()
    }
}
