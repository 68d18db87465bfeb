//! Mission Aggregate - everything one running session owns
//!
//! A `MissionRuntime` clusters the session, its phases, spawned events,
//! in-flight combat state and pending loot into a single unit. The
//! orchestration core is the only writer: every mutation goes through the
//! per-session lock that guards this aggregate, which is what serializes
//! concurrent party-member input.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    CombatState, DungeonEvent, EventStatus, LootDrop, LootRoll, MissionPhase, MissionSession,
    MissionTemplate, PartyRoster,
};
use crate::domain::value_objects::{DropId, EventId, SessionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionRuntime {
    pub session: MissionSession,
    /// Mission template snapshot resolved at start
    pub mission: MissionTemplate,
    /// Party roster snapshot resolved at start
    pub party: PartyRoster,
    pub phases: Vec<MissionPhase>,
    pub events: HashMap<EventId, DungeonEvent>,
    /// Present exactly while a combat event is active
    pub combat: Option<CombatState>,
    pub drops: Vec<LootDrop>,
    /// Rolls per drop, in submission order
    pub rolls: HashMap<DropId, Vec<LootRoll>>,
}

impl MissionRuntime {
    pub fn new(session: MissionSession, mission: MissionTemplate, party: PartyRoster) -> Self {
        let phases = (1..=session.total_phases)
            .map(|n| MissionPhase::new(n, mission.events_per_phase))
            .collect();
        Self {
            session,
            mission,
            party,
            phases,
            events: HashMap::new(),
            combat: None,
            drops: Vec::new(),
            rolls: HashMap::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.session.id
    }

    pub fn active_event(&self) -> Option<&DungeonEvent> {
        self.session
            .current_event_id
            .and_then(|id| self.events.get(&id))
            .filter(|e| e.status == EventStatus::Active)
    }

    pub fn active_event_mut(&mut self) -> Option<&mut DungeonEvent> {
        let id = self.session.current_event_id?;
        self.events
            .get_mut(&id)
            .filter(|e| e.status == EventStatus::Active)
    }

    /// Phase currently being run (1-based `current_phase`)
    pub fn current_phase(&self) -> Option<&MissionPhase> {
        self.phases.get(self.session.current_phase as usize - 1)
    }

    pub fn current_phase_mut(&mut self) -> Option<&mut MissionPhase> {
        self.phases.get_mut(self.session.current_phase as usize - 1)
    }

    pub fn drop_by_id(&self, drop_id: DropId) -> Option<&LootDrop> {
        self.drops.iter().find(|d| d.id == drop_id)
    }

    pub fn drop_by_id_mut(&mut self, drop_id: DropId) -> Option<&mut LootDrop> {
        self.drops.iter_mut().find(|d| d.id == drop_id)
    }

    pub fn unclaimed_drops(&self) -> impl Iterator<Item = &LootDrop> {
        self.drops.iter().filter(|d| !d.is_claimed())
    }
}
