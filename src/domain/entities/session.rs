//! Mission session entity - one end-to-end run of a mission
//!
//! The session owns the mission clock. The clock runs while the party is
//! between events and is paused for the whole lifetime of an active event;
//! `current_event_id` and `paused_at` are set and cleared together, which is
//! the session's core invariant.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{EventId, MissionId, PartyId, SessionId};

/// Lifecycle status of a mission session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    Active,
    Completed,
    Failed,
    Abandoned,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Abandoned)
    }
}

/// One run of a mission by a party
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionSession {
    pub id: SessionId,
    pub mission_id: MissionId,
    pub party_id: PartyId,
    pub status: SessionStatus,
    pub current_phase: u32,
    pub total_phases: u32,
    pub mission_start_time: Option<DateTime<Utc>>,
    pub mission_end_time: Option<DateTime<Utc>>,
    /// Set while an event is active; the clock does not advance past it
    pub paused_at: Option<DateTime<Utc>>,
    /// Accumulated pause time in milliseconds
    pub total_paused_ms: i64,
    /// The currently active event, if any
    pub current_event_id: Option<EventId>,
    /// When the next event is due to spawn; cleared while an event is active
    pub next_event_spawn_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MissionSession {
    pub fn new(mission_id: MissionId, party_id: PartyId, total_phases: u32) -> Self {
        Self {
            id: SessionId::new(),
            mission_id,
            party_id,
            status: SessionStatus::Waiting,
            current_phase: 1,
            total_phases,
            mission_start_time: None,
            mission_end_time: None,
            paused_at: None,
            total_paused_ms: 0,
            current_event_id: None,
            next_event_spawn_time: None,
            created_at: Utc::now(),
        }
    }

    /// Start the mission clock
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Active;
        self.mission_start_time = Some(now);
    }

    /// Pause the clock for an active event. Sets both halves of the
    /// event/pause invariant at once.
    pub fn pause_for_event(&mut self, event_id: EventId, now: DateTime<Utc>) {
        self.paused_at = Some(now);
        self.current_event_id = Some(event_id);
        self.next_event_spawn_time = None;
    }

    /// Resume the clock after the active event completes, accumulating the
    /// time it was paused.
    pub fn resume_clock(&mut self, now: DateTime<Utc>) {
        if let Some(paused_at) = self.paused_at.take() {
            self.total_paused_ms += (now - paused_at).num_milliseconds().max(0);
        }
        self.current_event_id = None;
    }

    /// True iff the event/pause invariant holds: an active event exists
    /// exactly when the clock is paused.
    pub fn clock_consistent(&self) -> bool {
        self.current_event_id.is_some() == self.paused_at.is_some()
    }

    /// Mission time elapsed, excluding paused time
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let Some(start) = self.mission_start_time else {
            return Duration::zero();
        };
        let end = self.mission_end_time.unwrap_or_else(|| self.paused_at.unwrap_or(now));
        (end - start) - Duration::milliseconds(self.total_paused_ms)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn is_final_phase(&self) -> bool {
        self.current_phase >= self.total_phases
    }

    pub fn complete(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Completed;
        self.mission_end_time = Some(now);
        self.next_event_spawn_time = None;
    }

    pub fn fail(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Failed;
        self.mission_end_time = Some(now);
        self.next_event_spawn_time = None;
    }

    pub fn abandon(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Abandoned;
        self.mission_end_time = Some(now);
        self.next_event_spawn_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> MissionSession {
        MissionSession::new(MissionId::new(), PartyId::new(), 3)
    }

    #[test]
    fn pause_and_resume_preserve_clock_invariant() {
        let mut s = session();
        let t0 = Utc::now();
        s.start(t0);
        assert!(s.clock_consistent());

        let event_id = EventId::new();
        s.pause_for_event(event_id, t0 + Duration::seconds(10));
        assert!(s.clock_consistent());
        assert_eq!(s.current_event_id, Some(event_id));
        assert!(s.paused_at.is_some());

        s.resume_clock(t0 + Duration::seconds(25));
        assert!(s.clock_consistent());
        assert_eq!(s.current_event_id, None);
        assert_eq!(s.total_paused_ms, 15_000);
    }

    #[test]
    fn elapsed_excludes_paused_time() {
        let mut s = session();
        let t0 = Utc::now();
        s.start(t0);
        s.pause_for_event(EventId::new(), t0 + Duration::seconds(30));
        s.resume_clock(t0 + Duration::seconds(50));

        let elapsed = s.elapsed(t0 + Duration::seconds(60));
        assert_eq!(elapsed, Duration::seconds(40));
    }

    #[test]
    fn terminal_statuses_clear_spawn_time() {
        let mut s = session();
        s.start(Utc::now());
        s.next_event_spawn_time = Some(Utc::now());
        s.abandon(Utc::now());
        assert!(s.status.is_terminal());
        assert!(s.next_event_spawn_time.is_none());
    }
}
