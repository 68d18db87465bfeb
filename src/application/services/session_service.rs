//! Session orchestrator - mission clock and event lifecycle
//!
//! The orchestrator owns the mission clock: it schedules the next random
//! event through an explicit priority-queue scheduler keyed by
//! `(due_at, session_id)`, pauses the clock while an event is active, and
//! drives the phase controller across phase boundaries. All party input
//! enters through it, so every mutation happens under the per-session lock.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::application::dto::{DropView, EventView, SessionView};
use crate::application::error::{CoreError, CoreResult};
use crate::application::ports::outbound::{CatalogPort, CharacterStatsPort, PartyPort};
use crate::application::services::combat_service::{AttackReport, CombatEngine};
use crate::application::services::loot_service::{currency_drop, LootDistributionEngine};
use crate::application::services::phase_service::PhaseController;
use crate::domain::aggregates::MissionRuntime;
use crate::domain::entities::{
    CombatOutcome, DungeonEvent, EventPayload, EventTemplate, EventType, GuardOutcome, LootDrop,
    LootMode, MemberKind, MissionSession, PhaseStatus, RollKind,
};
use crate::domain::value_objects::{
    CharacterId, DropId, EventId, MissionId, MonsterId, PartyId, SessionId,
};
use crate::infrastructure::state::SessionRegistry;

/// Retry delay after a skipped spawn (no compatible template)
const SPAWN_RETRY_SECS: i64 = 2;

/// One pending spawn check, ordered by due time (earliest first out)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SpawnEntry {
    due_at: DateTime<Utc>,
    session_id: SessionId,
}

impl Ord for SpawnEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the earliest due first
        other
            .due_at
            .cmp(&self.due_at)
            .then_with(|| other.session_id.as_uuid().cmp(self.session_id.as_uuid()))
    }
}

impl PartialOrd for SpawnEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of pending spawn checks across all sessions
#[derive(Debug, Default)]
struct SpawnScheduler {
    heap: BinaryHeap<SpawnEntry>,
}

impl SpawnScheduler {
    fn push(&mut self, due_at: DateTime<Utc>, session_id: SessionId) {
        self.heap.push(SpawnEntry { due_at, session_id });
    }

    /// Pop every entry due at or before `now`
    fn due(&mut self, now: DateTime<Utc>) -> Vec<SessionId> {
        let mut out = Vec::new();
        while let Some(entry) = self.heap.peek() {
            if entry.due_at > now {
                break;
            }
            out.push(self.heap.pop().expect("peeked").session_id);
        }
        out
    }
}

pub struct SessionOrchestrator {
    registry: Arc<SessionRegistry>,
    catalog: Arc<dyn CatalogPort>,
    parties: Arc<dyn PartyPort>,
    characters: Arc<dyn CharacterStatsPort>,
    combat: Arc<CombatEngine>,
    phases: Arc<PhaseController>,
    loot: Arc<LootDistributionEngine>,
    scheduler: StdMutex<SpawnScheduler>,
    /// Terminal sessions are dropped from the registry after this window
    cleanup_after: chrono::Duration,
}

impl SessionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<SessionRegistry>,
        catalog: Arc<dyn CatalogPort>,
        parties: Arc<dyn PartyPort>,
        characters: Arc<dyn CharacterStatsPort>,
        combat: Arc<CombatEngine>,
        phases: Arc<PhaseController>,
        loot: Arc<LootDistributionEngine>,
        cleanup_after_secs: u64,
    ) -> Self {
        Self {
            registry,
            catalog,
            parties,
            characters,
            combat,
            phases,
            loot,
            scheduler: StdMutex::new(SpawnScheduler::default()),
            cleanup_after: chrono::Duration::seconds(cleanup_after_secs as i64),
        }
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Resolve the mission template and party roster, create the session
    /// ACTIVE on phase 1 and schedule the first spawn.
    pub async fn start_session(
        &self,
        mission_id: MissionId,
        party_id: PartyId,
    ) -> CoreResult<SessionView> {
        let mission = self
            .catalog
            .mission_template(mission_id)
            .await?
            .ok_or_else(|| CoreError::not_found("mission", mission_id))?;
        let party = self
            .parties
            .roster(party_id)
            .await?
            .ok_or_else(|| CoreError::not_found("party", party_id))?;
        if party.player_count() == 0 {
            return Err(CoreError::invalid_state(
                "a session needs at least one player member",
            ));
        }
        if mission.total_phases == 0 {
            return Err(CoreError::invalid_state("mission template has no phases"));
        }

        let now = Utc::now();
        let mut session = MissionSession::new(mission.id, party.party_id, mission.total_phases);
        session.start(now);
        let mut runtime = MissionRuntime::new(session, mission, party);
        if let Some(phase) = runtime.current_phase_mut() {
            phase.activate();
        }

        let mut rng = StdRng::from_entropy();
        self.schedule_next_spawn(&mut runtime, &mut rng, now);

        let view = SessionView::from_runtime(&runtime, now);
        let session_id = runtime.id();
        self.registry.insert(runtime).await;
        tracing::info!(%session_id, %mission_id, %party_id, "mission session started");
        Ok(view)
    }

    pub async fn session_view(&self, session_id: SessionId) -> CoreResult<SessionView> {
        let handle = self.runtime(session_id).await?;
        let runtime = handle.lock().await;
        Ok(SessionView::from_runtime(&runtime, Utc::now()))
    }

    pub async fn event_view(&self, session_id: SessionId) -> CoreResult<EventView> {
        let handle = self.runtime(session_id).await?;
        let runtime = handle.lock().await;
        let event = runtime
            .active_event()
            .ok_or_else(|| CoreError::not_found("active event", session_id))?;
        Ok(EventView::new(event, runtime.combat.as_ref()))
    }

    pub async fn loot_views(&self, session_id: SessionId) -> CoreResult<Vec<DropView>> {
        let handle = self.runtime(session_id).await?;
        let runtime = handle.lock().await;
        Ok(DropView::from_runtime(&runtime))
    }

    /// Abandon the session: terminal state, no further spawn checks, the
    /// registry entry expires after the cleanup window.
    pub async fn abandon_session(
        &self,
        session_id: SessionId,
        character_id: CharacterId,
    ) -> CoreResult<()> {
        let handle = self.runtime(session_id).await?;
        let mut runtime = handle.lock().await;
        if character_id != runtime.party.leader_id {
            return Err(CoreError::unauthorized(
                "only the party leader may abandon the mission",
            ));
        }
        if !runtime.session.is_active() {
            return Err(CoreError::invalid_state("session is not active"));
        }
        runtime.session.abandon(Utc::now());
        tracing::info!(%session_id, "session abandoned");
        Ok(())
    }

    // ========================================================================
    // Spawn scheduling
    // ========================================================================

    /// Pick a uniformly random interval inside the mission's bounds and
    /// queue the spawn check.
    fn schedule_next_spawn<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        rng: &mut R,
        now: DateTime<Utc>,
    ) {
        let min = runtime.mission.spawn_interval_min_secs;
        let max = runtime.mission.spawn_interval_max_secs.max(min);
        let interval = rng.gen_range(min..=max);
        let due_at = now + chrono::Duration::seconds(interval as i64);
        runtime.session.next_event_spawn_time = Some(due_at);
        self.scheduler
            .lock()
            .expect("scheduler lock poisoned")
            .push(due_at, runtime.id());
        tracing::debug!(session_id = %runtime.id(), interval, "next event spawn scheduled");
    }

    /// True iff the session is ACTIVE, no event is active, the phase is open
    /// for spawning, and the spawn time has come. An unset spawn time is
    /// lazily initialized and the spawn deferred to the next check, which
    /// prevents instant-spawn races.
    fn check_spawn_due<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> bool {
        if !runtime.session.is_active() || runtime.session.current_event_id.is_some() {
            return false;
        }
        let phase_open = runtime
            .current_phase()
            .map(|p| p.status == PhaseStatus::Active && !p.boundary_ready())
            .unwrap_or(false);
        if !phase_open {
            return false;
        }
        match runtime.session.next_event_spawn_time {
            Some(due_at) => now >= due_at,
            None => {
                self.schedule_next_spawn(runtime, rng, now);
                false
            }
        }
    }

    /// Spawn a new event: weighted type draw, template selection, payload
    /// generation, clock pause. A template miss is logged and deferred to
    /// the next tick, never surfaced.
    async fn spawn_event<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<EventId>> {
        if !runtime.session.is_active() || runtime.session.current_event_id.is_some() {
            return Ok(None);
        }
        let difficulty = runtime.mission.difficulty;
        let event_type = draw_event_type(difficulty, rng);

        let templates = self.catalog.event_templates().await?;
        let compatible: Vec<&EventTemplate> = templates
            .iter()
            .filter(|t| t.event_type == event_type && t.difficulty <= difficulty)
            .collect();
        let Some(template) = compatible.choose(rng).copied() else {
            tracing::warn!(
                session_id = %runtime.id(),
                ?event_type,
                difficulty,
                "no compatible event template, spawn skipped"
            );
            self.scheduler
                .lock()
                .expect("scheduler lock poisoned")
                .push(now + chrono::Duration::seconds(SPAWN_RETRY_SECS), runtime.id());
            return Ok(None);
        };

        let payload = generate_payload(template, difficulty, rng);
        let event = DungeonEvent::new(
            runtime.id(),
            template.id,
            event_type,
            payload,
            template.time_limit_secs,
            now,
        );
        let event_id = event.id;
        runtime.session.pause_for_event(event_id, now);
        runtime.events.insert(event_id, event);

        if event_type.is_combat() {
            let event = runtime.events[&event_id].clone();
            if let Err(e) = self.combat.begin_combat(runtime, &event, rng, now).await {
                // Unwind: the clock must not stay paused for a dead event
                tracing::warn!(session_id = %runtime.id(), error = %e, "combat setup failed, spawn skipped");
                runtime.events.remove(&event_id);
                runtime.session.resume_clock(now);
                self.scheduler
                    .lock()
                    .expect("scheduler lock poisoned")
                    .push(now + chrono::Duration::seconds(SPAWN_RETRY_SECS), runtime.id());
                return Ok(None);
            }
        }
        tracing::info!(
            session_id = %runtime.id(),
            %event_id,
            event_type = event_type.display_name(),
            "event spawned, clock paused"
        );
        Ok(Some(event_id))
    }

    /// Mark the active event completed, accumulate paused time, reschedule,
    /// and hand phase boundaries to the phase controller.
    async fn complete_event<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if let Some(event) = runtime.active_event_mut() {
            event.complete(now);
        }
        runtime.session.resume_clock(now);
        if let Some(phase) = runtime.current_phase_mut() {
            phase.record_event_completed();
        }

        if !runtime.session.is_active() {
            return Ok(());
        }
        let boundary = runtime
            .current_phase()
            .map(|p| p.boundary_ready())
            .unwrap_or(false);
        if boundary {
            // Final-phase boundaries complete the mission; earlier ones wait
            // for the rest choice
            self.phases.handle_phase_boundary(runtime, rng, now).await?;
        } else {
            self.schedule_next_spawn(runtime, rng, now);
        }
        Ok(())
    }

    // ========================================================================
    // Player input
    // ========================================================================

    /// Submit a non-combat event action. The event completes once every
    /// player member has acted.
    pub async fn submit_event_action(
        &self,
        session_id: SessionId,
        character_id: CharacterId,
        action: String,
    ) -> CoreResult<EventView> {
        let handle = self.runtime(session_id).await?;
        let mut runtime = handle.lock().await;
        self.ensure_player(&runtime, character_id)?;
        let now = Utc::now();

        let event = runtime
            .active_event_mut()
            .ok_or_else(|| CoreError::invalid_state("no active event"))?;
        let event_id = event.id;
        if event.event_type.is_combat() {
            return Err(CoreError::invalid_state(
                "combat events take attack and guard submissions",
            ));
        }
        if !event.record_action(character_id, action, now) {
            return Err(CoreError::invalid_state(
                "character already acted on this event",
            ));
        }

        let all_acted = {
            let event = runtime
                .events
                .get(&event_id)
                .ok_or_else(|| CoreError::not_found("event", event_id))?;
            runtime
                .party
                .player_members()
                .all(|m| event.has_action_from(m.character_id))
        };
        if all_acted {
            let mut rng = StdRng::from_entropy();
            self.resolve_event_effects(&mut runtime, now).await?;
            self.complete_event(&mut runtime, &mut rng, now).await?;
        }

        let event = runtime
            .events
            .get(&event_id)
            .ok_or_else(|| CoreError::not_found("event", event_id))?;
        Ok(EventView::new(event, runtime.combat.as_ref()))
    }

    /// Player attack against a monster in the active combat
    pub async fn submit_attack(
        &self,
        session_id: SessionId,
        attacker: CharacterId,
        target: MonsterId,
    ) -> CoreResult<AttackReport> {
        let handle = self.runtime(session_id).await?;
        let mut runtime = handle.lock().await;
        self.ensure_member(&runtime, attacker)?;
        let now = Utc::now();
        let mut rng = StdRng::from_entropy();

        let mut state = runtime
            .combat
            .take()
            .ok_or_else(|| CoreError::invalid_state("no combat in progress"))?;
        let report = match self.combat.submit_attack(&mut state, attacker, target, &mut rng) {
            Ok(report) => report,
            Err(e) => {
                runtime.combat = Some(state);
                return Err(e);
            }
        };
        runtime.combat = Some(state);
        self.settle_combat_if_over(&mut runtime, &mut rng, now).await?;
        Ok(report)
    }

    /// Block/parry input against a telegraphed monster attack
    pub async fn submit_guard(
        &self,
        session_id: SessionId,
        defender: CharacterId,
        monster: MonsterId,
    ) -> CoreResult<GuardOutcome> {
        let handle = self.runtime(session_id).await?;
        let mut runtime = handle.lock().await;
        self.ensure_member(&runtime, defender)?;
        let now = Utc::now();
        let state = runtime
            .combat
            .as_mut()
            .ok_or_else(|| CoreError::invalid_state("no combat in progress"))?;
        self.combat.submit_guard(state, defender, monster, now)
    }

    /// Revive a downed party member mid-combat
    pub async fn revive(
        &self,
        session_id: SessionId,
        reviver: CharacterId,
        target: CharacterId,
    ) -> CoreResult<i32> {
        let handle = self.runtime(session_id).await?;
        let mut runtime = handle.lock().await;
        self.ensure_member(&runtime, reviver)?;
        let state = runtime
            .combat
            .as_mut()
            .ok_or_else(|| CoreError::invalid_state("no combat in progress"))?;
        self.combat.revive(state, reviver, target)
    }

    /// Rest-or-continue choice at a phase boundary
    pub async fn choose_rest(
        &self,
        session_id: SessionId,
        chooser: CharacterId,
        rest: bool,
    ) -> CoreResult<SessionView> {
        let handle = self.runtime(session_id).await?;
        let mut runtime = handle.lock().await;
        let now = Utc::now();
        self.phases
            .choose_rest(&mut runtime, chooser, rest, now)
            .await?;
        if !rest {
            // Continuing opens the next phase immediately
            let mut rng = StdRng::from_entropy();
            self.schedule_next_spawn(&mut runtime, &mut rng, now);
        }
        Ok(SessionView::from_runtime(&runtime, now))
    }

    /// NEED/GREED roll against a pending drop
    pub async fn submit_loot_roll(
        &self,
        session_id: SessionId,
        drop_id: DropId,
        character_id: CharacterId,
        kind: RollKind,
    ) -> CoreResult<Option<CharacterId>> {
        let handle = self.runtime(session_id).await?;
        let mut runtime = handle.lock().await;
        let mut rng = StdRng::from_entropy();
        self.loot
            .submit_roll(&mut runtime, drop_id, character_id, kind, &mut rng)
            .await
    }

    /// Master-looter manual assignment
    pub async fn assign_loot(
        &self,
        session_id: SessionId,
        drop_id: DropId,
        assigner: CharacterId,
        recipient: CharacterId,
    ) -> CoreResult<()> {
        let handle = self.runtime(session_id).await?;
        let mut runtime = handle.lock().await;
        self.loot
            .assign_manually(&mut runtime, drop_id, assigner, recipient)
            .await
    }

    // ========================================================================
    // Background tick
    // ========================================================================

    /// One orchestrator tick: due spawn checks, monster attack resolution,
    /// event expiry, rest completion and registry cleanup.
    pub async fn tick(&self, now: DateTime<Utc>) {
        let due = {
            let mut scheduler = self.scheduler.lock().expect("scheduler lock poisoned");
            scheduler.due(now)
        };
        for session_id in due {
            if let Some(handle) = self.registry.get(session_id).await {
                let mut runtime = handle.lock().await;
                let mut rng = StdRng::from_entropy();
                if self.check_spawn_due(&mut runtime, &mut rng, now) {
                    if let Err(e) = self.spawn_event(&mut runtime, &mut rng, now).await {
                        tracing::warn!(%session_id, error = %e, "spawn attempt failed");
                    }
                }
            }
        }

        for session_id in self.registry.ids().await {
            let Some(handle) = self.registry.get(session_id).await else {
                continue;
            };
            let mut runtime = handle.lock().await;
            if let Err(e) = self.drive_session(&mut runtime, now).await {
                tracing::warn!(%session_id, error = %e, "session tick failed");
            }

            let expired = runtime.session.status.is_terminal()
                && runtime
                    .session
                    .mission_end_time
                    .map(|end| now >= end + self.cleanup_after)
                    .unwrap_or(false);
            if expired {
                drop(runtime);
                self.registry.remove(session_id).await;
                tracing::debug!(%session_id, "terminal session cleaned up");
            }
        }
    }

    /// Per-session tick work behind the session lock
    async fn drive_session(
        &self,
        runtime: &mut MissionRuntime,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !runtime.session.is_active() {
            return Ok(());
        }
        let mut rng = StdRng::from_entropy();

        // Monster attacks in the active combat
        if let Some(mut state) = runtime.combat.take() {
            let reports = self.combat.resolve_due_attacks(&mut state, &mut rng, now);
            for r in &reports {
                tracing::debug!(
                    monster_id = %r.monster_id,
                    defender = %r.defender_id,
                    damage = r.damage,
                    guard = ?r.guard,
                    "monster attack resolved"
                );
            }
            runtime.combat = Some(state);
            self.settle_combat_if_over(runtime, &mut rng, now).await?;
        }

        // Expired non-combat events are auto-skipped: submitted actions
        // count, absent ones are treated as no action
        let expired = runtime
            .active_event()
            .map(|e| !e.event_type.is_combat() && e.is_expired(now))
            .unwrap_or(false);
        if expired {
            tracing::info!(session_id = %runtime.id(), "event time limit elapsed, auto-skipping");
            self.resolve_event_effects(runtime, now).await?;
            self.complete_event(runtime, &mut rng, now).await?;
        }

        // A finished rest opens the next phase
        if self.phases.finish_rest_if_over(runtime, now) {
            self.schedule_next_spawn(runtime, &mut rng, now);
        }
        Ok(())
    }

    // ========================================================================
    // Event resolution
    // ========================================================================

    /// Apply the payload's mechanical effects when a non-combat event
    /// resolves.
    async fn resolve_event_effects(
        &self,
        runtime: &mut MissionRuntime,
        _now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let Some(event) = runtime.active_event() else {
            return Ok(());
        };
        let payload = event.payload.clone();
        let acted: Vec<CharacterId> = event.actions.iter().map(|a| a.character_id).collect();

        match payload {
            EventPayload::Treasure { gold, items } => {
                currency_drop(runtime, gold);
                for item in items {
                    runtime.drops.push(LootDrop::item(
                        runtime.id(),
                        item.item_id,
                        item.quantity,
                        LootMode::Auto,
                    ));
                }
                self.loot.distribute(runtime).await?;
            }
            EventPayload::Trap { damage } | EventPayload::EnvironmentalHazard { damage } => {
                // Reacting halves the damage; traps never kill outright
                for member in runtime.party.members.clone() {
                    if member.kind != MemberKind::Player {
                        continue;
                    }
                    let taken = if acted.contains(&member.character_id) {
                        damage / 2
                    } else {
                        damage
                    };
                    if let Some(stats) =
                        self.characters.stat_snapshot(member.character_id).await?
                    {
                        let health = (stats.health - taken).max(1);
                        self.characters
                            .write_back_health(member.character_id, health)
                            .await?;
                    }
                }
            }
            EventPayload::Rest { heal_fraction } => {
                for member in runtime.party.members.clone() {
                    if let Some(stats) =
                        self.characters.stat_snapshot(member.character_id).await?
                    {
                        let heal = ((stats.max_health as f64 * heal_fraction).floor() as i32)
                            .min(stats.max_health - stats.health);
                        if heal > 0 {
                            self.characters
                                .write_back_health(member.character_id, stats.health + heal)
                                .await?;
                        }
                    }
                }
            }
            EventPayload::Puzzle { .. }
            | EventPayload::Choice { .. }
            | EventPayload::BetrayalOpportunity { .. }
            | EventPayload::NpcEncounter { .. } => {
                // Narrative-only events: actions are recorded, nothing
                // mechanical changes
            }
            EventPayload::Combat { .. } | EventPayload::Boss { .. } => {}
        }
        Ok(())
    }

    /// If the active combat has a terminal outcome: write health back,
    /// update the phase roster, drop victory gold and settle the event.
    async fn settle_combat_if_over<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let Some(outcome) = runtime.combat.as_ref().and_then(|s| self.combat.outcome(s)) else {
            return Ok(());
        };
        let state = runtime.combat.take().expect("outcome checked");
        let result = self.combat.finish(&state, outcome, now);

        // Final health is the only thing written back to character records
        for p in &state.participants {
            self.characters
                .write_back_health(p.character_id, p.stats.health)
                .await?;
        }
        if let Some(phase) = runtime.current_phase_mut() {
            for m in &state.monsters {
                if let Some(record) = phase.roster.iter_mut().find(|r| r.monster_id == m.id) {
                    record.health = m.health;
                    record.defeated = !m.is_alive();
                }
            }
        }
        tracing::info!(
            session_id = %runtime.id(),
            ?outcome,
            monsters_defeated = result.counters.monsters_defeated,
            elapsed_ms = result.elapsed_ms,
            "combat resolved"
        );

        match outcome {
            CombatOutcome::Victory => {
                let gold = match runtime
                    .active_event()
                    .map(|e| e.payload.clone())
                {
                    Some(EventPayload::Combat { gold_reward, .. })
                    | Some(EventPayload::Boss { gold_reward, .. }) => gold_reward,
                    _ => 0,
                };
                currency_drop(runtime, gold);
                self.loot.distribute(runtime).await?;
                self.complete_event(runtime, rng, now).await?;
            }
            CombatOutcome::Defeat => {
                if let Some(event) = runtime.active_event_mut() {
                    event.complete(now);
                }
                runtime.session.resume_clock(now);
                self.phases.fail_mission(runtime, now);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn runtime(
        &self,
        session_id: SessionId,
    ) -> CoreResult<Arc<tokio::sync::Mutex<MissionRuntime>>> {
        self.registry
            .get(session_id)
            .await
            .ok_or_else(|| CoreError::not_found("session", session_id))
    }

    fn ensure_member(&self, runtime: &MissionRuntime, character_id: CharacterId) -> CoreResult<()> {
        if runtime.party.is_member(character_id) {
            Ok(())
        } else {
            Err(CoreError::unauthorized("not a member of this party"))
        }
    }

    fn ensure_player(&self, runtime: &MissionRuntime, character_id: CharacterId) -> CoreResult<()> {
        let is_player = runtime
            .party
            .player_members()
            .any(|m| m.character_id == character_id);
        if is_player {
            Ok(())
        } else {
            Err(CoreError::unauthorized(
                "only player members may submit event actions",
            ))
        }
    }
}

/// Weighted random draw over the difficulty's event-type table
fn draw_event_type<R: Rng>(difficulty: u32, rng: &mut R) -> EventType {
    let weights: Vec<(EventType, u32)> = EventType::ALL
        .iter()
        .map(|ty| (*ty, ty.spawn_weight(difficulty)))
        .filter(|(_, w)| *w > 0)
        .collect();
    let total: u32 = weights.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (ty, weight) in &weights {
        if roll < *weight {
            return *ty;
        }
        roll -= weight;
    }
    // Unreachable with a positive total; fall back to plain combat
    EventType::Combat
}

/// Difficulty-scaled payload generation for a chosen template
fn generate_payload<R: Rng>(
    template: &EventTemplate,
    difficulty: u32,
    rng: &mut R,
) -> EventPayload {
    let d = difficulty.max(1);
    match template.event_type {
        EventType::Combat => EventPayload::Combat {
            monster_count: 1 + d / 2 + rng.gen_range(0..=1),
            pool: template.monster_pool.clone(),
            gold_reward: (15 * d as u64) + rng.gen_range(0..=10 * d as u64),
        },
        EventType::Boss => EventPayload::Boss {
            monster_count: 1 + d / 4,
            pool: template.monster_pool.clone(),
            gold_reward: (40 * d as u64) + rng.gen_range(0..=20 * d as u64),
        },
        EventType::Treasure => EventPayload::Treasure {
            gold: (10 * d as u64) + rng.gen_range(0..=10 * d as u64),
            items: Vec::new(),
        },
        EventType::Trap => EventPayload::Trap {
            damage: (4 + 3 * d + rng.gen_range(0..=2 * d)) as i32,
        },
        EventType::Puzzle => EventPayload::Puzzle { complexity: d },
        EventType::Choice => EventPayload::Choice {
            options: vec![
                "take the narrow stair".to_string(),
                "force the rusted gate".to_string(),
            ],
        },
        EventType::Rest => EventPayload::Rest {
            heal_fraction: 0.10,
        },
        EventType::BetrayalOpportunity => EventPayload::BetrayalOpportunity {
            tempt_gold: 25 * d as u64,
        },
        EventType::NpcEncounter => {
            let names = ["wandering peddler", "lost cartographer", "gravebound monk"];
            EventPayload::NpcEncounter {
                npc_name: names.choose(rng).expect("non-empty").to_string(),
            }
        }
        EventType::EnvironmentalHazard => EventPayload::EnvironmentalHazard {
            damage: (3 + 2 * d + rng.gen_range(0..=d)) as i32,
        },
    }
}
