//! Phase controller - phase state machine, rest logic and mission completion
//!
//! Phases run Pending -> Active -> (Resting) -> Completed. The rest choice is
//! leader-initiated and only valid once the phase's event quota is met. The
//! final phase never offers a rest: its boundary goes straight through the
//! single mission-completion path, so rewards can never be granted twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::application::error::{CoreError, CoreResult};
use crate::application::ports::outbound::CharacterStatsPort;
use crate::application::services::currency_service::CurrencyLedger;
use crate::application::services::loot_service::{currency_drop, LootDistributionEngine};
use crate::domain::aggregates::MissionRuntime;
use crate::domain::entities::{LootDrop, LootMode, PhaseStatus};
use crate::domain::value_objects::CharacterId;

pub struct PhaseController {
    characters: Arc<dyn CharacterStatsPort>,
    loot: Arc<LootDistributionEngine>,
    #[allow(dead_code)] // reward gold flows through loot distribution today
    ledger: Arc<CurrencyLedger>,
}

impl PhaseController {
    pub fn new(
        characters: Arc<dyn CharacterStatsPort>,
        loot: Arc<LootDistributionEngine>,
        ledger: Arc<CurrencyLedger>,
    ) -> Self {
        Self {
            characters,
            loot,
            ledger,
        }
    }

    /// The party's binary rest-or-continue choice at a phase boundary.
    /// Resting heals everyone and imposes the mission's fixed time penalty;
    /// continuing does neither.
    pub async fn choose_rest(
        &self,
        runtime: &mut MissionRuntime,
        chooser: CharacterId,
        rest: bool,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !runtime.session.is_active() {
            return Err(CoreError::invalid_state("session is not active"));
        }
        if chooser != runtime.party.leader_id {
            return Err(CoreError::unauthorized(
                "only the party leader decides the rest choice",
            ));
        }
        if runtime.session.is_final_phase() {
            return Err(CoreError::invalid_state(
                "the final phase completes the mission directly",
            ));
        }
        let boundary_open = runtime
            .current_phase()
            .map(|p| p.boundary_ready())
            .unwrap_or(false);
        if !boundary_open {
            return Err(CoreError::invalid_state(
                "phase boundary is not open for a rest choice",
            ));
        }

        if rest {
            self.heal_party(runtime).await?;
            let duration = runtime.mission.rest_duration_secs;
            let phase = runtime.current_phase_mut().expect("boundary checked");
            phase.begin_rest(now, duration);
            tracing::info!(session_id = %runtime.id(), duration, "party rests");
        } else {
            let phase = runtime.current_phase_mut().expect("boundary checked");
            phase.complete();
            self.advance_phase(runtime);
            tracing::info!(session_id = %runtime.id(), "party continues without rest");
        }
        Ok(())
    }

    /// Apply the rest heal to every member, player and companion alike:
    /// `floor(max * 0.25) + floor(max * level * 0.01)`, capped at missing
    /// health.
    async fn heal_party(&self, runtime: &MissionRuntime) -> CoreResult<()> {
        for member in &runtime.party.members {
            let Some(stats) = self.characters.stat_snapshot(member.character_id).await? else {
                tracing::warn!(character_id = %member.character_id, "member missing during rest heal");
                continue;
            };
            let heal = stats.rest_heal_amount();
            if heal > 0 {
                self.characters
                    .write_back_health(member.character_id, stats.health + heal)
                    .await?;
            }
        }
        Ok(())
    }

    /// Finish a completed rest and advance to the next phase. Returns true
    /// when the phase advanced.
    pub fn finish_rest_if_over(&self, runtime: &mut MissionRuntime, now: DateTime<Utc>) -> bool {
        let rest_done = runtime
            .current_phase()
            .map(|p| p.rest_over(now))
            .unwrap_or(false);
        if !rest_done {
            return false;
        }
        if let Some(phase) = runtime.current_phase_mut() {
            phase.complete();
        }
        self.advance_phase(runtime);
        true
    }

    fn advance_phase(&self, runtime: &mut MissionRuntime) {
        runtime.session.current_phase += 1;
        if let Some(next) = runtime.current_phase_mut() {
            if next.status == PhaseStatus::Pending {
                next.activate();
            }
        }
    }

    /// Called after each event completes. When the final phase's boundary
    /// opens this is the one and only path into mission completion.
    pub async fn handle_phase_boundary<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let boundary_open = runtime
            .current_phase()
            .map(|p| p.boundary_ready())
            .unwrap_or(false);
        if boundary_open && runtime.session.is_final_phase() {
            self.complete_mission(runtime, rng, now).await?;
        }
        // Non-final boundaries wait for the party's rest choice
        Ok(())
    }

    /// Mission completion: session terminal, reward gold and loot-table
    /// items dropped, everything distributed per the party's loot rule.
    pub async fn complete_mission<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        if let Some(phase) = runtime.current_phase_mut() {
            phase.complete();
        }
        runtime.session.complete(now);

        currency_drop(runtime, runtime.mission.reward_gold);
        let rewards = runtime.mission.reward_items.clone();
        for entry in rewards {
            if rng.gen::<f64>() < entry.drop_chance {
                runtime.drops.push(LootDrop::item(
                    runtime.id(),
                    entry.item_id,
                    entry.quantity,
                    LootMode::Auto,
                ));
            }
        }
        self.loot.distribute(runtime).await?;
        tracing::info!(session_id = %runtime.id(), "mission completed, rewards distributed");
        Ok(())
    }

    /// Party wipe: the session fails, no rewards
    pub fn fail_mission(&self, runtime: &mut MissionRuntime, now: DateTime<Utc>) {
        runtime.session.fail(now);
        tracing::info!(session_id = %runtime.id(), "mission failed");
    }
}
