//! Combat engine - authoritative, round-free combat resolution
//!
//! Player attacks arrive as event-driven submissions; monster attacks are
//! scheduled by `next_attack_at = now + attack_interval` and telegraphed two
//! seconds before impact so defenders can block or parry. All mutation goes
//! through the per-session lock, so two simultaneous killing blows cannot
//! both count.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::application::error::{CoreError, CoreResult};
use crate::application::ports::outbound::{CatalogPort, CharacterStatsPort};
use crate::domain::aggregates::MissionRuntime;
use crate::domain::entities::{
    BlockWindow, CombatCounters, CombatOutcome, CombatParticipant, CombatResult, CombatState,
    DungeonEvent, EventPayload, GuardOutcome, Monster, PhaseMonsterRecord, TELEGRAPH_WARNING_MS,
};
use crate::domain::value_objects::{CharacterId, MonsterId, MonsterTemplateId};

/// Critical hits multiply attack by this factor
pub const CRIT_MULTIPLIER: f64 = 1.5;

/// Result of one player attack submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackReport {
    pub attacker: CharacterId,
    pub target: MonsterId,
    pub damage: i32,
    pub critical: bool,
    pub target_defeated: bool,
}

/// Result of one resolved monster attack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterAttackReport {
    pub monster_id: MonsterId,
    pub defender_id: CharacterId,
    pub damage: i32,
    pub guard: GuardOutcome,
    pub defender_downed: bool,
}

/// Base damage before guard adjustments:
/// `max(1, attack' - defense)` with `attack' = attack * 1.5` on a crit.
fn raw_damage(attack: i32, defense: i32, critical: bool) -> i32 {
    let effective = if critical {
        (attack as f64 * CRIT_MULTIPLIER).floor() as i32
    } else {
        attack
    };
    (effective - defense).max(1)
}

pub struct CombatEngine {
    characters: Arc<dyn CharacterStatsPort>,
    catalog: Arc<dyn CatalogPort>,
}

impl CombatEngine {
    pub fn new(characters: Arc<dyn CharacterStatsPort>, catalog: Arc<dyn CatalogPort>) -> Self {
        Self {
            characters,
            catalog,
        }
    }

    /// Build combat state for a combat or boss event: participants from
    /// persistent stat snapshots, monsters from catalog templates. The
    /// spawned monsters are also appended to the current phase roster.
    pub async fn begin_combat<R: Rng>(
        &self,
        runtime: &mut MissionRuntime,
        event: &DungeonEvent,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let (monster_count, pool) = match &event.payload {
            EventPayload::Combat {
                monster_count,
                pool,
                ..
            }
            | EventPayload::Boss {
                monster_count,
                pool,
                ..
            } => (*monster_count, pool.clone()),
            _ => {
                return Err(CoreError::invalid_state(
                    "event payload does not describe a combat",
                ))
            }
        };
        let pool: Vec<MonsterTemplateId> = if pool.is_empty() {
            runtime.mission.monster_pool.clone()
        } else {
            pool
        };
        if pool.is_empty() {
            return Err(CoreError::invalid_state("no monster pool for combat event"));
        }

        let mut participants = Vec::new();
        for member in &runtime.party.members {
            let stats = self
                .characters
                .stat_snapshot(member.character_id)
                .await?
                .ok_or_else(|| CoreError::not_found("character", member.character_id))?;
            participants.push(CombatParticipant::new(
                member.character_id,
                member.name.clone(),
                member.kind == crate::domain::entities::MemberKind::Companion,
                stats,
            ));
        }

        let mut monsters = Vec::new();
        for _ in 0..monster_count {
            let template_id = *pool.choose(rng).expect("pool checked non-empty");
            match self.catalog.monster_template(template_id).await? {
                Some(template) => monsters.push(Monster::from_template(&template, now)),
                None => {
                    tracing::warn!(%template_id, "monster template missing, skipping spawn");
                }
            }
        }
        if monsters.is_empty() {
            return Err(CoreError::invalid_state(
                "no monsters could be spawned for combat event",
            ));
        }

        if let Some(phase) = runtime.current_phase_mut() {
            for m in &monsters {
                phase.roster.push(PhaseMonsterRecord {
                    monster_id: m.id,
                    template_id: m.template_id,
                    name: m.name.clone(),
                    health: m.health,
                    max_health: m.max_health,
                    defeated: false,
                });
            }
        }

        runtime.combat = Some(CombatState {
            session_id: runtime.id(),
            event_id: event.id,
            started_at: now,
            participants,
            monsters,
            counters: CombatCounters::default(),
        });
        Ok(())
    }

    /// One player attack against one monster
    pub fn submit_attack<R: Rng>(
        &self,
        state: &mut CombatState,
        attacker: CharacterId,
        target: MonsterId,
        rng: &mut R,
    ) -> CoreResult<AttackReport> {
        let (attack, crit_chance) = {
            let p = state
                .participant(attacker)
                .ok_or_else(|| CoreError::not_found("combatant", attacker))?;
            if !p.alive {
                return Err(CoreError::invalid_state("dead combatants cannot attack"));
            }
            (p.stats.attack, p.stats.crit_chance)
        };

        let critical = rng.gen::<f64>() < crit_chance;
        let monster = state
            .monster_mut(target)
            .ok_or_else(|| CoreError::not_found("monster", target))?;
        if !monster.is_alive() {
            // Killing-blow guard: the first submission through the session
            // lock wins, later ones land here
            return Err(CoreError::invalid_state("monster already defeated"));
        }

        let damage = raw_damage(attack, monster.defense, critical);
        monster.health -= damage;
        let target_defeated = !monster.is_alive();
        if target_defeated {
            monster.health = 0;
            monster.telegraph = None;
        }

        state.counters.total_attacks += 1;
        state.counters.record_damage_dealt(attacker, damage);
        if target_defeated {
            state.counters.monsters_defeated += 1;
        }

        Ok(AttackReport {
            attacker,
            target,
            damage,
            critical,
            target_defeated,
        })
    }

    /// Defender input against a telegraphed attack. The first input is
    /// classified against the monster's guard windows and stored; the stored
    /// outcome is returned unchanged for any later input on the same
    /// telegraph.
    pub fn submit_guard(
        &self,
        state: &mut CombatState,
        defender: CharacterId,
        monster_id: MonsterId,
        now: DateTime<Utc>,
    ) -> CoreResult<GuardOutcome> {
        let monster = state
            .monster_mut(monster_id)
            .ok_or_else(|| CoreError::not_found("monster", monster_id))?;
        let (parry_ms, block_ms) = (monster.parry_window_ms(), monster.block_window_ms());
        let window = monster
            .telegraph
            .as_mut()
            .ok_or_else(|| CoreError::invalid_state("monster is not telegraphing an attack"))?;
        if window.defender_id != defender {
            return Err(CoreError::invalid_state(
                "this attack is aimed at another combatant",
            ));
        }
        if window.holding_block {
            return Ok(window.guard);
        }

        let time_until_ms = (window.attack_at - now).num_milliseconds();
        let outcome = if time_until_ms > 0 && time_until_ms <= parry_ms {
            GuardOutcome::Parry
        } else if time_until_ms > 0 && time_until_ms <= block_ms {
            GuardOutcome::Block
        } else {
            GuardOutcome::None
        };
        window.holding_block = true;
        window.guard = outcome;

        match outcome {
            GuardOutcome::Parry => state.counters.parries += 1,
            GuardOutcome::Block => state.counters.blocks += 1,
            GuardOutcome::None => {}
        }
        Ok(outcome)
    }

    /// Open telegraphs and resolve attacks whose time has come. Called from
    /// the orchestrator tick.
    pub fn resolve_due_attacks<R: Rng>(
        &self,
        state: &mut CombatState,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Vec<MonsterAttackReport> {
        let alive_defenders: Vec<CharacterId> = state
            .participants
            .iter()
            .filter(|p| p.alive)
            .map(|p| p.character_id)
            .collect();

        let mut reports = Vec::new();
        for idx in 0..state.monsters.len() {
            if !state.monsters[idx].is_alive() {
                continue;
            }

            // Telegraph opens TELEGRAPH_WARNING_MS before the scheduled attack
            if state.monsters[idx].telegraph.is_none() {
                let warn_at = state.monsters[idx].next_attack_at
                    - chrono::Duration::milliseconds(TELEGRAPH_WARNING_MS);
                if now >= warn_at {
                    if let Some(defender) = alive_defenders.choose(rng).copied() {
                        let attack_at = state.monsters[idx].next_attack_at;
                        state.monsters[idx].telegraph =
                            Some(BlockWindow::open(defender, attack_at, now));
                    }
                }
            }

            let due = state.monsters[idx]
                .telegraph
                .as_ref()
                .map(|w| now >= w.attack_at)
                .unwrap_or(false);
            if !due {
                continue;
            }

            // Consume the window; it must be gone before the next telegraph
            let window = state.monsters[idx].telegraph.take().expect("checked above");
            let attack = state.monsters[idx].attack;
            let interval = state.monsters[idx].attack_interval_ms;
            let monster_id = state.monsters[idx].id;
            state.monsters[idx].next_attack_at = now + chrono::Duration::milliseconds(interval);

            let Some(defender) = state.participant_mut(window.defender_id) else {
                continue;
            };
            if !defender.alive {
                continue;
            }

            let raw = raw_damage(attack, defender.stats.defense, false);
            let damage = match window.guard {
                GuardOutcome::Parry => 0,
                GuardOutcome::Block => (raw - defender.stats.block_strength).max(1),
                GuardOutcome::None => raw,
            };
            defender.apply_damage(damage);
            let defender_downed = !defender.alive;
            let defender_id = defender.character_id;

            if window.guard == GuardOutcome::Parry {
                state.counters.perfect_parries += 1;
            }
            state.counters.record_damage_received(defender_id, damage);

            reports.push(MonsterAttackReport {
                monster_id,
                defender_id,
                damage,
                guard: window.guard,
                defender_downed,
            });
        }
        reports
    }

    /// Restore a downed party member to half health. Contribution counters
    /// are untouched.
    pub fn revive(
        &self,
        state: &mut CombatState,
        reviver: CharacterId,
        target: CharacterId,
    ) -> CoreResult<i32> {
        {
            let reviver = state
                .participant(reviver)
                .ok_or_else(|| CoreError::not_found("combatant", reviver))?;
            if !reviver.alive {
                return Err(CoreError::invalid_state("dead combatants cannot revive"));
            }
        }
        let target = state
            .participant_mut(target)
            .ok_or_else(|| CoreError::not_found("combatant", target))?;
        if target.alive {
            return Err(CoreError::invalid_state("target is not down"));
        }
        let restored = (target.stats.max_health as f64 * 0.5).floor() as i32;
        target.stats.health = restored;
        target.alive = true;
        state.counters.revives += 1;
        Ok(restored)
    }

    /// Terminal outcome, if the combat has one. Defeat is checked first:
    /// a wiped party loses even if the last monster fell simultaneously.
    pub fn outcome(&self, state: &CombatState) -> Option<CombatOutcome> {
        if state.all_players_dead() {
            Some(CombatOutcome::Defeat)
        } else if state.all_monsters_dead() {
            Some(CombatOutcome::Victory)
        } else {
            None
        }
    }

    pub fn finish(&self, state: &CombatState, outcome: CombatOutcome, now: DateTime<Utc>) -> CombatResult {
        CombatResult {
            outcome,
            elapsed_ms: (now - state.started_at).num_milliseconds(),
            counters: state.counters.clone(),
            contribution: state.contribution_shares(),
        }
    }

    /// Serialize mid-combat state so an interrupted session can resume
    /// without re-simulating prior attacks
    pub fn snapshot(&self, state: &CombatState) -> CoreResult<String> {
        serde_json::to_string(state)
            .map_err(|e| CoreError::invalid_state(format!("combat state not serializable: {e}")))
    }

    pub fn restore(&self, raw: &str) -> CoreResult<CombatState> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::invalid_state(format!("combat snapshot unreadable: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::domain::entities::{MonsterRarity, MonsterTemplate};
    use crate::domain::value_objects::{EventId, SessionId, StatSnapshot};
    use crate::infrastructure::persistence::{InMemoryCatalog, InMemoryCharacterDirectory};

    fn engine() -> CombatEngine {
        CombatEngine::new(
            Arc::new(InMemoryCharacterDirectory::new()),
            Arc::new(InMemoryCatalog::new()),
        )
    }

    fn snapshot(attack: i32, defense: i32, block_strength: i32, crit_chance: f64) -> StatSnapshot {
        StatSnapshot {
            health: 100,
            max_health: 100,
            attack,
            defense,
            agility: 5,
            block_strength,
            level: 3,
            crit_chance,
        }
    }

    fn monster(attack: i32, defense: i32, interval_ms: i64, now: DateTime<Utc>) -> Monster {
        let template = MonsterTemplate {
            id: MonsterTemplateId::new(),
            name: "Gloomfang".into(),
            health: 60,
            attack,
            defense,
            attack_interval_ms: interval_ms,
            rarity: MonsterRarity::Common,
            is_boss: false,
            difficulty: 2,
        };
        Monster::from_template(&template, now)
    }

    fn combat_state(
        participants: Vec<CombatParticipant>,
        monsters: Vec<Monster>,
        now: DateTime<Utc>,
    ) -> CombatState {
        CombatState {
            session_id: SessionId::new(),
            event_id: EventId::new(),
            started_at: now,
            participants,
            monsters,
            counters: CombatCounters::default(),
        }
    }

    #[test]
    fn damage_is_attack_minus_defense_with_floor_one() {
        assert_eq!(raw_damage(20, 5, false), 15);
        assert_eq!(raw_damage(3, 50, false), 1);
        // crit: floor(20 * 1.5) - 5 = 25
        assert_eq!(raw_damage(20, 5, true), 25);
    }

    #[test]
    fn player_attack_applies_formula_and_tracks_contribution() {
        let engine = engine();
        let now = Utc::now();
        let who = CharacterId::new();
        let mut state = combat_state(
            vec![CombatParticipant::new(
                who,
                "Aria",
                false,
                snapshot(20, 0, 0, 0.0),
            )],
            vec![monster(10, 5, 3000, now)],
            now,
        );
        let target = state.monsters[0].id;
        let mut rng = StdRng::seed_from_u64(0);

        let report = engine.submit_attack(&mut state, who, target, &mut rng).unwrap();
        assert_eq!(report.damage, 15);
        assert!(!report.critical);
        assert_eq!(state.counters.damage_dealt[&who], 15);
        assert_eq!(state.counters.total_attacks, 1);
    }

    #[test]
    fn guaranteed_crit_multiplies_attack() {
        let engine = engine();
        let now = Utc::now();
        let who = CharacterId::new();
        let mut state = combat_state(
            vec![CombatParticipant::new(
                who,
                "Aria",
                false,
                snapshot(20, 0, 0, 1.0),
            )],
            vec![monster(10, 5, 3000, now)],
            now,
        );
        let target = state.monsters[0].id;
        let mut rng = StdRng::seed_from_u64(0);

        let report = engine.submit_attack(&mut state, who, target, &mut rng).unwrap();
        assert!(report.critical);
        assert_eq!(report.damage, 25);
    }

    #[test]
    fn second_killing_blow_is_rejected() {
        let engine = engine();
        let now = Utc::now();
        let a = CharacterId::new();
        let b = CharacterId::new();
        let mut state = combat_state(
            vec![
                CombatParticipant::new(a, "Aria", false, snapshot(100, 0, 0, 0.0)),
                CombatParticipant::new(b, "Bram", false, snapshot(100, 0, 0, 0.0)),
            ],
            vec![monster(10, 5, 3000, now)],
            now,
        );
        let target = state.monsters[0].id;
        let mut rng = StdRng::seed_from_u64(0);

        let first = engine.submit_attack(&mut state, a, target, &mut rng).unwrap();
        assert!(first.target_defeated);
        let err = engine.submit_attack(&mut state, b, target, &mut rng).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
        assert_eq!(state.counters.monsters_defeated, 1);
    }

    #[test]
    fn guard_classification_follows_the_windows() {
        let engine = engine();
        let now = Utc::now();
        let who = CharacterId::new();
        // interval 3000ms: parry window 500ms, block window 1500ms
        let mut m = monster(20, 0, 3000, now);
        let attack_at = now + chrono::Duration::milliseconds(2000);
        m.telegraph = Some(BlockWindow::open(who, attack_at, now));
        let mut state = combat_state(
            vec![CombatParticipant::new(
                who,
                "Aria",
                false,
                snapshot(10, 5, 8, 0.0),
            )],
            vec![m],
            now,
        );
        let monster_id = state.monsters[0].id;

        // 1800ms before impact: outside both windows
        let outcome = engine
            .submit_guard(&mut state, who, monster_id, now + chrono::Duration::milliseconds(200))
            .unwrap();
        assert_eq!(outcome, GuardOutcome::None);

        // Fresh telegraph, input 1000ms before impact: block
        state.monsters[0].telegraph = Some(BlockWindow::open(who, attack_at, now));
        let outcome = engine
            .submit_guard(&mut state, who, monster_id, now + chrono::Duration::milliseconds(1000))
            .unwrap();
        assert_eq!(outcome, GuardOutcome::Block);

        // Fresh telegraph, input 400ms before impact: parry
        state.monsters[0].telegraph = Some(BlockWindow::open(who, attack_at, now));
        let outcome = engine
            .submit_guard(&mut state, who, monster_id, now + chrono::Duration::milliseconds(1600))
            .unwrap();
        assert_eq!(outcome, GuardOutcome::Parry);

        // The stored classification is returned unchanged for later inputs
        let again = engine
            .submit_guard(&mut state, who, monster_id, now + chrono::Duration::milliseconds(1999))
            .unwrap();
        assert_eq!(again, GuardOutcome::Parry);
        assert_eq!(state.counters.parries, 1);
    }

    #[test]
    fn block_subtracts_block_strength_and_parry_negates() {
        let engine = engine();
        let now = Utc::now();
        let who = CharacterId::new();
        // attack 20 vs defense 5: raw damage 15
        let mut m = monster(20, 0, 3000, now);
        m.next_attack_at = now + chrono::Duration::milliseconds(1000);
        m.telegraph = Some(BlockWindow::open(who, m.next_attack_at, now));
        let mut state = combat_state(
            vec![CombatParticipant::new(
                who,
                "Aria",
                false,
                snapshot(10, 5, 8, 0.0),
            )],
            vec![m],
            now,
        );
        let monster_id = state.monsters[0].id;
        let mut rng = StdRng::seed_from_u64(0);

        // Unguarded resolution: full 15
        let reports =
            engine.resolve_due_attacks(&mut state, &mut rng, now + chrono::Duration::milliseconds(1000));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].damage, 15);
        assert_eq!(state.participants[0].stats.health, 85);
        assert!(state.monsters[0].telegraph.is_none());

        // Blocked: max(1, 15 - 8) = 7
        state.monsters[0].telegraph = Some(BlockWindow {
            defender_id: who,
            warning_started_at: now,
            attack_at: now + chrono::Duration::milliseconds(1200),
            holding_block: true,
            guard: GuardOutcome::Block,
        });
        let reports = engine.resolve_due_attacks(
            &mut state,
            &mut rng,
            now + chrono::Duration::milliseconds(1200),
        );
        assert_eq!(reports[0].damage, 7);
        assert_eq!(reports[0].guard, GuardOutcome::Block);

        // Parried: zero regardless of attacker stats
        state.monsters[0].attack = 999;
        state.monsters[0].telegraph = Some(BlockWindow {
            defender_id: who,
            warning_started_at: now,
            attack_at: now + chrono::Duration::milliseconds(1400),
            holding_block: true,
            guard: GuardOutcome::Parry,
        });
        let reports = engine.resolve_due_attacks(
            &mut state,
            &mut rng,
            now + chrono::Duration::milliseconds(1400),
        );
        assert_eq!(reports[0].damage, 0);
        assert_eq!(state.counters.perfect_parries, 1);
    }

    #[test]
    fn telegraph_opens_inside_warning_window() {
        let engine = engine();
        let now = Utc::now();
        let who = CharacterId::new();
        let mut m = monster(10, 0, 5000, now);
        m.next_attack_at = now + chrono::Duration::milliseconds(5000);
        let mut state = combat_state(
            vec![CombatParticipant::new(
                who,
                "Aria",
                false,
                snapshot(10, 5, 0, 0.0),
            )],
            vec![m],
            now,
        );
        let mut rng = StdRng::seed_from_u64(0);

        // 2500ms out: too early to telegraph
        engine.resolve_due_attacks(&mut state, &mut rng, now + chrono::Duration::milliseconds(2500));
        assert!(state.monsters[0].telegraph.is_none());

        // 3200ms in: inside the 2s warning
        engine.resolve_due_attacks(&mut state, &mut rng, now + chrono::Duration::milliseconds(3200));
        let window = state.monsters[0].telegraph.as_ref().unwrap();
        assert_eq!(window.defender_id, who);
        assert_eq!(window.guard, GuardOutcome::None);
    }

    #[test]
    fn revive_restores_half_health_and_keeps_contribution() {
        let engine = engine();
        let now = Utc::now();
        let reviver = CharacterId::new();
        let downed = CharacterId::new();
        let mut stats = snapshot(10, 0, 0, 0.0);
        stats.health = 0;
        let mut state = combat_state(
            vec![
                CombatParticipant::new(reviver, "Aria", false, snapshot(10, 0, 0, 0.0)),
                CombatParticipant::new(downed, "Bram", false, stats),
            ],
            vec![monster(10, 0, 3000, now)],
            now,
        );
        state.counters.record_damage_dealt(downed, 42);

        let restored = engine.revive(&mut state, reviver, downed).unwrap();
        assert_eq!(restored, 50);
        let target = state.participant(downed).unwrap();
        assert!(target.alive);
        assert_eq!(target.stats.health, 50);
        assert_eq!(state.counters.revives, 1);
        assert_eq!(state.counters.damage_dealt[&downed], 42);

        let err = engine.revive(&mut state, reviver, downed).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[test]
    fn defeat_wins_over_simultaneous_victory() {
        let engine = engine();
        let now = Utc::now();
        let player = CharacterId::new();
        let companion = CharacterId::new();
        let mut dead_stats = snapshot(10, 0, 0, 0.0);
        dead_stats.health = 0;
        let mut dead_monster = monster(10, 0, 3000, now);
        dead_monster.health = 0;
        let mut state = combat_state(
            vec![
                CombatParticipant::new(player, "Aria", false, dead_stats.clone()),
                CombatParticipant::new(companion, "Sellsword", true, snapshot(10, 0, 0, 0.0)),
            ],
            vec![dead_monster],
            now,
        );
        // All players down, all monsters down: the wipe decides it, and the
        // surviving companion does not rescue the party
        assert_eq!(engine.outcome(&state), Some(CombatOutcome::Defeat));

        state.participant_mut(player).unwrap().alive = true;
        state.participant_mut(player).unwrap().stats.health = 1;
        assert_eq!(engine.outcome(&state), Some(CombatOutcome::Victory));
    }

    #[test]
    fn snapshot_and_restore_round_trip_mid_combat() {
        let engine = engine();
        let now = Utc::now();
        let who = CharacterId::new();
        let mut state = combat_state(
            vec![CombatParticipant::new(
                who,
                "Aria",
                false,
                snapshot(20, 5, 2, 0.05),
            )],
            vec![monster(10, 5, 3000, now)],
            now,
        );
        state.counters.record_damage_dealt(who, 30);
        state.monsters[0].health = 17;

        let raw = engine.snapshot(&state).unwrap();
        let restored = engine.restore(&raw).unwrap();
        assert_eq!(restored.monsters[0].health, 17);
        assert_eq!(restored.counters.damage_dealt[&who], 30);
        assert_eq!(restored.event_id, state.event_id);
    }
}
