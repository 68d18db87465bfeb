//! Combat-scoped entities
//!
//! Everything in this module lives only for the duration of a combat event.
//! Participants are built from persistent character snapshots at combat start
//! and only their final health is written back; monsters are instantiated
//! from catalog templates and survive only as a phase-roster record. The
//! whole `CombatState` serializes so an interrupted session can resume
//! without re-simulating prior attacks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::catalog::{MonsterRarity, MonsterTemplate};
use crate::domain::value_objects::{CharacterId, EventId, MonsterId, SessionId, StatSnapshot};

/// Warning window opened when a monster telegraphs an attack
pub const TELEGRAPH_WARNING_MS: i64 = 2000;
/// Parry sub-window before impact, at speed multiplier 1.0
pub const BASE_PARRY_WINDOW_MS: f64 = 500.0;
/// Block sub-window before impact, at speed multiplier 1.0
pub const BASE_BLOCK_WINDOW_MS: f64 = 1500.0;
/// Attack interval that maps to speed multiplier 1.0
pub const BASELINE_ATTACK_INTERVAL_MS: f64 = 3000.0;

/// Resolved defender input for one telegraphed attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardOutcome {
    None,
    Block,
    Parry,
}

/// Transient per-monster record between "attack telegraphed" and
/// "attack resolved". Cleared before the next telegraph so a stale window is
/// never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockWindow {
    pub defender_id: CharacterId,
    pub warning_started_at: DateTime<Utc>,
    pub attack_at: DateTime<Utc>,
    pub holding_block: bool,
    pub guard: GuardOutcome,
}

impl BlockWindow {
    pub fn open(defender_id: CharacterId, attack_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            defender_id,
            warning_started_at: now,
            attack_at,
            holding_block: false,
            guard: GuardOutcome::None,
        }
    }
}

/// Template-derived monster instance, alive only during a combat event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub id: MonsterId,
    pub template_id: crate::domain::value_objects::MonsterTemplateId,
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    pub attack_interval_ms: i64,
    pub next_attack_at: DateTime<Utc>,
    pub rarity: MonsterRarity,
    pub is_boss: bool,
    /// Pending telegraphed attack, if any
    pub telegraph: Option<BlockWindow>,
}

impl Monster {
    pub fn from_template(template: &MonsterTemplate, now: DateTime<Utc>) -> Self {
        Self {
            id: MonsterId::new(),
            template_id: template.id,
            name: template.name.clone(),
            health: template.health,
            max_health: template.health,
            attack: template.attack,
            defense: template.defense,
            attack_interval_ms: template.attack_interval_ms,
            next_attack_at: now + chrono::Duration::milliseconds(template.attack_interval_ms),
            rarity: template.rarity,
            is_boss: template.is_boss,
            telegraph: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Speed multiplier derived from the attack interval, clamped to
    /// [0.5, 2.0]. Fast monsters shrink the guard windows, slow ones widen
    /// them.
    pub fn speed_multiplier(&self) -> f64 {
        (self.attack_interval_ms as f64 / BASELINE_ATTACK_INTERVAL_MS).clamp(0.5, 2.0)
    }

    pub fn parry_window_ms(&self) -> i64 {
        (BASE_PARRY_WINDOW_MS * self.speed_multiplier()) as i64
    }

    pub fn block_window_ms(&self) -> i64 {
        (BASE_BLOCK_WINDOW_MS * self.speed_multiplier()) as i64
    }
}

/// Party member or hired companion snapshot used only during combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatParticipant {
    pub character_id: CharacterId,
    pub name: String,
    pub is_companion: bool,
    pub stats: StatSnapshot,
    pub alive: bool,
}

impl CombatParticipant {
    pub fn new(
        character_id: CharacterId,
        name: impl Into<String>,
        is_companion: bool,
        stats: StatSnapshot,
    ) -> Self {
        let alive = stats.health > 0;
        Self {
            character_id,
            name: name.into(),
            is_companion,
            stats,
            alive,
        }
    }

    pub fn apply_damage(&mut self, damage: i32) {
        self.stats.health -= damage;
        if self.stats.health <= 0 {
            self.stats.health = 0;
            self.alive = false;
        }
    }
}

/// Running totals for one combat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatCounters {
    pub total_attacks: u64,
    pub damage_dealt: HashMap<CharacterId, i64>,
    pub damage_received: HashMap<CharacterId, i64>,
    pub blocks: u32,
    pub parries: u32,
    pub perfect_parries: u32,
    pub revives: u32,
    pub monsters_defeated: u32,
}

impl CombatCounters {
    pub fn record_damage_dealt(&mut self, attacker: CharacterId, damage: i32) {
        *self.damage_dealt.entry(attacker).or_insert(0) += damage as i64;
    }

    pub fn record_damage_received(&mut self, defender: CharacterId, damage: i32) {
        *self.damage_received.entry(defender).or_insert(0) += damage as i64;
    }
}

/// Authoritative, serializable mid-combat state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatState {
    pub session_id: SessionId,
    pub event_id: EventId,
    pub started_at: DateTime<Utc>,
    pub participants: Vec<CombatParticipant>,
    pub monsters: Vec<Monster>,
    pub counters: CombatCounters,
}

impl CombatState {
    pub fn participant(&self, id: CharacterId) -> Option<&CombatParticipant> {
        self.participants.iter().find(|p| p.character_id == id)
    }

    pub fn participant_mut(&mut self, id: CharacterId) -> Option<&mut CombatParticipant> {
        self.participants.iter_mut().find(|p| p.character_id == id)
    }

    pub fn monster(&self, id: MonsterId) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.id == id)
    }

    pub fn monster_mut(&mut self, id: MonsterId) -> Option<&mut Monster> {
        self.monsters.iter_mut().find(|m| m.id == id)
    }

    pub fn all_monsters_dead(&self) -> bool {
        self.monsters.iter().all(|m| !m.is_alive())
    }

    /// Defeat is decided by player members only; surviving companions do not
    /// keep the fight going.
    pub fn all_players_dead(&self) -> bool {
        self.participants
            .iter()
            .filter(|p| !p.is_companion)
            .all(|p| !p.alive)
    }

    /// Fraction of player-dealt damage contributed by each player member.
    /// Used for display and tie-breaks downstream, never for loot weighting.
    pub fn contribution_shares(&self) -> HashMap<CharacterId, f64> {
        let players: Vec<CharacterId> = self
            .participants
            .iter()
            .filter(|p| !p.is_companion)
            .map(|p| p.character_id)
            .collect();
        let total: i64 = players
            .iter()
            .filter_map(|id| self.counters.damage_dealt.get(id))
            .sum();
        players
            .into_iter()
            .map(|id| {
                let dealt = self.counters.damage_dealt.get(&id).copied().unwrap_or(0);
                let share = if total > 0 {
                    dealt as f64 / total as f64
                } else {
                    0.0
                };
                (id, share)
            })
            .collect()
    }
}

/// Terminal outcome of a combat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    Victory,
    Defeat,
}

/// Per-combat result handed to the phase controller and loot engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatResult {
    pub outcome: CombatOutcome,
    pub elapsed_ms: i64,
    pub counters: CombatCounters,
    pub contribution: HashMap<CharacterId, f64>,
}
