//! Combat stat snapshots
//!
//! A `StatSnapshot` is the slice of a persistent character or companion record
//! that the mission core needs: everything else about the character (class,
//! equipment, appearance) stays with the character collaborator. Only final
//! health is ever written back.

use serde::{Deserialize, Serialize};

/// Default chance for a critical hit when the character record carries none.
pub const DEFAULT_CRIT_CHANCE: f64 = 0.05;

/// Point-in-time combat stats for a party member or companion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub health: i32,
    pub max_health: i32,
    pub attack: i32,
    pub defense: i32,
    pub agility: i32,
    pub block_strength: i32,
    pub level: u32,
    pub crit_chance: f64,
}

impl StatSnapshot {
    /// Healing granted by a between-phase rest:
    /// a quarter of max health plus one percent per level, never more
    /// than the health actually missing.
    pub fn rest_heal_amount(&self) -> i32 {
        let base = (self.max_health as f64 * 0.25).floor() as i32;
        let level_bonus = (self.max_health as f64 * self.level as f64 * 0.01).floor() as i32;
        let missing = (self.max_health - self.health).max(0);
        (base + level_bonus).min(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_heal_is_capped_at_missing_health() {
        let stats = StatSnapshot {
            health: 150,
            max_health: 200,
            attack: 10,
            defense: 5,
            agility: 5,
            block_strength: 0,
            level: 10,
            crit_chance: DEFAULT_CRIT_CHANCE,
        };
        // floor(200 * 0.25) + floor(200 * 10 * 0.01) = 50 + 20 = 70, capped at 50
        assert_eq!(stats.rest_heal_amount(), 50);
    }

    #[test]
    fn rest_heal_below_cap_is_unmodified() {
        let stats = StatSnapshot {
            health: 20,
            max_health: 200,
            attack: 10,
            defense: 5,
            agility: 5,
            block_strength: 0,
            level: 10,
            crit_chance: DEFAULT_CRIT_CHANCE,
        };
        assert_eq!(stats.rest_heal_amount(), 70);
    }

    #[test]
    fn rest_heal_at_full_health_is_zero() {
        let stats = StatSnapshot {
            health: 200,
            max_health: 200,
            attack: 10,
            defense: 5,
            agility: 5,
            block_strength: 0,
            level: 1,
            crit_chance: DEFAULT_CRIT_CHANCE,
        };
        assert_eq!(stats.rest_heal_amount(), 0);
    }
}
