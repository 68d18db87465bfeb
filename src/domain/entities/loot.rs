//! Loot entities - drops and rolls
//!
//! A `LootDrop` is one dropped stack awaiting distribution; a `LootRoll` is
//! one player's need-or-greed roll against a drop. Rolls are immutable once
//! created and unique per (drop, character); their submission order is the
//! explicit, reproducible tie-break.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{CharacterId, DropId, ItemId, SessionId};

/// Fixed value of a NEED roll; greed rolls are uniform 1..=100
pub const NEED_ROLL_VALUE: u32 = 100;

/// Distribution mode stamped on a drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootMode {
    Auto,
    NeedGreed,
    MasterLooter,
    GoldSplit,
}

/// Party-level loot rule that decides how non-currency drops are stamped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootRule {
    Auto,
    NeedGreed,
    MasterLooter,
}

/// What a drop contains
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DropKind {
    Currency { amount: u64 },
    Item { item_id: ItemId, quantity: u32 },
}

/// One dropped stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootDrop {
    pub id: DropId,
    pub session_id: SessionId,
    pub kind: DropKind,
    pub mode: LootMode,
    /// Set by master-looter assignment or roll resolution
    pub assigned_to: Option<CharacterId>,
    /// Terminal once set; for gold splits this is a bookkeeping anchor
    /// (the first player member) even though every member receives credit
    pub claimed_by: Option<CharacterId>,
    pub created_at: DateTime<Utc>,
}

impl LootDrop {
    pub fn currency(session_id: SessionId, amount: u64, mode: LootMode) -> Self {
        Self {
            id: DropId::new(),
            session_id,
            kind: DropKind::Currency { amount },
            mode,
            assigned_to: None,
            claimed_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn item(session_id: SessionId, item_id: ItemId, quantity: u32, mode: LootMode) -> Self {
        Self {
            id: DropId::new(),
            session_id,
            kind: DropKind::Item { item_id, quantity },
            mode,
            assigned_to: None,
            claimed_by: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }
}

/// NEED or GREED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollKind {
    Need,
    Greed,
}

/// One player's roll against a drop. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LootRoll {
    pub drop_id: DropId,
    pub character_id: CharacterId,
    pub kind: RollKind,
    pub value: u32,
    pub submitted_at: DateTime<Utc>,
}

/// Pick the winning roll: highest NEED wins; without any NEED rolls the
/// highest GREED wins; ties go to the earliest submission. `rolls` must be in
/// submission order.
pub fn pick_winner(rolls: &[LootRoll]) -> Option<CharacterId> {
    let winner_among = |kind: RollKind| {
        rolls
            .iter()
            .filter(|r| r.kind == kind)
            // strict > keeps the first-submitted roll on ties
            .fold(None::<&LootRoll>, |best, roll| match best {
                Some(b) if roll.value > b.value => Some(roll),
                Some(b) => Some(b),
                None => Some(roll),
            })
    };
    winner_among(RollKind::Need)
        .or_else(|| winner_among(RollKind::Greed))
        .map(|r| r.character_id)
}
