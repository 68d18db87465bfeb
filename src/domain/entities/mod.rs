//! Domain entities - Core business objects with identity

mod catalog;
mod combat;
mod event;
mod loot;
mod party;
mod phase;
mod session;

pub use catalog::{EventTemplate, MissionTemplate, MonsterRarity, MonsterTemplate, RewardEntry};
pub use combat::{
    BlockWindow, CombatCounters, CombatOutcome, CombatParticipant, CombatResult, CombatState,
    GuardOutcome, Monster, BASELINE_ATTACK_INTERVAL_MS, BASE_BLOCK_WINDOW_MS,
    BASE_PARRY_WINDOW_MS, TELEGRAPH_WARNING_MS,
};
pub use event::{
    DungeonEvent, EventPayload, EventStatus, EventType, PlayerEventAction, TreasureItem,
};
pub use loot::{
    pick_winner, DropKind, LootDrop, LootMode, LootRoll, LootRule, RollKind, NEED_ROLL_VALUE,
};
pub use party::{MemberKind, PartyMember, PartyRoster};
pub use phase::{MissionPhase, PhaseMonsterRecord, PhaseStatus};
pub use session::{MissionSession, SessionStatus};
