//! Application services - the mission core's use-case logic

pub mod combat_service;
pub mod currency_service;
pub mod loot_service;
pub mod phase_service;
pub mod session_service;

pub use combat_service::{AttackReport, CombatEngine, MonsterAttackReport};
pub use currency_service::CurrencyLedger;
pub use loot_service::{split_gold, GoldSplit, LootDistributionEngine};
pub use phase_service::PhaseController;
pub use session_service::SessionOrchestrator;
