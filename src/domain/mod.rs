//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: MissionSession, MissionPhase, DungeonEvent, combat and loot objects
//! - Value Objects: strongly-typed ids, stat snapshots
//! - Aggregates: the per-session mission runtime

pub mod aggregates;
pub mod entities;
pub mod value_objects;
