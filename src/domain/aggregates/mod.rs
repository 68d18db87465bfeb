//! Aggregates - Cluster of domain objects treated as a single unit

pub mod mission_aggregate;

pub use mission_aggregate::MissionRuntime;
