//! Plant tracker domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep AI payloads as closed, typed value sets.
//!
//! # Invariants
//! - Every plant is identified by a stable `PlantId`.
//! - Deletion is permanent; there are no tombstones.

pub mod plant;
