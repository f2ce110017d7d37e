//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Missing keys are reported as `None`/`0`/`false`, never as errors.
//! - Transport and corruption failures surface as `RepoError`.

pub mod plant_repo;
