//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Derive read-only views (status, countdown, grouping) from the mirror.
//! - Keep callers decoupled from storage details.

pub mod clock;
pub mod harvest;
pub mod plant_service;
pub mod query;
