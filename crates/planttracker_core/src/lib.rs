//! Core domain logic for PlantTracker.
//! This crate is the single source of truth for plant records, their
//! persistence and the derived harvest views.

pub mod config;
pub mod db;
pub mod legacy;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use legacy::{FileLegacyStore, LegacyError, LegacyStore, MemoryLegacyStore, LEGACY_STORAGE_KEY};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::plant::{
    AiData, CarePlanPhase, HarvestWindow, Plant, PlantDraft, PlantId, PlantPatch, PlantStatus,
    PlantValidationError, Recipe, RecipeDifficulty, SunCategory, SunNeeds, WaterNeeds,
};
pub use repo::plant_repo::{
    ImportOutcome, PlantField, PlantRepository, RepoError, RepoResult, SqlitePlantRepository,
};
pub use service::clock::{Clock, FixedClock, SystemClock};
pub use service::harvest::{HarvestNotice, RelativeDue};
pub use service::plant_service::{
    MigrationOutcome, MigrationReport, MigrationState, PlantService, ServiceError,
};
pub use service::query::{PlantQuery, SortOrder, StatusGroups};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
