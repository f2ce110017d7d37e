//! Plant use-case service.
//!
//! # Responsibility
//! - Run the one-shot legacy storage import on initialization.
//! - Write through to the repository and keep an in-memory mirror.
//! - Answer read queries from the mirror only.
//!
//! # Invariants
//! - The repository is the source of truth; the mirror is fully reloaded
//!   after every successful write.
//! - `updated_at` strictly increases on every mutation of a record.
//! - Identity and timestamps are assigned here, never by callers.
//! - Legacy import is guarded by a persisted marker, so repeated
//!   `initialize` calls are harmless.
//!
//! # See also
//! - `crate::service::query` for the mirror-side filters.

use crate::legacy::{parse_legacy_plants, LegacyStore, LEGACY_STORAGE_KEY};
use crate::model::plant::{
    normalize_optional_text, AiData, Plant, PlantDraft, PlantId, PlantPatch, PlantStatus,
    PlantValidationError,
};
use crate::repo::plant_repo::{ImportOutcome, PlantRepository, RepoError};
use crate::service::clock::{Clock, SystemClock};
use crate::service::harvest::{self, HarvestNotice};
use crate::service::query::{self, PlantQuery, SortOrder, StatusGroups};
use jiff::Timestamp;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Persisted marker written once the legacy blob has been handled.
pub const LEGACY_IMPORT_MARKER: &str = "legacy_storage_import";

/// Service error for plant use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(PlantValidationError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<PlantValidationError> for ServiceError {
    fn from(value: PlantValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Progress of the legacy import within this service instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    NotStarted,
    Checking,
    Migrating,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Marker was already persisted by an earlier run.
    AlreadyCompleted,
    /// Store already held plants; legacy blob left untouched.
    SkippedNonEmpty,
    NoLegacyData,
    Imported,
    /// Blob unreadable or import rejected; blob preserved for a later retry.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub outcome: MigrationOutcome,
    pub migrated: usize,
}

impl MigrationReport {
    fn empty(outcome: MigrationOutcome) -> Self {
        Self {
            outcome,
            migrated: 0,
        }
    }
}

type MirrorListener = Box<dyn FnMut(&[Plant])>;

/// Plant service facade over a repository implementation.
pub struct PlantService<R: PlantRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
    mirror: Vec<Plant>,
    revision: u64,
    migration_state: MigrationState,
    listeners: Vec<MirrorListener>,
}

impl<R: PlantRepository> PlantService<R> {
    /// Creates a service on the system clock. The mirror starts empty until
    /// `initialize` or `reload` runs.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: PlantRepository, C: Clock> PlantService<R, C> {
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            mirror: Vec::new(),
            revision: 0,
            migration_state: MigrationState::NotStarted,
            listeners: Vec::new(),
        }
    }

    /// Imports legacy data when needed, then loads the mirror.
    ///
    /// Import failures are logged and reported, never returned as errors.
    /// Only a failing mirror load is an error.
    pub fn initialize(
        &mut self,
        legacy: &mut dyn LegacyStore,
    ) -> Result<MigrationReport, ServiceError> {
        let started_at = Instant::now();
        self.migration_state = MigrationState::Checking;
        let report = self.migrate_legacy(legacy);
        self.migration_state = MigrationState::Done;

        info!(
            "event=legacy_migration module=service status={} outcome={:?} migrated={} duration_ms={}",
            if report.outcome == MigrationOutcome::Failed { "error" } else { "ok" },
            report.outcome,
            report.migrated,
            started_at.elapsed().as_millis()
        );

        self.reload()?;
        Ok(report)
    }

    pub fn migration_state(&self) -> MigrationState {
        self.migration_state
    }

    /// Replaces the mirror with the repository contents and notifies
    /// listeners.
    pub fn reload(&mut self) -> Result<(), ServiceError> {
        let plants = self.repo.get_all().map_err(|err| {
            error!("event=mirror_reload module=service status=error error={err}");
            ServiceError::from(err)
        })?;
        self.mirror = plants;
        self.revision += 1;
        for listener in &mut self.listeners {
            listener(self.mirror.as_slice());
        }
        Ok(())
    }

    /// Registers a callback invoked with the mirror after every reload.
    pub fn subscribe(&mut self, listener: impl FnMut(&[Plant]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Number of completed mirror reloads.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn add_plant(&mut self, draft: PlantDraft) -> Result<Plant, ServiceError> {
        draft.validate(self.clock.today())?;
        let plant = Plant::from_draft(draft, self.next_timestamp(None));

        self.repo.add(&plant).map_err(|err| {
            error!(
                "event=plant_add module=service status=error plant_id={} busy={} error={err}",
                plant.id,
                err.is_busy()
            );
            ServiceError::from(err)
        })?;
        info!("event=plant_add module=service status=ok plant_id={}", plant.id);

        self.reload()?;
        Ok(self.get_plant_by_id(plant.id).cloned().unwrap_or(plant))
    }

    /// Merges `patch` into the plant and refreshes `updated_at`.
    ///
    /// Returns `Ok(None)` when the plant does not exist. The planted date is
    /// not re-validated here.
    pub fn update_plant(
        &mut self,
        id: PlantId,
        mut patch: PlantPatch,
    ) -> Result<Option<Plant>, ServiceError> {
        if let Some(name) = patch.name.as_mut() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(PlantValidationError::BlankName.into());
            }
            *name = trimmed.to_string();
        }
        for field in [&mut patch.variety, &mut patch.location, &mut patch.notes] {
            if let Some(value) = field.take() {
                *field = Some(normalize_optional_text(value));
            }
        }
        if let Some(Some(ai_data)) = &patch.ai_data {
            ai_data.validate()?;
        }
        self.write_patch(id, patch, "plant_update")
    }

    /// Replaces AI data wholesale; no merge inside the payload.
    pub fn update_plant_ai_data(
        &mut self,
        id: PlantId,
        ai_data: Option<AiData>,
    ) -> Result<Option<Plant>, ServiceError> {
        if let Some(data) = &ai_data {
            data.validate()?;
        }
        let patch = PlantPatch {
            ai_data: Some(ai_data),
            ..PlantPatch::default()
        };
        self.write_patch(id, patch, "plant_ai_update")
    }

    /// Stores the image URL found by the image lookup collaborator.
    pub fn set_plant_image(
        &mut self,
        id: PlantId,
        image_url: Option<String>,
    ) -> Result<Option<Plant>, ServiceError> {
        let patch = PlantPatch {
            image_url: Some(normalize_optional_text(image_url)),
            ..PlantPatch::default()
        };
        self.write_patch(id, patch, "plant_image_update")
    }

    /// Deletes a plant permanently.
    ///
    /// Returns `false` only when the store operation fails; deleting an
    /// unknown id succeeds.
    pub fn delete_plant(&mut self, id: PlantId) -> bool {
        match self.repo.delete(id) {
            Ok(removed) => {
                info!("event=plant_delete module=service status=ok plant_id={id} removed={removed}");
            }
            Err(err) => {
                error!(
                    "event=plant_delete module=service status=error plant_id={id} busy={} error={err}",
                    err.is_busy()
                );
                return false;
            }
        }
        if let Err(err) = self.reload() {
            warn!("event=plant_delete module=service status=stale_mirror plant_id={id} error={err}");
        }
        true
    }

    pub fn get_all_plants(&self) -> &[Plant] {
        &self.mirror
    }

    pub fn get_plant_by_id(&self, id: PlantId) -> Option<&Plant> {
        self.mirror.iter().find(|plant| plant.id == id)
    }

    pub fn plants_count(&self) -> usize {
        self.mirror.len()
    }

    pub fn search_plants(&self, query: &str) -> Vec<Plant> {
        query::search(&self.mirror, query)
    }

    pub fn filter_by_location(&self, location: &str) -> Vec<Plant> {
        query::filter_by_location(&self.mirror, location)
    }

    pub fn filter_by_status(&self, status: PlantStatus) -> Vec<Plant> {
        query::filter_by_status(&self.mirror, status, self.clock.today())
    }

    pub fn get_locations(&self) -> Vec<String> {
        query::locations(&self.mirror)
    }

    pub fn sort_by_planting_date(&self, ascending: bool) -> Vec<Plant> {
        let order = if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        };
        query::sort_by_planting_date(&self.mirror, order)
    }

    pub fn group_by_status(&self) -> StatusGroups {
        query::group_by_status(&self.mirror, self.clock.today())
    }

    pub fn query(&self, query: &PlantQuery) -> Vec<Plant> {
        query::apply_query(&self.mirror, query, self.clock.today())
    }

    pub fn plant_status(&self, plant: &Plant) -> PlantStatus {
        harvest::plant_status(plant, self.clock.today())
    }

    /// Whole days until harvest, clamped at zero; `None` without a window.
    pub fn days_until_harvest(&self, plant: &Plant) -> Option<i64> {
        harvest::days_until_harvest(plant, self.clock.today())
    }

    pub fn harvest_notice(&self, plant: &Plant) -> Option<HarvestNotice> {
        harvest::harvest_notice(plant, self.clock.today())
    }

    pub fn next_care_task<'p>(&self, plant: &'p Plant) -> Option<&'p str> {
        harvest::next_care_task(plant, self.clock.today())
    }

    /// Percent of the planting-to-harvest stretch already behind the plant.
    pub fn harvest_progress(&self, plant: &Plant) -> Option<u8> {
        harvest::harvest_progress(plant, self.clock.today())
    }

    fn write_patch(
        &mut self,
        id: PlantId,
        mut patch: PlantPatch,
        event: &str,
    ) -> Result<Option<Plant>, ServiceError> {
        let current = self.repo.get_by_id(id).map_err(|err| {
            error!("event={event} module=service status=error plant_id={id} error={err}");
            ServiceError::from(err)
        })?;
        let Some(current) = current else {
            info!("event={event} module=service status=not_found plant_id={id}");
            return Ok(None);
        };

        patch.updated_at = Some(self.next_timestamp(Some(current.updated_at)));
        let changed = self.repo.update(id, &patch).map_err(|err| {
            error!(
                "event={event} module=service status=error plant_id={id} busy={} error={err}",
                err.is_busy()
            );
            ServiceError::from(err)
        })?;
        if changed == 0 {
            info!("event={event} module=service status=not_found plant_id={id}");
            return Ok(None);
        }
        info!("event={event} module=service status=ok plant_id={id}");

        self.reload()?;
        Ok(self.get_plant_by_id(id).cloned())
    }

    /// Current time at storage precision, strictly after `previous`.
    fn next_timestamp(&self, previous: Option<Timestamp>) -> Timestamp {
        let now = self.clock.now();
        let now = Timestamp::from_millisecond(now.as_millisecond()).unwrap_or(now);
        match previous {
            Some(previous) if now <= previous => {
                Timestamp::from_millisecond(previous.as_millisecond() + 1).unwrap_or(previous)
            }
            _ => now,
        }
    }

    fn migrate_legacy(&mut self, legacy: &mut dyn LegacyStore) -> MigrationReport {
        match self.repo.migration_completed(LEGACY_IMPORT_MARKER) {
            Ok(true) => return MigrationReport::empty(MigrationOutcome::AlreadyCompleted),
            Ok(false) => {}
            Err(err) => {
                warn!("event=legacy_migration module=service status=error stage=marker error={err}");
                return MigrationReport::empty(MigrationOutcome::Failed);
            }
        }

        match self.repo.count() {
            Ok(0) => {}
            Ok(_) => return self.finish_without_import(MigrationOutcome::SkippedNonEmpty),
            Err(err) => {
                warn!("event=legacy_migration module=service status=error stage=count error={err}");
                return MigrationReport::empty(MigrationOutcome::Failed);
            }
        }

        let blob = match legacy.get_item(LEGACY_STORAGE_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return self.finish_without_import(MigrationOutcome::NoLegacyData),
            Err(err) => {
                warn!("event=legacy_migration module=service status=error stage=read error={err}");
                return MigrationReport::empty(MigrationOutcome::Failed);
            }
        };

        self.migration_state = MigrationState::Migrating;
        let plants = match parse_legacy_plants(&blob) {
            Ok(plants) => plants,
            Err(err) => {
                warn!("event=legacy_migration module=service status=error stage=parse error={err}");
                return MigrationReport::empty(MigrationOutcome::Failed);
            }
        };

        match self.repo.import_legacy(LEGACY_IMPORT_MARKER, &plants) {
            Ok(ImportOutcome::Imported(migrated)) => {
                if let Err(err) = legacy.remove_item(LEGACY_STORAGE_KEY) {
                    warn!("event=legacy_migration module=service status=error stage=erase error={err}");
                }
                MigrationReport {
                    outcome: MigrationOutcome::Imported,
                    migrated,
                }
            }
            Ok(ImportOutcome::AlreadyCompleted) => {
                MigrationReport::empty(MigrationOutcome::AlreadyCompleted)
            }
            Ok(ImportOutcome::SkippedNonEmpty) => {
                MigrationReport::empty(MigrationOutcome::SkippedNonEmpty)
            }
            Err(err) => {
                warn!("event=legacy_migration module=service status=error stage=import error={err}");
                MigrationReport::empty(MigrationOutcome::Failed)
            }
        }
    }

    fn finish_without_import(&self, outcome: MigrationOutcome) -> MigrationReport {
        if let Err(err) = self.repo.mark_migration_completed(LEGACY_IMPORT_MARKER) {
            warn!("event=legacy_migration module=service status=error stage=mark error={err}");
        }
        MigrationReport::empty(outcome)
    }
}
