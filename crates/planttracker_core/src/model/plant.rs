//! Plant domain model.
//!
//! # Responsibility
//! - Define the canonical plant record and its AI-enriched care data.
//! - Provide creation/patch shapes used by the service layer.
//! - Validate user input and AI payloads before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another plant.
//! - `updated_at` is never earlier than `created_at`.
//! - A plant without a harvest window always derives `PlantStatus::Planted`.
//!
//! # See also
//! - `crate::service::harvest` for the date-relative views.

use jiff::civil::Date;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every plant.
pub type PlantId = Uuid;

/// Upper bound for `SunNeeds::hours`.
pub const MAX_SUN_HOURS: f32 = 24.0;

/// Canonical plant record as stored in the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub id: PlantId,
    pub name: String,
    pub variety: Option<String>,
    /// Calendar day of planting; never in the future when created.
    pub planted_date: Date,
    /// Free-text location label such as "Erkély".
    pub location: Option<String>,
    pub notes: Option<String>,
    /// Filled after creation by the image lookup collaborator.
    pub image_url: Option<String>,
    pub ai_data: Option<AiData>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Plant {
    /// Builds a new plant from validated form data.
    ///
    /// Identity and both timestamps are assigned here, never by callers.
    pub fn from_draft(draft: PlantDraft, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_string(),
            variety: normalize_optional_text(draft.variety),
            planted_date: draft.planted_date,
            location: normalize_optional_text(draft.location),
            notes: normalize_optional_text(draft.notes),
            image_url: None,
            ai_data: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the harvest window when AI data carries one.
    pub fn harvest_window(&self) -> Option<&HarvestWindow> {
        self.ai_data.as_ref().map(|data| &data.harvest_window)
    }

    /// Derives the growth status for the given calendar day.
    ///
    /// Without a harvest window the plant is always `Planted`; after the
    /// window has ended it falls back to `Planted` as well.
    pub fn status_on(&self, day: Date) -> PlantStatus {
        match self.harvest_window() {
            None => PlantStatus::Planted,
            Some(window) if window.contains(day) => PlantStatus::ReadyToHarvest,
            Some(window) if day < window.start => PlantStatus::Maturing,
            Some(_) => PlantStatus::Planted,
        }
    }

    /// Merges a partial update into this record.
    ///
    /// No validation happens here; stored values are taken as given.
    pub fn apply_patch(&mut self, patch: &PlantPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(variety) = &patch.variety {
            self.variety = variety.clone();
        }
        if let Some(planted_date) = patch.planted_date {
            self.planted_date = planted_date;
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = image_url.clone();
        }
        if let Some(ai_data) = &patch.ai_data {
            self.ai_data = ai_data.clone();
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
    }
}

/// Form data accepted when creating a plant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantDraft {
    pub name: String,
    pub variety: Option<String>,
    pub planted_date: Date,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl PlantDraft {
    /// Creates a draft with only the required fields set.
    pub fn new(name: impl Into<String>, planted_date: Date) -> Self {
        Self {
            name: name.into(),
            variety: None,
            planted_date,
            location: None,
            notes: None,
        }
    }

    /// Validates creation input against the caller's notion of today.
    pub fn validate(&self, today: Date) -> Result<(), PlantValidationError> {
        if self.name.trim().is_empty() {
            return Err(PlantValidationError::BlankName);
        }
        if self.planted_date > today {
            return Err(PlantValidationError::PlantedInFuture {
                planted_date: self.planted_date,
                today,
            });
        }
        Ok(())
    }
}

/// Partial update for an existing plant.
///
/// Outer `None` leaves a field unchanged. For optional fields `Some(None)`
/// clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlantPatch {
    pub name: Option<String>,
    pub variety: Option<Option<String>>,
    pub planted_date: Option<Date>,
    pub location: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub ai_data: Option<Option<AiData>>,
    pub updated_at: Option<Timestamp>,
}

/// AI-enriched care data attached to a plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiData {
    pub harvest_window: HarvestWindow,
    pub water_needs: WaterNeeds,
    pub sun_needs: SunNeeds,
    #[serde(default)]
    pub care_plan: Vec<CarePlanPhase>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    pub fetched_at: Timestamp,
}

impl AiData {
    /// Checks the closed-set payload shape that serde cannot express.
    pub fn validate(&self) -> Result<(), PlantValidationError> {
        let window = &self.harvest_window;
        if window.end < window.start {
            return Err(PlantValidationError::InvertedHarvestWindow {
                start: window.start,
                end: window.end,
            });
        }
        if !(0.0..=MAX_SUN_HOURS).contains(&self.sun_needs.hours) {
            return Err(PlantValidationError::SunHoursOutOfRange(
                self.sun_needs.hours,
            ));
        }
        if let Some(index) = self
            .care_plan
            .iter()
            .position(|phase| phase.phase.trim().is_empty())
        {
            return Err(PlantValidationError::BlankCarePhase(index));
        }
        if let Some(index) = self
            .recipes
            .iter()
            .position(|recipe| recipe.name.trim().is_empty())
        {
            return Err(PlantValidationError::BlankRecipeName(index));
        }
        Ok(())
    }
}

/// Date range during which a plant is ready to pick. Both ends inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestWindow {
    pub start: Date,
    pub end: Date,
    #[serde(default)]
    pub description: String,
}

impl HarvestWindow {
    pub fn contains(&self, day: Date) -> bool {
        self.start <= day && day <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterNeeds {
    pub frequency: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunNeeds {
    /// Daily direct sun hours; fractional values are allowed.
    pub hours: f32,
    pub category: SunCategory,
    #[serde(default)]
    pub details: String,
}

/// Light requirement category.
///
/// Accepts the Hungarian labels written by earlier app versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunCategory {
    #[serde(alias = "teljes nap")]
    FullSun,
    #[serde(alias = "félárnyék")]
    PartialShade,
    #[serde(alias = "árnyék")]
    Shade,
}

/// Named stage of plant care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarePlanPhase {
    pub phase: String,
    /// Offset from `Plant::planted_date`; `None` for ongoing phases.
    pub weeks_from_planting: Option<u32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub difficulty: RecipeDifficulty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeDifficulty {
    #[serde(alias = "egyszerű")]
    Easy,
    #[serde(alias = "közepes")]
    Medium,
    #[serde(alias = "haladó")]
    Advanced,
}

/// Growth state derived from the harvest window and today's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantStatus {
    /// Default state, also used once a harvest window has passed.
    Planted,
    /// Harvest window has not started yet.
    Maturing,
    /// Today falls inside the harvest window.
    ReadyToHarvest,
}

impl PlantStatus {
    pub const ALL: [PlantStatus; 3] = [Self::Planted, Self::Maturing, Self::ReadyToHarvest];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planted => "planted",
            Self::Maturing => "maturing",
            Self::ReadyToHarvest => "ready_to_harvest",
        }
    }
}

impl Display for PlantStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failures for plant input and AI payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum PlantValidationError {
    BlankName,
    PlantedInFuture { planted_date: Date, today: Date },
    InvertedHarvestWindow { start: Date, end: Date },
    SunHoursOutOfRange(f32),
    BlankCarePhase(usize),
    BlankRecipeName(usize),
}

impl Display for PlantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "plant name must not be blank"),
            Self::PlantedInFuture {
                planted_date,
                today,
            } => write!(
                f,
                "planted date {planted_date} is in the future (today is {today})"
            ),
            Self::InvertedHarvestWindow { start, end } => {
                write!(f, "harvest window ends ({end}) before it starts ({start})")
            }
            Self::SunHoursOutOfRange(hours) => write!(
                f,
                "sun hours {hours} out of range; expected 0..={MAX_SUN_HOURS}"
            ),
            Self::BlankCarePhase(index) => write!(f, "care plan phase #{index} has no name"),
            Self::BlankRecipeName(index) => write!(f, "recipe #{index} has no name"),
        }
    }
}

impl Error for PlantValidationError {}

/// Trims optional free text and drops it when blank.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
