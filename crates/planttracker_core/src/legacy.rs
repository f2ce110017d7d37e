//! Legacy flat key/value storage and its plant blob format.
//!
//! # Responsibility
//! - Abstract the pre-database key/value storage (`localStorage` shape).
//! - Decode the legacy JSON array into typed `Plant` records.
//!
//! # Invariants
//! - Decoding is all-or-nothing: one bad record rejects the whole blob.
//! - Date-valued fields carrying a time component map to their UTC day.
//! - Readers never mutate the blob; only the caller erases it.
//!
//! # See also
//! - `crate::service::plant_service` for the one-time import flow.

use crate::model::plant::{
    normalize_optional_text, AiData, CarePlanPhase, HarvestWindow, Plant, Recipe, SunNeeds,
    WaterNeeds,
};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use uuid::Uuid;

/// Key under which earlier app versions stored every plant.
pub const LEGACY_STORAGE_KEY: &str = "planttracker_plants";

const LEGACY_FILE_EXTENSION: &str = "json";

#[derive(Debug)]
pub enum LegacyError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidKey(String),
    Parse(serde_json::Error),
    InvalidRecord {
        index: usize,
        message: String,
    },
}

impl Display for LegacyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "legacy storage io error at `{}`: {source}", path.display())
            }
            Self::InvalidKey(key) => write!(f, "invalid legacy storage key `{key}`"),
            Self::Parse(err) => write!(f, "legacy plant blob is not valid json: {err}"),
            Self::InvalidRecord { index, message } => {
                write!(f, "legacy plant #{index} is invalid: {message}")
            }
        }
    }
}

impl Error for LegacyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidKey(_) | Self::InvalidRecord { .. } => None,
        }
    }
}

/// Flat string key/value storage.
pub trait LegacyStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, LegacyError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), LegacyError>;
    /// Removing a missing key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), LegacyError>;
}

/// In-process legacy store, mainly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryLegacyStore {
    items: HashMap<String, String>,
}

impl MemoryLegacyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }
}

impl LegacyStore for MemoryLegacyStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, LegacyError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), LegacyError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), LegacyError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Directory-backed legacy store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileLegacyStore {
    dir: PathBuf,
}

impl FileLegacyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn item_path(&self, key: &str) -> Result<PathBuf, LegacyError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(LegacyError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.{LEGACY_FILE_EXTENSION}")))
    }
}

impl LegacyStore for FileLegacyStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, LegacyError> {
        let path = self.item_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LegacyError::Io { path, source }),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), LegacyError> {
        let path = self.item_path(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| LegacyError::Io {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, value).map_err(|source| LegacyError::Io { path, source })
    }

    fn remove_item(&mut self, key: &str) -> Result<(), LegacyError> {
        let path = self.item_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LegacyError::Io { path, source }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyPlant {
    id: String,
    name: String,
    variety: Option<String>,
    planted_date: String,
    location: Option<String>,
    notes: Option<String>,
    image_url: Option<String>,
    ai_data: Option<LegacyAiData>,
    created_at: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyAiData {
    harvest_window: LegacyHarvestWindow,
    water_needs: WaterNeeds,
    sun_needs: SunNeeds,
    #[serde(default)]
    care_plan: Vec<CarePlanPhase>,
    #[serde(default)]
    recipes: Vec<Recipe>,
    fetched_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LegacyHarvestWindow {
    start: String,
    end: String,
    #[serde(default)]
    description: String,
}

/// Decodes a legacy blob into typed plants, coercing serialized dates.
pub fn parse_legacy_plants(blob: &str) -> Result<Vec<Plant>, LegacyError> {
    let records: Vec<LegacyPlant> = serde_json::from_str(blob).map_err(LegacyError::Parse)?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            convert_record(record).map_err(|message| LegacyError::InvalidRecord { index, message })
        })
        .collect()
}

fn convert_record(record: LegacyPlant) -> Result<Plant, String> {
    let id = Uuid::parse_str(record.id.trim())
        .map_err(|err| format!("invalid id `{}`: {err}", record.id))?;
    let name = record.name.trim().to_string();
    if name.is_empty() {
        return Err("name is blank".to_string());
    }

    let created_at = coerce_timestamp(&record.created_at, "createdAt")?;
    let updated_at = coerce_timestamp(&record.updated_at, "updatedAt")?;
    let ai_data = record
        .ai_data
        .map(|data| convert_ai_data(data, updated_at))
        .transpose()?;

    Ok(Plant {
        id,
        name,
        variety: normalize_optional_text(record.variety),
        planted_date: coerce_date(&record.planted_date, "plantedDate")?,
        location: normalize_optional_text(record.location),
        notes: normalize_optional_text(record.notes),
        image_url: normalize_optional_text(record.image_url),
        ai_data,
        created_at,
        updated_at: updated_at.max(created_at),
    })
}

fn convert_ai_data(data: LegacyAiData, fallback_fetched_at: Timestamp) -> Result<AiData, String> {
    let fetched_at = match data.fetched_at.as_deref() {
        Some(value) => coerce_timestamp(value, "aiData.fetchedAt")?,
        None => fallback_fetched_at,
    };
    let ai_data = AiData {
        harvest_window: HarvestWindow {
            start: coerce_date(&data.harvest_window.start, "harvestWindow.start")?,
            end: coerce_date(&data.harvest_window.end, "harvestWindow.end")?,
            description: data.harvest_window.description,
        },
        water_needs: data.water_needs,
        sun_needs: data.sun_needs,
        care_plan: data.care_plan,
        recipes: data.recipes,
        fetched_at,
    };
    ai_data.validate().map_err(|err| err.to_string())?;
    Ok(ai_data)
}

/// Parses a serialized date, accepting both `2024-05-01` and full RFC 3339
/// timestamps (reduced to their UTC calendar day).
pub fn coerce_date(value: &str, field: &str) -> Result<Date, String> {
    let trimmed = value.trim();
    if let Ok(timestamp) = trimmed.parse::<Timestamp>() {
        return Ok(timestamp.to_zoned(TimeZone::UTC).date());
    }
    trimmed
        .parse::<Date>()
        .map_err(|err| format!("invalid {field} `{value}`: {err}"))
}

/// Parses a serialized instant; bare dates mean midnight UTC.
pub fn coerce_timestamp(value: &str, field: &str) -> Result<Timestamp, String> {
    let trimmed = value.trim();
    if let Ok(timestamp) = trimmed.parse::<Timestamp>() {
        return Ok(timestamp);
    }
    let date = trimmed
        .parse::<Date>()
        .map_err(|err| format!("invalid {field} `{value}`: {err}"))?;
    date.to_zoned(TimeZone::UTC)
        .map(|zoned| zoned.timestamp())
        .map_err(|err| format!("invalid {field} `{value}`: {err}"))
}
