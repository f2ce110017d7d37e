//! Plant repository contracts and SQLite document-store implementation.
//!
//! # Responsibility
//! - Provide keyed CRUD over the `plants` collection.
//! - Expose indexed exact-match queries and distinct-value lookups.
//! - Run the one-shot legacy import transactionally.
//!
//! # Invariants
//! - The store never validates merged records; callers own input checks.
//! - Deleting a missing id is not an error.
//! - Read paths reject corrupt rows instead of masking them.
//! - `status` column holds the status as of the UTC day of the last write.
//!
//! # See also
//! - `crate::db::migrations` for the table layout.

use crate::db::meta::{get_meta, set_meta};
use crate::db::DbError;
use crate::model::plant::{AiData, Plant, PlantId, PlantPatch};
use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PLANT_SELECT_SQL: &str = "SELECT
    id,
    name,
    variety,
    planted_date,
    location,
    notes,
    image_url,
    ai_data,
    created_at,
    updated_at
FROM plants";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for plant persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    DuplicateKey(PlantId),
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl RepoError {
    /// Lock contention on the database file; the write may be retried.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_busy())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateKey(id) => write!(f, "plant already exists: {id}"),
            Self::Serialization(err) => write!(f, "failed to encode ai data: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted plant data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::DuplicateKey(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::from(value))
    }
}

/// Indexed plant fields usable in exact-match queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlantField {
    Name,
    Location,
    /// Status snapshot written with each record.
    Status,
}

impl PlantField {
    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Location => "location",
            Self::Status => "status",
        }
    }
}

/// Result of a guarded legacy import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Marker already present; nothing touched.
    AlreadyCompleted,
    /// Store held data; marker written, nothing imported.
    SkippedNonEmpty,
    /// All records inserted and marker written in one transaction.
    Imported(usize),
}

/// Repository interface for the plant collection.
pub trait PlantRepository {
    fn get_all(&self) -> RepoResult<Vec<Plant>>;
    fn get_by_id(&self, id: PlantId) -> RepoResult<Option<Plant>>;
    fn add(&self, plant: &Plant) -> RepoResult<PlantId>;
    /// Merges `patch` into the stored record. Returns affected record count.
    fn update(&self, id: PlantId, patch: &PlantPatch) -> RepoResult<usize>;
    /// Returns whether a record was removed.
    fn delete(&self, id: PlantId) -> RepoResult<bool>;
    fn query_by_field(&self, field: PlantField, value: &str) -> RepoResult<Vec<Plant>>;
    /// Distinct non-empty values in first-insertion order.
    fn distinct_values(&self, field: PlantField) -> RepoResult<Vec<String>>;
    fn count(&self) -> RepoResult<u64>;
    /// Removes every plant. Returns removed count.
    fn clear(&self) -> RepoResult<usize>;
    fn migration_completed(&self, marker: &str) -> RepoResult<bool>;
    fn mark_migration_completed(&self, marker: &str) -> RepoResult<()>;
    /// Bulk inserts legacy records unless the marker is set or the store is
    /// non-empty. All-or-nothing.
    fn import_legacy(&self, marker: &str, plants: &[Plant]) -> RepoResult<ImportOutcome>;
}

/// SQLite-backed plant repository.
pub struct SqlitePlantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlantRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PlantRepository for SqlitePlantRepository<'_> {
    fn get_all(&self) -> RepoResult<Vec<Plant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PLANT_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut plants = Vec::new();
        while let Some(row) = rows.next()? {
            plants.push(parse_plant_row(row)?);
        }
        Ok(plants)
    }

    fn get_by_id(&self, id: PlantId) -> RepoResult<Option<Plant>> {
        load_plant(self.conn, id)
    }

    fn add(&self, plant: &Plant) -> RepoResult<PlantId> {
        insert_plant(self.conn, plant)?;
        Ok(plant.id)
    }

    fn update(&self, id: PlantId, patch: &PlantPatch) -> RepoResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(mut plant) = load_plant(&tx, id)? else {
            return Ok(0);
        };
        plant.apply_patch(patch);

        let ai_data = encode_ai_data(plant.ai_data.as_ref())?;
        let changed = tx.execute(
            "UPDATE plants
             SET
                name = ?1,
                variety = ?2,
                planted_date = ?3,
                location = ?4,
                notes = ?5,
                image_url = ?6,
                ai_data = ?7,
                status = ?8,
                updated_at = ?9
             WHERE id = ?10;",
            params![
                plant.name.as_str(),
                plant.variety.as_deref(),
                plant.planted_date.to_string(),
                plant.location.as_deref(),
                plant.notes.as_deref(),
                plant.image_url.as_deref(),
                ai_data,
                status_snapshot(&plant),
                plant.updated_at.as_millisecond(),
                id.to_string(),
            ],
        )?;
        tx.commit()?;

        Ok(changed)
    }

    fn delete(&self, id: PlantId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM plants WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }

    fn query_by_field(&self, field: PlantField, value: &str) -> RepoResult<Vec<Plant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PLANT_SELECT_SQL} WHERE {} = ?1 ORDER BY rowid ASC;",
            field.column()
        ))?;
        let mut rows = stmt.query([value])?;
        let mut plants = Vec::new();
        while let Some(row) = rows.next()? {
            plants.push(parse_plant_row(row)?);
        }
        Ok(plants)
    }

    fn distinct_values(&self, field: PlantField) -> RepoResult<Vec<String>> {
        let column = field.column();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {column}
             FROM plants
             WHERE {column} IS NOT NULL AND trim({column}) <> ''
             GROUP BY {column}
             ORDER BY MIN(rowid) ASC;"
        ))?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }

    fn count(&self) -> RepoResult<u64> {
        count_plants(self.conn)
    }

    fn clear(&self) -> RepoResult<usize> {
        Ok(self.conn.execute("DELETE FROM plants;", [])?)
    }

    fn migration_completed(&self, marker: &str) -> RepoResult<bool> {
        Ok(get_meta(self.conn, marker)?.is_some())
    }

    fn mark_migration_completed(&self, marker: &str) -> RepoResult<()> {
        set_meta(self.conn, marker, "done")?;
        Ok(())
    }

    fn import_legacy(&self, marker: &str, plants: &[Plant]) -> RepoResult<ImportOutcome> {
        let tx = self.conn.unchecked_transaction()?;

        if get_meta(&tx, marker)?.is_some() {
            return Ok(ImportOutcome::AlreadyCompleted);
        }
        if count_plants(&tx)? > 0 {
            set_meta(&tx, marker, "skipped_non_empty")?;
            tx.commit()?;
            return Ok(ImportOutcome::SkippedNonEmpty);
        }

        for plant in plants {
            insert_plant(&tx, plant)?;
        }
        set_meta(&tx, marker, &format!("imported:{}", plants.len()))?;
        tx.commit()?;

        Ok(ImportOutcome::Imported(plants.len()))
    }
}

fn load_plant(conn: &Connection, id: PlantId) -> RepoResult<Option<Plant>> {
    let mut stmt = conn.prepare(&format!("{PLANT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_plant_row(row)?));
    }
    Ok(None)
}

fn insert_plant(conn: &Connection, plant: &Plant) -> RepoResult<()> {
    let ai_data = encode_ai_data(plant.ai_data.as_ref())?;
    let result = conn.execute(
        "INSERT INTO plants (
            id,
            name,
            variety,
            planted_date,
            location,
            notes,
            image_url,
            ai_data,
            status,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params![
            plant.id.to_string(),
            plant.name.as_str(),
            plant.variety.as_deref(),
            plant.planted_date.to_string(),
            plant.location.as_deref(),
            plant.notes.as_deref(),
            plant.image_url.as_deref(),
            ai_data,
            status_snapshot(plant),
            plant.created_at.as_millisecond(),
            plant.updated_at.as_millisecond(),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation
                && matches!(
                    err.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                        | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                ) =>
        {
            Err(RepoError::DuplicateKey(plant.id))
        }
        Err(err) => Err(err.into()),
    }
}

fn count_plants(conn: &Connection) -> RepoResult<u64> {
    let count = conn.query_row("SELECT COUNT(*) FROM plants;", [], |row| row.get::<_, i64>(0))?;
    u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative count {count}")))
}

fn status_snapshot(plant: &Plant) -> &'static str {
    let written_on = plant.updated_at.to_zoned(TimeZone::UTC).date();
    plant.status_on(written_on).as_str()
}

fn encode_ai_data(ai_data: Option<&AiData>) -> RepoResult<Option<String>> {
    ai_data
        .map(serde_json::to_string)
        .transpose()
        .map_err(RepoError::Serialization)
}

fn parse_plant_row(row: &Row<'_>) -> RepoResult<Plant> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid plant id `{id_text}` in plants.id"))
    })?;

    let planted_text: String = row.get("planted_date")?;
    let planted_date = planted_text.parse::<Date>().map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid planted_date `{planted_text}` for plant {id}: {err}"
        ))
    })?;

    let ai_data = match row.get::<_, Option<String>>("ai_data")? {
        Some(json) => Some(serde_json::from_str::<AiData>(&json).map_err(|err| {
            RepoError::InvalidData(format!("invalid ai_data for plant {id}: {err}"))
        })?),
        None => None,
    };

    Ok(Plant {
        id,
        name: row.get("name")?,
        variety: row.get("variety")?,
        planted_date,
        location: row.get("location")?,
        notes: row.get("notes")?,
        image_url: row.get("image_url")?,
        ai_data,
        created_at: parse_millis(row, "created_at", id)?,
        updated_at: parse_millis(row, "updated_at", id)?,
    })
}

fn parse_millis(row: &Row<'_>, column: &str, id: PlantId) -> RepoResult<Timestamp> {
    let millis: i64 = row.get(column)?;
    Timestamp::from_millisecond(millis).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid {column} value `{millis}` for plant {id}: {err}"
        ))
    })
}
