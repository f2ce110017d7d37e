//! Plant database bootstrap.
//!
//! One SQLite file holds the `plants` documents and the `app_meta` markers.
//! Connections come out of [`open_db`] already migrated; nothing else in the
//! crate creates tables or touches `PRAGMA user_version`.
//!
//! # See also
//! - `crate::repo::plant_repo` for the data access layer.

use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod meta;
pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Another connection held the file past the busy timeout.
    Busy(rusqlite::Error),
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build; it is left untouched.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy(err) => write!(f, "plant database is busy: {err}"),
            Self::Sqlite(err) => write!(f, "plant database error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "plant database uses schema v{found}, this build only knows up to v{supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Busy(err) | Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => Self::Busy(value),
            _ => Self::Sqlite(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use rusqlite::ffi;

    #[test]
    fn lock_contention_maps_to_busy() {
        let busy = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None);
        assert!(DbError::from(busy).is_busy());

        let constraint =
            rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_CONSTRAINT), None);
        assert!(!DbError::from(constraint).is_busy());
        assert!(!DbError::from(rusqlite::Error::QueryReturnedNoRows).is_busy());
    }

    #[test]
    fn schema_error_names_both_versions() {
        let err = DbError::SchemaTooNew {
            found: 7,
            supported: 2,
        };
        assert_eq!(
            err.to_string(),
            "plant database uses schema v7, this build only knows up to v2"
        );
    }
}
