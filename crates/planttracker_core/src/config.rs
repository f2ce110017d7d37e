//! Core configuration.
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! db-path = "/var/lib/planttracker/plants.db"
//! legacy-dir = "/var/lib/planttracker/legacy"
//! log-level = "info"
//! log-dir = "/var/log/planttracker"
//! ```
//!
//! `legacy-dir`, `log-level` and `log-dir` are optional.

use crate::db::{open_db, DbError};
use crate::legacy::FileLegacyStore;
use crate::logging::{default_log_level, init_logging, LogLevel, LoggingError};
use rusqlite::Connection;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    db_path: PathBuf,
    legacy_dir: Option<PathBuf>,
    log_level: Option<String>,
    log_dir: Option<PathBuf>,
}

/// Validated core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// Directory of the legacy key/value files; defaults to the database
    /// file's directory.
    pub legacy_dir: PathBuf,
    pub log_level: LogLevel,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
    Logging(LoggingError),
    Db(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            Self::Parse { path, source } => {
                write!(f, "invalid config at {}: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl CoreConfig {
    /// Builds a config with defaults for everything but the database path.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::validate(RawConfig {
            db_path: db_path.into(),
            legacy_dir: None,
            log_level: None,
            log_dir: None,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        if !raw.db_path.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "db-path must be absolute, got `{}`",
                raw.db_path.display()
            )));
        }
        for (name, dir) in [("legacy-dir", &raw.legacy_dir), ("log-dir", &raw.log_dir)] {
            if let Some(dir) = dir.as_ref().filter(|dir| !dir.is_absolute()) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }

        let log_level = match raw.log_level.as_deref() {
            Some(level) => level.parse::<LogLevel>().map_err(ConfigError::Logging)?,
            None => default_log_level(),
        };
        let legacy_dir = match raw.legacy_dir {
            Some(dir) => dir,
            None => raw
                .db_path
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| ConfigError::Invalid("db-path has no parent".to_string()))?,
        };

        Ok(Self {
            db_path: raw.db_path,
            legacy_dir,
            log_level,
            log_dir: raw.log_dir,
        })
    }

    /// Starts file logging when a log directory is configured.
    pub fn init_logging(&self) -> Result<(), ConfigError> {
        match &self.log_dir {
            Some(dir) => init_logging(self.log_level, dir).map_err(ConfigError::Logging),
            None => Ok(()),
        }
    }

    /// Opens the plant database, creating parent directories as needed.
    pub fn open_database(&self) -> Result<Connection, ConfigError> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        open_db(&self.db_path).map_err(ConfigError::Db)
    }

    pub fn legacy_store(&self) -> FileLegacyStore {
        FileLegacyStore::new(self.legacy_dir.clone())
    }
}
