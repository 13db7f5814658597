//! Core configuration model.
//!
//! # Responsibility
//! - Describe store pool sizing/timeouts and logging/file locations.
//! - Load configuration from JSON with per-field defaults.
//!
//! # Invariants
//! - A validated `StoreConfig` always has a non-zero pool size and timeouts.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_POOL_SIZE: usize = 4;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_DB_FILE_NAME: &str = "campus.sqlite3";
const DEFAULT_STUDENTS_FILE_NAME: &str = "students.json";

/// Errors from configuration loading and validation.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Connection pool settings for [`crate::db::Store`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of pooled connections.
    pub pool_size: usize,
    /// Maximum wait for a free connection before `StoreUnavailable`.
    pub acquire_timeout_ms: u64,
    /// SQLite busy timeout applied to every pooled connection.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be greater than 0"));
        }
        if self.acquire_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "acquire_timeout_ms must be greater than 0",
            ));
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid("busy_timeout_ms must be greater than 0"));
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// Top-level configuration for embedding applications and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Records database file.
    pub db_path: PathBuf,
    /// Student collection JSON file.
    pub students_file: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory. `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub store: StoreConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            students_file: PathBuf::from(DEFAULT_STUDENTS_FILE_NAME),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
            store: StoreConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Loads configuration from a JSON file; absent fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Parses configuration from JSON text and validates it.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level cannot be empty"));
        }
        self.store.validate()
    }
}
