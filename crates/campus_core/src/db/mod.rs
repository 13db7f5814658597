//! Store Handle for the relational records variant.
//!
//! # Responsibility
//! - Bootstrap SQLite connections (foreign keys, busy timeout, schema).
//! - Pool them behind `Store` and lend them out as `ScopedConnection`s.
//!
//! # Invariants
//! - No connection is handed out before the schema is at `latest_version()`.
//! - Every connection enforces foreign keys.
//! - A lent connection goes back to the pool when its scope ends, whatever
//!   the outcome of the work done on it.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod pool;

pub use open::{open_db, open_db_in_memory};
pub use pool::{ScopedConnection, Store};

pub type DbResult<T> = Result<T, DbError>;

/// Storage infrastructure failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// No connection could be lent out.
    StoreUnavailable(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "schema version {db_version} is ahead of this build (max {latest_supported})"
            ),
            Self::StoreUnavailable(reason) => write!(f, "store unavailable: {reason}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
