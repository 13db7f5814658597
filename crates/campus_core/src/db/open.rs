//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file, private in-memory or named `memdb` SQLite connections.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Connections returned with `migrate=true` have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a connection points to.
#[derive(Debug, Clone)]
pub(crate) enum ConnectionTarget {
    File(PathBuf),
    /// Private in-memory database, gone when the connection closes.
    Memory,
    /// Named `memdb` database, alive while any connection is open. Uses
    /// ordinary file locking, so contention waits on the busy timeout.
    NamedMemory(String),
}

impl ConnectionTarget {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
            Self::NamedMemory(_) => "named_memory",
        }
    }
}

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_connection(
        &ConnectionTarget::File(path.as_ref().to_path_buf()),
        DEFAULT_BUSY_TIMEOUT,
        true,
    )
}

/// Opens a private in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_connection(&ConnectionTarget::Memory, DEFAULT_BUSY_TIMEOUT, true)
}

pub(crate) fn open_connection(
    target: &ConnectionTarget,
    busy_timeout: Duration,
    migrate: bool,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = target.mode();
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match target {
        ConnectionTarget::File(path) => Connection::open(path),
        ConnectionTarget::Memory => Connection::open_in_memory(),
        // Leading `/` makes the memdb image shared by every connection of the process.
        ConnectionTarget::NamedMemory(name) => Connection::open_with_flags(
            format!("file:/{name}?vfs=memdb"),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        ),
    };

    let mut conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn, busy_timeout, migrate) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} migrate={migrate} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(
    conn: &mut Connection,
    busy_timeout: Duration,
    migrate: bool,
) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    if migrate {
        apply_migrations(conn)?;
    }
    Ok(())
}
