//! Store handle: a fixed-size pool of bootstrapped SQLite connections.
//!
//! # Responsibility
//! - Hand out one connection per logical operation (`Store::acquire`).
//! - Return connections to the pool on every exit path via `Drop`.
//! - Open IMMEDIATE transactions on a scoped connection.
//!
//! # Invariants
//! - At most `pool_size` connections are ever checked out.
//! - Acquisition never waits longer than `acquire_timeout`; a timeout is
//!   reported as `DbError::StoreUnavailable` and is never retried here.
//! - `Transaction::commit` and `Transaction::rollback` consume the
//!   transaction; dropping an unfinished transaction rolls it back.

use super::open::{open_connection, ConnectionTarget};
use super::{DbError, DbResult};
use crate::config::StoreConfig;
use log::{debug, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Shared, cloneable handle over the connection pool.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

#[derive(Debug)]
struct StoreInner {
    idle: Mutex<Vec<Connection>>,
    returned: Condvar,
    pool_size: usize,
    acquire_timeout: Duration,
}

impl Store {
    /// Opens a file-backed store, migrating the schema on the first connection.
    pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> DbResult<Self> {
        Self::build(
            ConnectionTarget::File(path.as_ref().to_path_buf()),
            config,
        )
    }

    /// Opens a fresh in-memory store shared by all pooled connections.
    pub fn open_in_memory(config: &StoreConfig) -> DbResult<Self> {
        let name = format!("campus-{}", Uuid::new_v4().simple());
        Self::build(ConnectionTarget::NamedMemory(name), config)
    }

    fn build(target: ConnectionTarget, config: &StoreConfig) -> DbResult<Self> {
        config
            .validate()
            .map_err(|err| DbError::StoreUnavailable(err.to_string()))?;

        let mut connections = Vec::with_capacity(config.pool_size);
        for index in 0..config.pool_size {
            // Only the first connection runs migrations; the rest reuse the schema.
            let conn = open_connection(&target, config.busy_timeout(), index == 0)?;
            connections.push(conn);
        }

        info!(
            "event=store_open module=db status=ok pool_size={} acquire_timeout_ms={}",
            config.pool_size, config.acquire_timeout_ms
        );

        Ok(Self {
            inner: Arc::new(StoreInner {
                idle: Mutex::new(connections),
                returned: Condvar::new(),
                pool_size: config.pool_size,
                acquire_timeout: config.acquire_timeout(),
            }),
        })
    }

    /// Checks out one connection, waiting up to the configured timeout.
    ///
    /// # Errors
    /// - `DbError::StoreUnavailable` when every connection stays checked out
    ///   for the whole timeout or the pool lock is poisoned.
    pub fn acquire(&self) -> DbResult<ScopedConnection<'_>> {
        let started_at = Instant::now();
        let guard = self.inner.idle.lock().map_err(|_| poisoned())?;
        let (mut idle, _) = self
            .inner
            .returned
            .wait_timeout_while(guard, self.inner.acquire_timeout, |idle| idle.is_empty())
            .map_err(|_| poisoned())?;

        match idle.pop() {
            Some(conn) => {
                debug!(
                    "event=store_acquire module=db status=ok wait_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(ScopedConnection {
                    conn: Some(conn),
                    pool: &self.inner,
                })
            }
            None => {
                warn!(
                    "event=store_acquire module=db status=error error_code=pool_exhausted wait_ms={} pool_size={}",
                    started_at.elapsed().as_millis(),
                    self.inner.pool_size
                );
                Err(DbError::StoreUnavailable(format!(
                    "no connection available within {} ms",
                    self.inner.acquire_timeout.as_millis()
                )))
            }
        }
    }

    /// Total number of pooled connections.
    pub fn pool_size(&self) -> usize {
        self.inner.pool_size
    }

    /// Number of connections currently not checked out.
    pub fn idle_connections(&self) -> usize {
        self.inner
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn poisoned() -> DbError {
    DbError::StoreUnavailable("connection pool lock poisoned".to_string())
}

/// A checked-out connection, returned to the pool when dropped.
#[derive(Debug)]
pub struct ScopedConnection<'s> {
    conn: Option<Connection>,
    pool: &'s StoreInner,
}

impl ScopedConnection<'_> {
    /// Opens an IMMEDIATE transaction so the write lock is held from the
    /// first statement (reference checks included) until commit/rollback.
    pub fn begin(&mut self) -> DbResult<Transaction<'_>> {
        let tx = self.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(tx)
    }
}

impl Deref for ScopedConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("scoped connection is present until drop")
    }
}

impl DerefMut for ScopedConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn
            .as_mut()
            .expect("scoped connection is present until drop")
    }
}

impl Drop for ScopedConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool
                .idle
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(conn);
            self.pool.returned.notify_one();
        }
    }
}
