//! Shared SQLite connection.
//!
//! The service keeps one connection behind a mutex. Each repository call
//! holds the lock for its statements, which serializes writers.

use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::{Result, StorageError};
use crate::schema::run_migrations;

/// How long a statement waits on a locked database file.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Cloneable handle to the service's connection.
#[derive(Clone)]
pub struct ConnectionPool {
    conn: Arc<Mutex<Connection>>,
}

impl ConnectionPool {
    /// Opens (or creates) a database file and migrates it.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::prepare(Connection::open(path)?)
    }

    /// Opens a private in-memory database and migrates it.
    pub fn in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        // In-memory databases report "memory" here and ignore WAL
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Locks the connection for the caller.
    pub fn get(&self) -> Result<PooledConnection<'_>> {
        self.conn
            .lock()
            .map(|guard| PooledConnection { guard })
            .map_err(|_| StorageError::Config("connection lock poisoned".to_string()))
    }
}

/// Locked connection, released on drop.
pub struct PooledConnection<'a> {
    guard: MutexGuard<'a, Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.guard
    }
}
