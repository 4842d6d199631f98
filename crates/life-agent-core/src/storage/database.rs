//! SQLite-backed store for commitments, triggers and interventions.
//!
//! Each `Database` owns one connection. Callers that need concurrency open
//! one `Database` per thread on the same file; SQLite serializes writers and
//! the busy timeout makes contending writers wait instead of failing.

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use super::{data_dir, migrations};
use crate::error::{Result, StorageError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database holding the three accountability tables.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/life-agent/life_agent.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("life_agent.db");
        Self::open_at(path)
    }

    /// Open (or create) a database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(StorageError::from)?;
        let mode: String = conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(StorageError::from)?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "opened database");

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and throwaway runs).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(())
    }
}
