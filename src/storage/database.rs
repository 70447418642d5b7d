//! `SQLite` backed device storage.
//!
//! The database is stored at `~/.mailroom/mailroom.db` and holds a single
//! key/value table. Each logical key maps to one JSON document:
//! - `pending_operations` - queued writes awaiting replay
//! - `mailbox_cache` - read-side mailbox snapshot
//! - `last_sync` - timestamp of the last successful replay

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::Paths;
use crate::error::MailroomError;

use super::migrations;

/// Database connection wrapper.
///
/// Clones share the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open() -> Result<Self, MailroomError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, MailroomError> {
        let conn = Connection::open(path).map_err(|e| {
            MailroomError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, MailroomError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            MailroomError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, MailroomError> {
        migrations::run(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, MailroomError> {
        self.conn
            .lock()
            .map_err(|_| MailroomError::Database("Storage lock poisoned".to_string()))
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, MailroomError> {
        let conn = self.lock()?;
        migrations::get_version(&conn)
    }

    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, MailroomError> {
        self.lock()?
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| MailroomError::Database(format!("Failed to read {key}: {e}")))
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), MailroomError> {
        self.lock()?
            .execute(
                r"INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                 updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map_err(|e| MailroomError::Database(format!("Failed to write {key}: {e}")))?;

        Ok(())
    }

    /// Delete the value stored under `key`.
    ///
    /// Returns whether a value existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn remove_item(&self, key: &str) -> Result<bool, MailroomError> {
        let rows = self
            .lock()?
            .execute("DELETE FROM local_storage WHERE key = ?1", [key])
            .map_err(|e| MailroomError::Database(format!("Failed to remove {key}: {e}")))?;

        Ok(rows > 0)
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> Result<(), MailroomError> {
        self.lock()?
            .execute_batch(sql)
            .map_err(|e| MailroomError::Database(e.to_string()))
    }
}
