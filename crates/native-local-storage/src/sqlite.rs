//! SQLite-backed preference store.

use crate::migrations::run_migrations;
use crate::{incremented, PreferenceStore, StorageError, StorageResult};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use tracing::{debug, info};

/// Preference store keeping one suite's rows in a shared `preferences` table.
pub struct SqlitePreferenceStore {
    suite_name: String,
    conn: Mutex<Connection>,
}

impl SqlitePreferenceStore {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub fn open(path: &Path, suite_name: &str) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Platform(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        info!(path = %path.display(), suite = %suite_name, "Opening preference database");

        let conn = Connection::open(path).map_err(platform_error)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )
        .map_err(platform_error)?;

        Self::with_connection(conn, suite_name)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory(suite_name: &str) -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(platform_error)?;
        Self::with_connection(conn, suite_name)
    }

    fn with_connection(conn: Connection, suite_name: &str) -> StorageResult<Self> {
        run_migrations(&conn).map_err(|e| {
            StorageError::Platform(format!("Failed to migrate preference database: {}", e))
        })?;

        Ok(Self {
            suite_name: suite_name.to_string(),
            conn: Mutex::new(conn),
        })
    }
}

fn platform_error(e: rusqlite::Error) -> StorageError {
    StorageError::Platform(e.to_string())
}

fn read_error(e: rusqlite::Error) -> StorageError {
    StorageError::ReadFailure(e.to_string())
}

fn write_error(e: rusqlite::Error) -> StorageError {
    StorageError::WriteFailure(e.to_string())
}

impl PreferenceStore for SqlitePreferenceStore {
    fn suite_name(&self) -> &str {
        &self.suite_name
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let conn = self.conn.lock();
        let result = conn.query_row(
            "SELECT value FROM preferences WHERE suite = ?1 AND key = ?2",
            params![self.suite_name, key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(read_error(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(suite = %self.suite_name, key = %key, "Setting preference");

        let now = Utc::now().to_rfc3339();
        self.conn
            .lock()
            .execute(
                "INSERT INTO preferences (suite, key, value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(suite, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![self.suite_name, key, value, now],
            )
            .map_err(write_error)?;
        Ok(())
    }

    fn increment(&self, key: &str) -> StorageResult<i64> {
        debug!(suite = %self.suite_name, key = %key, "Incrementing preference");

        let mut conn = self.conn.lock();
        // IMMEDIATE takes the write lock up front, so other connections to
        // the same database cannot slip a write between the read and upsert.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(write_error)?;

        let current: Option<String> = tx
            .query_row(
                "SELECT value FROM preferences WHERE suite = ?1 AND key = ?2",
                params![self.suite_name, key],
                |row| row.get(0),
            )
            .optional()
            .map_err(read_error)?;
        let value = incremented(current.as_deref());

        tx.execute(
            "INSERT INTO preferences (suite, key, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(suite, key) DO UPDATE SET value = ?3, updated_at = ?4",
            params![self.suite_name, key, value.to_string(), Utc::now().to_rfc3339()],
        )
        .map_err(write_error)?;
        tx.commit().map_err(write_error)?;
        Ok(value)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        debug!(suite = %self.suite_name, key = %key, "Deleting preference");

        let count = self
            .conn
            .lock()
            .execute(
                "DELETE FROM preferences WHERE suite = ?1 AND key = ?2",
                params![self.suite_name, key],
            )
            .map_err(write_error)?;
        Ok(count > 0)
    }

    fn clear(&self) -> StorageResult<()> {
        debug!(suite = %self.suite_name, "Clearing suite");

        self.conn
            .lock()
            .execute(
                "DELETE FROM preferences WHERE suite = ?1",
                params![self.suite_name],
            )
            .map_err(write_error)?;
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT key FROM preferences WHERE suite = ?1 ORDER BY key")
            .map_err(read_error)?;
        let keys = stmt
            .query_map(params![self.suite_name], |row| row.get(0))
            .map_err(read_error)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(read_error)?;
        Ok(keys)
    }
}
