//! Persistent key-value local storage for a host scripting layer.
//!
//! The [`LocalStorageBridge`] exposes `getItem` / `setItem` / `removeItem` /
//! `clear` (the [`NativeLocalStorage`] contract) and delegates durability to a
//! [`PreferenceStore`] scoped to one preference suite:
//! - **File**: one JSON document per suite in the OS preference directory
//! - **SQLite**: a `preferences` table keyed by suite and key
//! - **Memory**: process-local, for tests and throwaway hosts

mod activity;
mod bridge;
mod file;
mod memory;
mod migrations;
mod sqlite;
mod traits;

pub use activity::{ActivityManager, ActivityState, ActivityStatus, LiveActivity, DEFAULT_ACTIVITY_NAME};
pub use bridge::{LocalStorageBridge, NativeLocalStorage};
pub use file::FilePreferenceStore;
pub use memory::MemoryPreferenceStore;
pub use sqlite::SqlitePreferenceStore;
pub use traits::PreferenceStore;

use bridge_config_and_utils::{BackendKind, Config, Paths};
use thiserror::Error;

/// Error type for storage operations.
///
/// A missing key is not an error; lookups return `Ok(None)`.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The store could not be read (corrupt data, permissions).
    #[error("Read failure: {0}")]
    ReadFailure(String),

    /// The store rejected a write (I/O error, resource exhaustion).
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// The backend could not be opened at all.
    #[error("Platform storage error: {0}")]
    Platform(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Read a stored value as an integer the way preference stores do: `0` when
/// it does not hold a number, fractional values truncated toward zero.
pub(crate) fn parse_integer(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return value;
    }
    match trimmed.parse::<f64>() {
        // `as` saturates at the i64 bounds.
        Ok(value) if value.is_finite() => value.trunc() as i64,
        _ => 0,
    }
}

/// The value an increment writes after reading `current`.
pub(crate) fn incremented(current: Option<&str>) -> i64 {
    current.map(parse_integer).unwrap_or(0).saturating_add(1)
}

/// Open the preference store selected by `config` for its suite.
pub fn create_store(config: &Config, paths: &Paths) -> StorageResult<Box<dyn PreferenceStore>> {
    let suite = config.suite_name.as_str();
    match config.backend {
        BackendKind::File => Ok(Box::new(FilePreferenceStore::open(
            paths.preferences_dir(),
            suite,
        )?)),
        BackendKind::Sqlite => Ok(Box::new(SqlitePreferenceStore::open(
            &paths.database_file(),
            suite,
        )?)),
        BackendKind::Memory => Ok(Box::new(MemoryPreferenceStore::new(suite))),
    }
}

/// Create a bridge over the configured preference store.
pub fn create_bridge(config: &Config, paths: &Paths) -> StorageResult<LocalStorageBridge> {
    let store = create_store(config, paths)?;
    Ok(LocalStorageBridge::new(store))
}
