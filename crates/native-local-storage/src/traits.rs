//! Storage trait definitions.

use crate::StorageResult;

/// A durable key-value preference store scoped to one suite.
///
/// Implementations serialize access internally, so every call is atomic on
/// its own and the store can be shared across threads.
pub trait PreferenceStore: Send + Sync {
    /// Name of the suite this store reads and writes.
    fn suite_name(&self) -> &str;

    /// Retrieve a value; `None` if the key was never set or was removed.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Add one to the integer stored under `key` and return the new value.
    ///
    /// Reads and writes under the same serialization as `set`, so no
    /// concurrent increment is lost. A missing or non-numeric value counts
    /// as 0.
    fn increment(&self, key: &str) -> StorageResult<i64>;

    /// Delete a value. Returns whether the key existed.
    fn delete(&self, key: &str) -> StorageResult<bool>;

    /// Delete every entry in the suite.
    fn clear(&self) -> StorageResult<()>;

    /// All keys in the suite, sorted.
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Check if a key exists
    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
