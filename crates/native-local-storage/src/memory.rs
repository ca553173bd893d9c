//! In-memory preference store.

use crate::{incremented, PreferenceStore, StorageResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Process-local store. Nothing survives the process.
pub struct MemoryPreferenceStore {
    suite_name: String,
    data: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            data: Mutex::new(HashMap::new()),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn suite_name(&self) -> &str {
        &self.suite_name
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.data.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(suite = %self.suite_name, key = %key, "Setting preference");
        self.data.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn increment(&self, key: &str) -> StorageResult<i64> {
        debug!(suite = %self.suite_name, key = %key, "Incrementing preference");
        let mut data = self.data.lock();
        let value = incremented(data.get(key).map(String::as_str));
        data.insert(key.to_string(), value.to_string());
        Ok(value)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        debug!(suite = %self.suite_name, key = %key, "Deleting preference");
        Ok(self.data.lock().remove(key).is_some())
    }

    fn clear(&self) -> StorageResult<()> {
        debug!(suite = %self.suite_name, "Clearing suite");
        self.data.lock().clear();
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys: Vec<String> = self.data.lock().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryPreferenceStore::new("local-storage");

        storage.set("test_key", "test_value").unwrap();
        assert_eq!(storage.get("test_key").unwrap(), Some("test_value".to_string()));

        assert!(storage.has("test_key").unwrap());
        assert!(!storage.has("nonexistent").unwrap());

        assert!(storage.delete("test_key").unwrap());
        assert!(!storage.delete("test_key").unwrap());
        assert_eq!(storage.get("test_key").unwrap(), None);
    }

    #[test]
    fn test_increment_starts_from_zero_and_stores_text() {
        let storage = MemoryPreferenceStore::new("local-storage");

        assert_eq!(storage.increment("count").unwrap(), 1);
        assert_eq!(storage.increment("count").unwrap(), 2);
        assert_eq!(storage.get("count").unwrap(), Some("2".to_string()));

        storage.set("count", "not a number").unwrap();
        assert_eq!(storage.increment("count").unwrap(), 1);
    }

    #[test]
    fn test_keys_are_sorted_and_clear_empties() {
        let storage = MemoryPreferenceStore::new("local-storage");
        storage.set("b", "2").unwrap();
        storage.set("a", "1").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["a", "b"]);

        storage.clear().unwrap();
        assert!(storage.keys().unwrap().is_empty());
    }
}
