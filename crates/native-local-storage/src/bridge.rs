//! The local storage bridge exposed to the host.

use crate::{parse_integer, ActivityManager, LiveActivity, PreferenceStore, StorageResult};
use tracing::info;

/// Method surface the host's generated interface expects.
///
/// Keys absent from the store read as `None`. Storage errors are returned
/// exactly as the backing store reported them.
pub trait NativeLocalStorage: Send + Sync {
    /// Current value for `key`, or `None` if never set or removed.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Persist `value` under `key`, overwriting any prior value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete the entry for `key`. Removing an absent key is a no-op.
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Delete every entry in the bridge's suite.
    fn clear(&self) -> StorageResult<()>;
}

/// Bridge between the host and a suite-scoped [`PreferenceStore`].
///
/// Holds no cache: every call goes through to the store.
pub struct LocalStorageBridge {
    store: Box<dyn PreferenceStore>,
    activities: ActivityManager,
}

impl LocalStorageBridge {
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        Self {
            store,
            activities: ActivityManager::default(),
        }
    }

    /// Suite the bridge reads, writes, and clears.
    pub fn suite_name(&self) -> &str {
        self.store.suite_name()
    }

    /// Keys currently stored in the suite, sorted.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        self.store.keys()
    }

    /// Read `key` as an integer the way preference stores do: `0` when the
    /// key is absent or does not hold a number, fractional values truncated.
    pub fn integer_for_key(&self, key: &str) -> StorageResult<i64> {
        Ok(self
            .store
            .get(key)?
            .as_deref()
            .map(parse_integer)
            .unwrap_or(0))
    }

    /// Add one to the integer stored under `key` and return the new count.
    ///
    /// The read and the write happen as one store operation, so concurrent
    /// increments are never lost. A missing or non-numeric value counts as 0.
    pub fn increment_item(&self, key: &str) -> StorageResult<i64> {
        self.store.increment(key)
    }

    /// The live activity currently tracked, if any.
    pub fn current_activity(&self) -> Option<LiveActivity> {
        self.activities.current()
    }

    /// Start a live activity showing the integer stored under `key`,
    /// replacing any activity already tracked.
    pub fn create_activity(&self, key: &str) -> StorageResult<LiveActivity> {
        let count = self.integer_for_key(key)?;
        let activity = self.activities.start(count);
        info!(key = %key, count, activity_id = %activity.id, "Live activity started");
        Ok(activity)
    }

    /// Push the integer stored under `key` into the tracked activity.
    pub fn update_activity(&self, key: &str) -> StorageResult<Option<LiveActivity>> {
        let count = self.integer_for_key(key)?;
        let activity = self.activities.update(count);
        if let Some(activity) = &activity {
            info!(key = %key, count, activity_id = %activity.id, "Live activity updated");
        }
        Ok(activity)
    }

    /// End the tracked activity with the integer stored under `key`.
    pub fn delete_activity(&self, key: &str) -> StorageResult<Option<LiveActivity>> {
        let count = self.integer_for_key(key)?;
        let activity = self.activities.end(count);
        if let Some(activity) = &activity {
            info!(key = %key, count, activity_id = %activity.id, "Live activity ended");
        }
        Ok(activity)
    }

    /// Update the tracked activity from `key`, starting one if none exists.
    pub fn auto_update_activity(&self, key: &str) -> StorageResult<LiveActivity> {
        let count = self.integer_for_key(key)?;
        Ok(self.activities.update_or_start(count))
    }
}

impl NativeLocalStorage for LocalStorageBridge {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.store.get(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.store.set(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.store.delete(key).map(|_| ())
    }

    fn clear(&self) -> StorageResult<()> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ActivityStatus, FilePreferenceStore, MemoryPreferenceStore, SqlitePreferenceStore,
        StorageError,
    };
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    fn memory_bridge() -> LocalStorageBridge {
        LocalStorageBridge::new(Box::new(MemoryPreferenceStore::new("local-storage")))
    }

    /// One bridge per backend; the TempDir keeps on-disk stores alive.
    fn all_bridges() -> Vec<(&'static str, LocalStorageBridge, Option<TempDir>)> {
        let file_dir = tempdir().unwrap();
        let file = FilePreferenceStore::open(file_dir.path(), "local-storage").unwrap();
        let sqlite = SqlitePreferenceStore::open_in_memory("local-storage").unwrap();

        vec![
            ("memory", memory_bridge(), None),
            ("file", LocalStorageBridge::new(Box::new(file)), Some(file_dir)),
            ("sqlite", LocalStorageBridge::new(Box::new(sqlite)), None),
        ]
    }

    #[test]
    fn test_set_then_get_returns_value() {
        for (backend, bridge, _dir) in all_bridges() {
            for (key, value) in [("a", "1"), ("myKey", "hello"), ("unicode", "h\u{e9}llo"), ("empty", "")] {
                bridge.set_item(key, value).unwrap();
                assert_eq!(
                    bridge.get_item(key).unwrap().as_deref(),
                    Some(value),
                    "backend {}",
                    backend
                );
            }
        }
    }

    #[test]
    fn test_never_set_key_is_absent() {
        for (backend, bridge, _dir) in all_bridges() {
            assert_eq!(bridge.get_item("never-set").unwrap(), None, "backend {}", backend);
        }
    }

    #[test]
    fn test_last_write_wins() {
        for (backend, bridge, _dir) in all_bridges() {
            bridge.set_item("a", "1").unwrap();
            bridge.set_item("a", "2").unwrap();
            assert_eq!(bridge.get_item("a").unwrap().as_deref(), Some("2"), "backend {}", backend);
        }
    }

    #[test]
    fn test_remove_is_idempotent() {
        for (backend, bridge, _dir) in all_bridges() {
            bridge.set_item("a", "1").unwrap();
            bridge.set_item("b", "2").unwrap();

            bridge.remove_item("a").unwrap();
            let after_once = (bridge.get_item("a").unwrap(), bridge.keys().unwrap());
            bridge.remove_item("a").unwrap();
            let after_twice = (bridge.get_item("a").unwrap(), bridge.keys().unwrap());

            assert_eq!(after_once.0, None, "backend {}", backend);
            assert_eq!(after_once, after_twice, "backend {}", backend);
        }
    }

    #[test]
    fn test_remove_absent_key_is_not_an_error() {
        for (_backend, bridge, _dir) in all_bridges() {
            bridge.remove_item("missing").unwrap();
        }
    }

    #[test]
    fn test_clear_removes_every_key() {
        for (backend, bridge, _dir) in all_bridges() {
            bridge.set_item("a", "1").unwrap();
            bridge.set_item("b", "2").unwrap();

            bridge.clear().unwrap();

            assert_eq!(bridge.get_item("a").unwrap(), None, "backend {}", backend);
            assert_eq!(bridge.get_item("b").unwrap(), None, "backend {}", backend);
            assert!(bridge.keys().unwrap().is_empty());
        }
    }

    #[test]
    fn test_read_failure_is_surfaced_unmodified() {
        let dir = tempdir().unwrap();
        let store = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        std::fs::write(store.path(), "[1, 2").unwrap();
        let bridge = LocalStorageBridge::new(Box::new(store));

        match bridge.get_item("a") {
            Err(StorageError::ReadFailure(message)) => assert!(message.contains("Corrupt")),
            other => panic!("expected read failure, got {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_writers() {
        for (backend, bridge, _dir) in all_bridges() {
            let bridge = Arc::new(bridge);
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let bridge = Arc::clone(&bridge);
                    std::thread::spawn(move || {
                        for i in 0..10 {
                            bridge
                                .set_item(&format!("t{}-{}", t, i), &i.to_string())
                                .unwrap();
                            bridge.set_item("shared", &t.to_string()).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(bridge.keys().unwrap().len(), 8 * 10 + 1, "backend {}", backend);
            assert_eq!(bridge.get_item("t3-9").unwrap().as_deref(), Some("9"));
            let shared: i64 = bridge.get_item("shared").unwrap().unwrap().parse().unwrap();
            assert!((0..8).contains(&shared));
        }
    }

    #[test]
    fn test_concurrent_increments_are_exact() {
        for (backend, bridge, _dir) in all_bridges() {
            let bridge = Arc::new(bridge);
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let bridge = Arc::clone(&bridge);
                    std::thread::spawn(move || {
                        for _ in 0..10 {
                            bridge.increment_item("myKey").unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            assert_eq!(bridge.integer_for_key("myKey").unwrap(), 80, "backend {}", backend);
            assert_eq!(bridge.get_item("myKey").unwrap().as_deref(), Some("80"));
        }
    }

    #[test]
    fn test_increment_uses_integer_rule() {
        let bridge = memory_bridge();
        assert_eq!(bridge.increment_item("n").unwrap(), 1);

        bridge.set_item("n", "3.9").unwrap();
        assert_eq!(bridge.increment_item("n").unwrap(), 4);

        bridge.set_item("n", "abc").unwrap();
        assert_eq!(bridge.increment_item("n").unwrap(), 1);
    }

    /// Store that rejects every write, standing in for a full disk.
    struct RejectingStore;

    impl PreferenceStore for RejectingStore {
        fn suite_name(&self) -> &str {
            "local-storage"
        }
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(Some("1".to_string()))
        }
        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::WriteFailure("quota exceeded".to_string()))
        }
        fn increment(&self, _key: &str) -> StorageResult<i64> {
            Err(StorageError::WriteFailure("quota exceeded".to_string()))
        }
        fn delete(&self, _key: &str) -> StorageResult<bool> {
            Err(StorageError::WriteFailure("quota exceeded".to_string()))
        }
        fn clear(&self) -> StorageResult<()> {
            Err(StorageError::WriteFailure("quota exceeded".to_string()))
        }
        fn keys(&self) -> StorageResult<Vec<String>> {
            Ok(vec!["a".to_string()])
        }
    }

    #[test]
    fn test_write_failure_is_surfaced_unmodified() {
        let bridge = LocalStorageBridge::new(Box::new(RejectingStore));

        for result in [
            bridge.set_item("a", "2"),
            bridge.remove_item("a"),
            bridge.clear(),
            bridge.increment_item("a").map(|_| ()),
        ] {
            match result {
                Err(StorageError::WriteFailure(message)) => assert_eq!(message, "quota exceeded"),
                other => panic!("expected write failure, got {:?}", other),
            }
        }
        assert_eq!(bridge.get_item("a").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_integer_for_key() {
        let bridge = memory_bridge();
        assert_eq!(bridge.integer_for_key("missing").unwrap(), 0);

        for (raw, expected) in [("42", 42), (" -7 ", -7), ("3.9", 3), ("abc", 0), ("", 0), ("NaN", 0)] {
            bridge.set_item("n", raw).unwrap();
            assert_eq!(bridge.integer_for_key("n").unwrap(), expected, "raw {:?}", raw);
        }
    }

    #[test]
    fn test_activity_lifecycle_follows_stored_count() {
        let bridge = memory_bridge();
        bridge.set_item("myKey", "1").unwrap();

        assert!(bridge.update_activity("myKey").unwrap().is_none());

        let created = bridge.create_activity("myKey").unwrap();
        assert_eq!(created.state.count, 1);

        bridge.set_item("myKey", "5").unwrap();
        let updated = bridge.update_activity("myKey").unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.state.count, 5);

        bridge.set_item("myKey", "6").unwrap();
        let ended = bridge.delete_activity("myKey").unwrap().unwrap();
        assert_eq!(ended.state.count, 6);
        assert_eq!(ended.status, ActivityStatus::Ended);
        assert!(bridge.current_activity().is_none());
        assert!(bridge.delete_activity("myKey").unwrap().is_none());
    }

    #[test]
    fn test_auto_update_activity_starts_then_updates() {
        let bridge = memory_bridge();

        let started = bridge.auto_update_activity("myKey").unwrap();
        assert_eq!(started.state.count, 0);

        bridge.set_item("myKey", "3").unwrap();
        let updated = bridge.auto_update_activity("myKey").unwrap();
        assert_eq!(updated.id, started.id);
        assert_eq!(updated.state.count, 3);
    }

    #[test]
    fn test_bridge_as_trait_object() {
        let bridge: Box<dyn NativeLocalStorage> = Box::new(memory_bridge());
        bridge.set_item("a", "1").unwrap();
        bridge.clear().unwrap();
        assert_eq!(bridge.get_item("a").unwrap(), None);
    }
}
