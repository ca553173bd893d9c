//! File-backed preference store.
//!
//! Each suite is one JSON object (`<dir>/<suite>.json`) mapping keys to
//! string values. Every call reads the document from disk; writes replace it
//! atomically (temp file + rename) so a crash never leaves a torn document.
//!
//! Read-modify-write cycles hold an in-process mutex and an advisory lock on
//! a sidecar `.<suite>.json.lock` file, so a one-shot CLI write and a running
//! bridge on the same suite cannot interleave. Plain reads take neither: the
//! rename makes every document they see complete.

use crate::{incremented, PreferenceStore, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

type Document = BTreeMap<String, String>;

/// JSON-document preference store for one suite.
pub struct FilePreferenceStore {
    suite_name: String,
    path: PathBuf,
    lock_path: PathBuf,
    /// Serializes read-modify-write cycles within the process; `lock_path`
    /// serializes them across processes.
    lock: Mutex<()>,
}

impl FilePreferenceStore {
    /// Open the store for `suite_name` under `dir`, creating `dir` if needed.
    /// The document itself is created on first write.
    pub fn open(dir: &Path, suite_name: &str) -> StorageResult<Self> {
        fs::create_dir_all(dir).map_err(|e| {
            StorageError::Platform(format!(
                "Failed to create preference directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self {
            suite_name: suite_name.to_string(),
            path: dir.join(format!("{}.json", suite_name)),
            lock_path: dir.join(format!(".{}.json.lock", suite_name)),
            lock: Mutex::new(()),
        })
    }

    /// Path of the suite document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Take the cross-process lock. Released when the returned file drops.
    fn lock_document(&self) -> StorageResult<fs::File> {
        let lock_error = |e: io::Error| {
            StorageError::WriteFailure(format!(
                "Failed to lock {}: {}",
                self.lock_path.display(),
                e
            ))
        };

        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(lock_error)?;
        file.lock().map_err(lock_error)?;
        Ok(file)
    }

    fn read_document(&self) -> StorageResult<Document> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => {
                return Err(StorageError::ReadFailure(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if content.trim().is_empty() {
            return Ok(Document::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::ReadFailure(format!(
                "Corrupt preference document {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write_document(&self, document: &Document) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(document)
            .map_err(|e| StorageError::WriteFailure(e.to_string()))?;

        atomic_write_text(&self.path, &content).map_err(|e| {
            StorageError::WriteFailure(format!("Failed to write {}: {}", self.path.display(), e))
        })
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn suite_name(&self) -> &str {
        &self.suite_name
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_document()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        debug!(suite = %self.suite_name, key = %key, "Setting preference");

        let _guard = self.lock.lock();
        let _file_lock = self.lock_document()?;
        let mut document = self.read_document()?;
        document.insert(key.to_string(), value.to_string());
        self.write_document(&document)
    }

    fn increment(&self, key: &str) -> StorageResult<i64> {
        debug!(suite = %self.suite_name, key = %key, "Incrementing preference");

        let _guard = self.lock.lock();
        let _file_lock = self.lock_document()?;
        let mut document = self.read_document()?;
        let value = incremented(document.get(key).map(String::as_str));
        document.insert(key.to_string(), value.to_string());
        self.write_document(&document)?;
        Ok(value)
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        debug!(suite = %self.suite_name, key = %key, "Deleting preference");

        let _guard = self.lock.lock();
        let _file_lock = self.lock_document()?;
        let mut document = self.read_document()?;
        if document.remove(key).is_none() {
            return Ok(false);
        }
        self.write_document(&document)?;
        Ok(true)
    }

    fn clear(&self) -> StorageResult<()> {
        debug!(suite = %self.suite_name, path = %self.path.display(), "Clearing suite");

        let _guard = self.lock.lock();
        let _file_lock = self.lock_document()?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailure(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.read_document()?.into_keys().collect())
    }
}

fn atomic_write_text(path: &Path, content: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

    let tmp_path = dir.join(format!(
        ".{}.tmp.{}.{}",
        file_name,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ));

    let write_result = (|| -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, path)?;

        if let Ok(parent_dir) = fs::File::open(dir) {
            let _ = parent_dir.sync_all();
        }
        Ok(())
    })();

    if write_result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    write_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_operations() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();

        assert_eq!(storage.get("test_key").unwrap(), None);

        storage.set("test_key", "test_value").unwrap();
        assert_eq!(storage.get("test_key").unwrap(), Some("test_value".to_string()));

        storage.set("test_key", "new_value").unwrap();
        assert_eq!(storage.get("test_key").unwrap(), Some("new_value".to_string()));

        assert!(storage.delete("test_key").unwrap());
        assert!(!storage.delete("test_key").unwrap());
        assert_eq!(storage.get("test_key").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
            storage.set("myKey", "42").unwrap();
        }

        let reopened = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        assert_eq!(reopened.get("myKey").unwrap(), Some("42".to_string()));
    }

    #[test]
    fn test_reads_see_external_writes() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        storage.set("a", "1").unwrap();

        fs::write(storage.path(), r#"{ "a": "changed elsewhere" }"#).unwrap();

        assert_eq!(storage.get("a").unwrap(), Some("changed elsewhere".to_string()));
    }

    #[test]
    fn test_document_is_plain_json_object() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        storage.set("b", "2").unwrap();
        storage.set("a", "1").unwrap();

        let raw = fs::read_to_string(dir.path().join("local-storage.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, serde_json::json!({ "a": "1", "b": "2" }));
    }

    #[test]
    fn test_clear_removes_document_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        storage.set("a", "1").unwrap();

        storage.clear().unwrap();
        storage.clear().unwrap();

        assert!(!storage.path().exists());
        assert_eq!(storage.get("a").unwrap(), None);
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn test_suites_are_isolated() {
        let dir = tempdir().unwrap();
        let first = FilePreferenceStore::open(dir.path(), "first").unwrap();
        let second = FilePreferenceStore::open(dir.path(), "second").unwrap();

        first.set("a", "1").unwrap();
        second.set("a", "2").unwrap();
        first.clear().unwrap();

        assert_eq!(first.get("a").unwrap(), None);
        assert_eq!(second.get("a").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_corrupt_document_is_a_read_failure() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        fs::write(storage.path(), "{ not json").unwrap();

        assert!(matches!(storage.get("a"), Err(StorageError::ReadFailure(_))));
        assert!(matches!(storage.keys(), Err(StorageError::ReadFailure(_))));
    }

    #[test]
    fn test_set_does_not_overwrite_corrupt_document() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        fs::write(storage.path(), "{ not json").unwrap();

        assert!(storage.set("a", "1").is_err());
        assert_eq!(fs::read_to_string(storage.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_clear_recovers_from_corrupt_document() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        fs::write(storage.path(), "{ not json").unwrap();

        storage.clear().unwrap();
        storage.set("a", "1").unwrap();
        assert_eq!(storage.get("a").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_empty_document_reads_as_empty() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        fs::write(storage.path(), "").unwrap();

        assert_eq!(storage.get("a").unwrap(), None);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        for i in 0..5 {
            storage.set("k", &i.to_string()).unwrap();
        }

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                ".local-storage.json.lock".to_string(),
                "local-storage.json".to_string()
            ]
        );
    }

    #[test]
    fn test_separate_handles_do_not_lose_increments() {
        // Each handle has its own mutex, like two processes on one suite.
        let dir = tempdir().unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        storage.increment("myKey").unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        assert_eq!(storage.get("myKey").unwrap(), Some("40".to_string()));
    }

    #[test]
    fn test_increment_refuses_corrupt_document() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        fs::write(storage.path(), "{ not json").unwrap();

        assert!(matches!(storage.increment("a"), Err(StorageError::ReadFailure(_))));
        assert_eq!(fs::read_to_string(storage.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_failed_set_is_a_write_failure_and_keeps_old_value() {
        let dir = tempdir().unwrap();
        let storage = FilePreferenceStore::open(dir.path(), "local-storage").unwrap();
        storage.set("a", "1").unwrap();

        let lock_path = dir.path().join(".local-storage.json.lock");
        fs::remove_file(&lock_path).unwrap();
        fs::create_dir(&lock_path).unwrap();

        assert!(matches!(storage.set("a", "2"), Err(StorageError::WriteFailure(_))));
        assert!(matches!(storage.increment("a"), Err(StorageError::WriteFailure(_))));
        assert_eq!(storage.get("a").unwrap(), Some("1".to_string()));
    }

    #[test]
    fn test_atomic_write_failure_cleans_up_temp_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("occupied");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("child"), "x").unwrap();

        assert!(atomic_write_text(&target, "{}").is_err());

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["occupied".to_string()]);
    }
}
