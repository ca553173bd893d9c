//! File system paths for the bridge.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Directory name used under the home and preference directories.
const APP_DIR_NAME: &str = "native-local-storage";
/// Socket filename under the base directory.
const SOCKET_NAME: &str = "bridge.sock";

/// Manages file system paths for the bridge.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for runtime files (~/.native-local-storage)
    base_dir: PathBuf,
    /// Directory holding one preference document per suite
    preferences_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance.
    ///
    /// Runtime files go to `~/.native-local-storage`; preference documents go
    /// to the OS preference directory (`~/Library/Preferences` on macOS, the
    /// XDG config dir on Linux, roaming AppData on Windows).
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;
        let preference_root = dirs::preference_dir().ok_or_else(|| {
            CoreError::Path("Could not determine preference directory".to_string())
        })?;

        Ok(Self {
            base_dir: home.join(format!(".{}", APP_DIR_NAME)),
            preferences_dir: preference_root.join(APP_DIR_NAME),
        })
    }

    /// Create a Paths instance rooted entirely at `base_dir`.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            preferences_dir: base_dir.join("preferences"),
            base_dir,
        }
    }

    /// Get the base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the directory holding preference documents.
    pub fn preferences_dir(&self) -> &Path {
        &self.preferences_dir
    }

    /// Get the config file path.
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the SQLite preference database path.
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join("preferences.sqlite")
    }

    /// Get the bridge socket path.
    pub fn socket_file(&self) -> PathBuf {
        self.base_dir.join(SOCKET_NAME)
    }

    /// Get the PID file path.
    pub fn pid_file(&self) -> PathBuf {
        self.base_dir.join("bridge.pid")
    }

    /// Get the logs directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the central log file path.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("bridge.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(&self.preferences_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
