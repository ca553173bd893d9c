//! Configuration management for the bridge.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Preference suite used when none is configured.
pub const DEFAULT_SUITE_NAME: &str = "local-storage";

const ENV_LOG_LEVEL: &str = "NATIVE_LOCAL_STORAGE_LOG_LEVEL";
const ENV_BACKEND: &str = "NATIVE_LOCAL_STORAGE_BACKEND";
const ENV_SUITE: &str = "NATIVE_LOCAL_STORAGE_SUITE";

/// Which preference store backs the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON document per suite in the OS preference directory.
    #[default]
    File,
    /// A `preferences` table in a local SQLite database.
    Sqlite,
    /// Process-local map; nothing survives a restart.
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::File => "file",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "sqlite" => Ok(BackendKind::Sqlite),
            "memory" => Ok(BackendKind::Memory),
            other => Err(CoreError::Config(format!("unknown storage backend: {}", other))),
        }
    }
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Preference store backend.
    #[serde(default)]
    pub backend: BackendKind,
    /// Preference suite (namespace) the bridge reads and clears.
    #[serde(default = "default_suite_name")]
    pub suite_name: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_suite_name() -> String {
    DEFAULT_SUITE_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            backend: BackendKind::default(),
            suite_name: default_suite_name(),
        }
    }
}

impl Config {
    /// Load configuration from the config file (if present), then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`Config::load`]). Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = backend.parse()?;
        }
        if let Some(suite) = lookup(ENV_SUITE) {
            self.suite_name = suite;
        }
        Ok(())
    }

    /// Reject configurations no backend can serve.
    pub fn validate(&self) -> CoreResult<()> {
        let suite = self.suite_name.trim();
        if suite.is_empty() {
            return Err(CoreError::Config("suite_name must not be empty".to_string()));
        }
        if suite.contains(['/', '\\']) || suite == "." || suite == ".." {
            return Err(CoreError::Config(format!(
                "suite_name must be a single path component: {}",
                self.suite_name
            )));
        }
        Ok(())
    }
}
