//! # Observability
//!
//! Structured logging for the native local storage bridge.
//!
//! Binaries call [`init_with_config`] once at startup and use the standard
//! `tracing` macros everywhere else. Library crates never install a
//! subscriber; they only emit events.
//!
//! Every event is written as one JSON object per line to a central log file
//! (`~/.native-local-storage/logs/bridge.jsonl` unless overridden), so the
//! stream can be followed with `tail -f ... | jq`. Writes are appended and
//! flushed per line, which keeps concurrent writers from interleaving partial
//! lines.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "native-local-storage".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     })
//!     .ok();
//!     tracing::info!("bridge started");
//! }
//! ```

mod json_layer;
mod writer;

use std::io;
use std::path::PathBuf;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{CentralLogWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by the `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.native-local-storage/logs/bridge.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit compact, human-readable logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Central log file location used when [`LogConfig::log_path`] is unset.
pub fn default_log_path() -> io::Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory not found"))?;
    Ok(home
        .join(".native-local-storage")
        .join("logs")
        .join("bridge.jsonl"))
}

/// Initialize the logging layer with custom configuration.
///
/// Installing a subscriber twice is not an error; the first one stays active.
///
/// # Errors
///
/// Returns an error if the log file (or its parent directory) cannot be
/// created or opened.
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    let log_path = match config.log_path.clone() {
        Some(path) => path,
        None => default_log_path()?,
    };

    let writer = CentralLogWriter::new(&log_path)?;
    let json_layer = JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer));

    let stderr_layer = if config.also_stderr {
        Some(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .compact()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
    } else {
        None
    };

    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level))
    };

    let installed = tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter()))
        .with(stderr_layer.map(|l| l.with_filter(env_filter())))
        .try_init();

    if installed.is_ok() {
        tracing::info!(
            service = %config.service_name,
            log_path = %log_path.display(),
            "observability initialized"
        );
    }

    Ok(())
}
