//! Logging initialization for the bridge.
//!
//! Thin wrapper over the observability crate: structured JSONL goes to the
//! bridge's log file and a compact copy goes to stderr, so stdout stays free
//! for protocol traffic when serving over stdio.

use crate::Paths;

/// Service name written into every log line.
pub const SERVICE_NAME: &str = "native-local-storage";

/// Initialize the logging system.
///
/// `RUST_LOG` takes precedence over `level`. A log file that cannot be opened
/// is reported on stderr and logging stays disabled; storage keeps working.
pub fn init_logging(level: &str, paths: &Paths) {
    let result = observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
    });

    if let Err(e) = result {
        eprintln!(
            "failed to open log file {}: {}",
            paths.log_file().display(),
            e
        );
    }
}
