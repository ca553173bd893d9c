//! Configuration, paths, and logging setup for the native local storage bridge.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{BackendKind, Config, DEFAULT_LOG_LEVEL, DEFAULT_SUITE_NAME};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, SERVICE_NAME};
pub use paths::Paths;
