//! Bridge process management.

mod lifecycle;
mod serve;

pub use lifecycle::{check_status, forward_activity, stop_bridge};
pub use serve::run_bridge;

/// Result type for the binary's top-level operations.
pub type AppResult<T> = Result<T, Box<dyn std::error::Error>>;
