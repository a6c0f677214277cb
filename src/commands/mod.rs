//! CLI command implementations.
//!
//! Commands orchestrate the library components to perform user tasks.

pub mod models;
pub mod utils;
pub mod watch;

// Re-export main command functions
pub use models::WatchArgs;
pub use utils::{display_version, validate_report_file};
pub use watch::{execute_watch, validate_args};
