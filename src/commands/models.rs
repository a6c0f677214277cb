use crate::utils::config::{TracerConfig, DEFAULT_PUBLISH_INTERVAL};
use std::path::PathBuf;
use std::time::Duration;

/// Arguments for the watch command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct WatchArgs {
    /// Tracer executable and arguments
    pub tracer: TracerConfig,

    /// Minimum time between refreshes
    pub publish_interval: Duration,

    /// Only show the first N rows (None = all)
    pub top: Option<usize>,

    /// Print each snapshot as a JSON line instead of a table
    pub json: bool,

    /// Stop automatically after this long (None = until Ctrl-C)
    pub duration: Option<Duration>,

    /// Write the final snapshot as a JSON report
    pub output: Option<PathBuf>,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            tracer: TracerConfig::default(),
            publish_interval: DEFAULT_PUBLISH_INTERVAL,
            top: None,
            json: false,
            duration: None,
            output: None,
        }
    }
}
