//! Configuration and constants for the monitor.

use std::time::Duration;

/// Trace utility launched by default
pub const DEFAULT_TRACER_PATH: &str = "/usr/bin/fs_usage";

/// Continuous wide-format watch, filtered to filesystem and disk I/O
pub const DEFAULT_TRACER_ARGS: &[&str] = &["-w", "-f", "filesys,diskio"];

/// Minimum time between two published snapshots
pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_millis(500);

/// Only paging against the VM swap files is counted
pub const SWAPFILE_MARKER: &str = "/VM/swapfile";

// Tokens emitted by fs_usage for paging operations
pub const PAGE_IN_TAG: &str = "PgIn";
pub const PAGE_OUT_TAG: &str = "PgOut";
pub const BYTES_PREFIX: &str = "B=";
pub const DESCRIPTOR_DELIMITER: &str = "W";

/// How often the reaper checks on the tracer and flushes pending counters
pub const REAP_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long a stopped tracer gets to exit after SIGTERM before SIGKILL
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// How long to wait for the output pipes to close once the tracer is gone
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Size of a single read from the tracer's stdout
pub const READ_CHUNK_SIZE: usize = 4096;

/// Current report schema version
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// How the external tracer is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_TRACER_PATH.to_string(),
            args: DEFAULT_TRACER_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl TracerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Program and arguments joined for display
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
