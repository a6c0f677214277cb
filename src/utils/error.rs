//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while parsing a trace line
///
/// These never leave the parser: `parse_line` logs them and drops the line.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("can't find W column: {0}")]
    MissingDelimiter(String),

    #[error("invalid process id in descriptor: {0}")]
    InvalidProcessId(String),
}

/// Errors that can occur while driving a monitoring session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("monitoring session is already running")]
    AlreadyRunning,

    #[error("monitoring session is not running")]
    NotRunning,

    #[error("failed to launch tracer {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tracer {0} pipe was not captured")]
    MissingPipe(&'static str),

    #[error("failed to start session worker: {0}")]
    Worker(#[source] std::io::Error),

    #[error("tracer reported: {0}")]
    Tracer(String),

    #[error("tracer exited unexpectedly: {0}")]
    Exited(std::process::ExitStatus),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
