//! JSON output: one-line snapshots and report files.
//!
//! A report is the final snapshot of a session plus enough metadata to
//! know where it came from.

use crate::aggregator::{Snapshot, UsageRecord};
use crate::utils::config::{TracerConfig, REPORT_SCHEMA_VERSION};
use crate::utils::error::OutputError;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Top-level report structure written to JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Timestamp when the report was generated (RFC 3339)
    pub generated_at: String,

    /// Tracer command line the counters came from
    pub tracer: String,

    /// Records in display order
    pub records: Vec<UsageRecord>,
}

impl SwapReport {
    pub fn total_in_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.total_in_bytes).sum()
    }

    pub fn total_out_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.total_out_bytes).sum()
    }
}

/// Build a report from a snapshot
pub fn to_report(snapshot: &Snapshot, tracer: &TracerConfig) -> SwapReport {
    SwapReport {
        version: REPORT_SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        tracer: tracer.command_line(),
        records: snapshot.records().to_vec(),
    }
}

/// Serialize a snapshot as a single JSON line (no trailing newline)
pub fn snapshot_to_json_line(snapshot: &Snapshot) -> Result<String, OutputError> {
    serde_json::to_string(snapshot).map_err(OutputError::SerializationFailed)
}

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_report(report: &SwapReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!(
        "Report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Read a report from a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report(input_path: impl AsRef<Path>) -> Result<SwapReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: SwapReport =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, {} records",
        report.version,
        report.records.len()
    );

    Ok(report)
}

fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
