//! Output for snapshots and reports.
//!
//! This module handles:
//! - Human-readable tables with formatted byte counts
//! - JSON snapshot lines
//! - JSON report files

pub mod json;
pub mod table;

// Re-export main functions
pub use json::{read_report, snapshot_to_json_line, to_report, write_report, SwapReport};
pub use table::{format_bytes, render_table};
