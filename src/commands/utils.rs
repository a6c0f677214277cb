use crate::output::{format_bytes, read_report};
use crate::utils::config::REPORT_SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)
        .with_context(|| format!("Failed to read report {}", file_path.display()))?;

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Generated: {}", report.generated_at);
    println!("  Tracer: {}", report.tracer);
    println!("  Processes: {}", report.records.len());
    println!("  Swapped In: {}", format_bytes(report.total_in_bytes()));
    println!("  Swapped Out: {}", format_bytes(report.total_out_bytes()));

    if let Some(top) = report.records.first() {
        println!("  Top Process: {} (pid {})", top.process_key, top.process_id);
    }

    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("swapwatch v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", REPORT_SCHEMA_VERSION);
    println!();
    println!("Per-process swap paging monitor built on fs_usage.");
}
