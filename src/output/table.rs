//! Plain-text table of per-process swap usage.

use crate::aggregator::{Snapshot, UsageRecord};

const PROCESS_WIDTH: usize = 32;
const BYTES_WIDTH: usize = 10;
const COUNT_WIDTH: usize = 8;

/// Format a byte count the way a file browser would
///
/// Decimal units; precision grows with the unit.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [(&str, u64, i32); 3] = [
        ("KB", 1_000, 0),
        ("MB", 1_000_000, 1),
        ("GB", 1_000_000_000, 2),
    ];

    if bytes < 1_000 {
        return match bytes {
            1 => "1 byte".to_string(),
            n => format!("{} bytes", n),
        };
    }

    // Round before picking the unit so 999_999 reads "1.0 MB", not "1000 KB"
    for (unit, scale, precision) in UNITS {
        let value = round_to(bytes as f64 / scale as f64, precision);
        if value < 1_000.0 {
            return format!("{:.*} {}", precision as usize, value, unit);
        }
    }

    format!("{:.2} TB", bytes as f64 / 1_000_000_000_000.0)
}

fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10f64.powi(precision);
    (value * factor).round() / factor
}

/// Byte cell: zero totals are left blank
fn bytes_cell(bytes: u64) -> String {
    if bytes > 0 {
        format_bytes(bytes)
    } else {
        String::new()
    }
}

pub fn render_header() -> String {
    format!(
        "{:<pw$} | {:>bw$} | {:>bw$} | {:>cw$} | {:>cw$}",
        "Process",
        "Swap In",
        "Swap Out",
        "In Page",
        "Out Page",
        pw = PROCESS_WIDTH,
        bw = BYTES_WIDTH,
        cw = COUNT_WIDTH,
    )
}

pub fn render_row(record: &UsageRecord) -> String {
    format!(
        "{:<pw$.pw$} | {:>bw$} | {:>bw$} | {:>cw$} | {:>cw$}",
        record.process_key,
        bytes_cell(record.total_in_bytes),
        bytes_cell(record.total_out_bytes),
        record.in_count,
        record.out_count,
        pw = PROCESS_WIDTH,
        bw = BYTES_WIDTH,
        cw = COUNT_WIDTH,
    )
}

/// Render a snapshot, optionally limited to the first `top` rows
pub fn render_table(snapshot: &Snapshot, top: Option<usize>) -> String {
    let header = render_header();
    let mut out = String::new();

    out.push_str(&header);
    out.push('\n');
    out.push_str(&"-".repeat(header.len()));
    out.push('\n');

    for record in snapshot.top(top) {
        out.push_str(&render_row(record));
        out.push('\n');
    }

    out.push_str(&format!(
        "{} processes, {} swapped in, {} swapped out",
        snapshot.len(),
        format_bytes(snapshot.total_in_bytes()),
        format_bytes(snapshot.total_out_bytes()),
    ));

    out
}
