use pretty_assertions::assert_eq;
use swapwatch::aggregator::{Snapshot, UsageRecord};
use swapwatch::output::{format_bytes, read_report, render_table, to_report, write_report};
use swapwatch::utils::config::REPORT_SCHEMA_VERSION;
use swapwatch::utils::TracerConfig;
use tempfile::tempdir;

fn sample_snapshot() -> Snapshot {
    Snapshot::from_records(vec![
        UsageRecord {
            total_in_bytes: 500_000,
            in_count: 40,
            ..UsageRecord::new("Xcode", 300)
        },
        UsageRecord {
            total_out_bytes: 12_000_000,
            out_count: 900,
            total_in_bytes: 4_096,
            in_count: 1,
            ..UsageRecord::new("Google Chrome Helper", 812)
        },
    ])
}

#[test]
fn test_report_round_trip_keeps_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.json");

    let report = to_report(&sample_snapshot(), &TracerConfig::default());
    write_report(&report, &path).unwrap();

    let loaded = read_report(&path).unwrap();
    assert_eq!(loaded.version, REPORT_SCHEMA_VERSION);
    assert_eq!(loaded.tracer, "/usr/bin/fs_usage -w -f filesys,diskio");
    assert_eq!(loaded.records[0].process_key, "Google Chrome Helper");
    assert_eq!(loaded.records, sample_snapshot().into_records());
}

#[test]
fn test_read_report_rejects_garbage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{not json").unwrap();

    assert!(read_report(&path).is_err());
    assert!(read_report(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_render_table_layout() {
    let table = render_table(&sample_snapshot(), None);
    let lines: Vec<&str> = table.lines().collect();

    assert!(lines[0].starts_with("Process"));
    assert!(lines[0].contains("Swap Out"));
    assert!(lines[2].starts_with("Google Chrome Helper"));
    assert!(lines[2].contains("12.0 MB"));
    assert!(lines[3].starts_with("Xcode"));
    assert!(lines[3].contains("500 KB"));
    assert_eq!(lines[4], "2 processes, 504 KB swapped in, 12.0 MB swapped out");
}

#[test]
fn test_format_bytes_units() {
    assert_eq!(format_bytes(512), "512 bytes");
    assert_eq!(format_bytes(64_000), "64 KB");
    assert_eq!(format_bytes(7_340_032), "7.3 MB");
}
