use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use swapwatch::aggregator::{Snapshot, UsageRecord};
use swapwatch::commands::{execute_watch, validate_args, validate_report_file, WatchArgs};
use swapwatch::output::{read_report, to_report, write_report};
use swapwatch::utils::TracerConfig;

#[test]
fn test_validate_args_valid() {
    let args = WatchArgs {
        tracer: TracerConfig::new().with_program("/usr/bin/fs_usage"),
        publish_interval: Duration::from_millis(250),
        top: Some(20),
        duration: Some(Duration::from_secs(60)),
        output: Some(PathBuf::from("artifacts/swap.json")),
        ..Default::default()
    };

    assert!(validate_args(&args).is_ok());
}

#[test]
fn test_validate_args_blank_tracer() {
    let args = WatchArgs {
        tracer: TracerConfig::new().with_program("   "),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_args_top_zero() {
    let args = WatchArgs {
        top: Some(0),
        ..Default::default()
    };

    assert!(validate_args(&args).is_err());
}

#[test]
fn test_validate_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");

    let snapshot = Snapshot::from_records(vec![UsageRecord {
        total_out_bytes: 4096,
        out_count: 1,
        ..UsageRecord::new("kernel_task", 0)
    }]);
    write_report(&to_report(&snapshot, &TracerConfig::default()), &path).unwrap();

    assert!(validate_report_file(path).is_ok());
    assert!(validate_report_file(dir.path().join("missing.json")).is_err());
}

#[cfg(unix)]
fn sh(script: &str) -> TracerConfig {
    TracerConfig::new()
        .with_program("/bin/sh")
        .with_args(["-c", script])
}

#[cfg(unix)]
#[test]
fn test_watch_runs_twice_in_one_process() {
    let dir = tempfile::tempdir().unwrap();

    for run in 0..2 {
        let path = dir.path().join(format!("run{}.json", run));
        let args = WatchArgs {
            tracer: sh("printf 't PgOut B=0x1000 /private/var/vm/swapfile0 W mds.42\\n'"),
            publish_interval: Duration::from_millis(10),
            json: true,
            output: Some(path.clone()),
            ..Default::default()
        };

        execute_watch(args, Arc::new(AtomicBool::new(true))).unwrap();

        let report = read_report(&path).unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].process_key, "mds");
        assert_eq!(report.records[0].total_out_bytes, 0x1000);
    }
}

#[cfg(unix)]
#[test]
fn test_watch_stops_when_interrupted() {
    let args = WatchArgs {
        tracer: sh("sleep 30; true"),
        json: true,
        ..Default::default()
    };

    let started = Instant::now();
    execute_watch(args, Arc::new(AtomicBool::new(false))).unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
}
