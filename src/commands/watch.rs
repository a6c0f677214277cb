//! Watch command implementation.
//!
//! The watch command:
//! 1. Launches the tracer
//! 2. Renders every published snapshot
//! 3. Stops on Ctrl-C or when the duration runs out
//! 4. Prints the final counters and optionally writes a report

use super::models::WatchArgs;
use crate::aggregator::Snapshot;
use crate::output::{render_table, snapshot_to_json_line, to_report, write_report};
use crate::session::{ChannelObserver, MonitorSession, SessionEvent, SessionState};
use anyhow::{Context, Result};
use log::{debug, error, info};
use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often the loop wakes up to check the deadline and the shutdown flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Execute the watch command
///
/// **Public** - main entry point called from main.rs
///
/// `running` is cleared by the caller's Ctrl-C handler; the tracer is
/// stopped once it goes false. A Ctrl-C handler can only be installed once
/// per process, so it lives in main.rs rather than here.
///
/// # Errors
/// * Tracer launch failures
/// * Diagnostics the tracer printed before exiting
/// * Report write errors
pub fn execute_watch(args: WatchArgs, running: Arc<AtomicBool>) -> Result<()> {
    let start_time = Instant::now();

    let (observer, events) = ChannelObserver::new();
    let session = MonitorSession::with_config(
        args.tracer.clone(),
        args.publish_interval,
        Arc::new(observer),
    );

    session.start().context("Failed to start tracer")?;

    if !args.json {
        println!("Watching swap activity via: {}", session.tracer().command_line());
        println!("Press Ctrl+C to stop");
    }

    let deadline = args.duration.map(|d| start_time + d);
    let clear_screen = !args.json && std::io::stdout().is_terminal();
    let mut last_error: Option<String> = None;
    let mut stopping = false;

    loop {
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(SessionEvent::Snapshot(snapshot)) => {
                print_snapshot(&snapshot, &args, clear_screen)?;
            }
            Ok(SessionEvent::StateChanged(SessionState::Idle)) => break,
            Ok(SessionEvent::StateChanged(SessionState::Running)) => {
                debug!("Session running");
            }
            Ok(SessionEvent::Error(message)) => {
                error!("{}", message);
                last_error = Some(message);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if stopping {
            continue;
        }

        if !running.load(Ordering::SeqCst) {
            info!("Interrupted, stopping tracer");
        } else if deadline.is_some_and(|d| Instant::now() >= d) {
            info!("Duration elapsed, stopping tracer");
        } else {
            continue;
        }

        stopping = true;
        // NotRunning here just means the tracer beat us to it
        let _ = session.stop();
    }

    let snapshot = session.snapshot();

    if args.json {
        println!("{}", snapshot_to_json_line(&snapshot)?);
    } else {
        println!("\n{}", render_table(&snapshot, args.top));
    }

    if let Some(path) = &args.output {
        let report = to_report(&snapshot, session.tracer());
        write_report(&report, path).context("Failed to write report")?;
        info!("✓ Report written to: {}", path.display());
    }

    info!(
        "Watched for {:.1}s, {} processes seen",
        start_time.elapsed().as_secs_f64(),
        snapshot.len()
    );

    match last_error {
        Some(message) => anyhow::bail!(message),
        None => Ok(()),
    }
}

fn print_snapshot(snapshot: &Snapshot, args: &WatchArgs, clear_screen: bool) -> Result<()> {
    if args.json {
        println!("{}", snapshot_to_json_line(snapshot)?);
    } else {
        if clear_screen {
            print!("\x1b[2J\x1b[H");
        }
        println!("{}\n", render_table(snapshot, args.top));
    }
    Ok(())
}

/// Validate watch arguments
///
/// **Public** - can be called before execute_watch for early validation
pub fn validate_args(args: &WatchArgs) -> Result<()> {
    if args.tracer.program.trim().is_empty() {
        anyhow::bail!("Tracer path cannot be empty");
    }

    if args.publish_interval.is_zero() {
        anyhow::bail!("Refresh interval must be greater than 0");
    }

    if args.top == Some(0) {
        anyhow::bail!("top must be greater than 0");
    }

    if args.duration.is_some_and(|d| d.is_zero()) {
        anyhow::bail!("duration must be greater than 0");
    }

    if let Some(path) = &args.output {
        if path.as_os_str().is_empty() {
            anyhow::bail!("Report path cannot be empty");
        }
        if path.is_dir() {
            anyhow::bail!("Report path is a directory: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::TracerConfig;
    use std::path::PathBuf;

    #[test]
    fn test_validate_args_default() {
        assert!(validate_args(&WatchArgs::default()).is_ok());
    }

    #[test]
    fn test_validate_args_empty_tracer() {
        let args = WatchArgs {
            tracer: TracerConfig::new().with_program(""),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_zero_interval() {
        let args = WatchArgs {
            publish_interval: Duration::ZERO,
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
    fn test_validate_args_zero_duration() {
        let args = WatchArgs {
            duration: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_output_is_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let args = WatchArgs {
            output: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());

        let args = WatchArgs {
            output: Some(PathBuf::from("report.json")),
            ..Default::default()
        };
        assert!(validate_args(&args).is_ok());
    }
}
