//! swapwatch CLI
//!
//! Watches swap-file paging per process by streaming fs_usage output.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use swapwatch::commands::{
    display_version, execute_watch, validate_args, validate_report_file, WatchArgs,
};
use swapwatch::utils::config::{TracerConfig, DEFAULT_TRACER_ARGS, DEFAULT_TRACER_PATH};

/// swapwatch - per-process swap paging monitor
#[derive(Parser, Debug)]
#[command(name = "swapwatch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream the tracer and show swap usage per process
    Watch {
        /// Tracer executable
        #[arg(long, env = "SWAPWATCH_TRACER", default_value = DEFAULT_TRACER_PATH)]
        tracer: String,

        /// Argument passed to the tracer (repeatable, replaces the defaults)
        #[arg(long = "tracer-arg", allow_hyphen_values = true)]
        tracer_args: Vec<String>,

        /// Minimum refresh interval in milliseconds
        #[arg(short, long, default_value = "500")]
        interval_ms: u64,

        /// Only show the top N processes
        #[arg(short, long)]
        top: Option<usize>,

        /// Print snapshots as JSON lines
        #[arg(long)]
        json: bool,

        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Write the final counters to a JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Watch {
            tracer,
            tracer_args,
            interval_ms,
            top,
            json,
            duration,
            output,
        } => {
            let tracer_args = if tracer_args.is_empty() {
                DEFAULT_TRACER_ARGS.iter().map(|a| a.to_string()).collect()
            } else {
                tracer_args
            };

            let args = WatchArgs {
                tracer: TracerConfig::new()
                    .with_program(tracer)
                    .with_args(tracer_args),
                publish_interval: Duration::from_millis(interval_ms),
                top,
                json,
                duration: duration.map(Duration::from_secs),
                output,
            };

            validate_args(&args)?;

            // Setup signal handling for clean shutdown
            let running = Arc::new(AtomicBool::new(true));
            let r = Arc::clone(&running);
            ctrlc::set_handler(move || {
                r.store(false, Ordering::SeqCst);
                eprintln!("\nReceived Ctrl-C, stopping...");
            })?;

            execute_watch(args, running)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
