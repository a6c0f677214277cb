//! swapwatch
//!
//! Per-process swap-file paging monitor. Streams the output of the
//! `fs_usage` trace utility, keeps cumulative swap-in/swap-out counters
//! per process and publishes sorted snapshots at a bounded rate.
//!
//! ## Getting Started
//!
//! ```bash
//! sudo swapwatch watch --top 20
//! ```
//!
//! As a library, construct a [`session::MonitorSession`] with a
//! [`session::SessionObserver`] and call `start`/`stop`.

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod session;
pub mod utils;
