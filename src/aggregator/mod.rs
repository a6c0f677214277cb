//! Aggregation of paging events into per-process usage.
//!
//! This module turns parsed paging events into:
//! - Cumulative counters keyed by process
//! - Sorted snapshots for observers
//! - A throttled publish cadence

pub mod throttle;
pub mod usage;

// Re-export main types and functions
pub use throttle::PublishThrottle;
pub use usage::{compare_usage, Aggregator, Snapshot, UsageRecord};
