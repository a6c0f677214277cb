//! Cumulative per-process paging counters.
//!
//! The `Aggregator` is the single owner of the process → record mapping.
//! Everything else sees copies, via `Snapshot`.

use super::throttle::PublishThrottle;
use crate::parser::{Direction, PagingEvent};
use crate::utils::config::DEFAULT_PUBLISH_INTERVAL;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Running totals for one process key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub process_key: String,

    /// Last pid seen under this key
    pub process_id: u32,

    pub total_in_bytes: u64,
    pub total_out_bytes: u64,
    pub in_count: u64,
    pub out_count: u64,
}

impl UsageRecord {
    pub fn new(process_key: impl Into<String>, process_id: u32) -> Self {
        Self {
            process_key: process_key.into(),
            process_id,
            total_in_bytes: 0,
            total_out_bytes: 0,
            in_count: 0,
            out_count: 0,
        }
    }

    fn record(&mut self, event: &PagingEvent) {
        self.process_id = event.process_id;
        match event.direction {
            Direction::In => {
                self.total_in_bytes = self.total_in_bytes.saturating_add(event.byte_count);
                self.in_count = self.in_count.saturating_add(1);
            }
            Direction::Out => {
                self.total_out_bytes = self.total_out_bytes.saturating_add(event.byte_count);
                self.out_count = self.out_count.saturating_add(1);
            }
        }
    }
}

/// Display order for records
///
/// As soon as either side has swapped out, order by bytes swapped out;
/// otherwise order by bytes swapped in. Both descending. Equal records fall
/// back to the process key so repeated snapshots come out identical.
pub fn compare_usage(a: &UsageRecord, b: &UsageRecord) -> Ordering {
    let primary = if a.total_out_bytes > 0 || b.total_out_bytes > 0 {
        b.total_out_bytes.cmp(&a.total_out_bytes)
    } else {
        b.total_in_bytes.cmp(&a.total_in_bytes)
    };

    primary.then_with(|| a.process_key.cmp(&b.process_key))
}

/// Sorted point-in-time copy of every record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    records: Vec<UsageRecord>,
}

impl Snapshot {
    /// Build a snapshot from unsorted records
    pub fn from_records(mut records: Vec<UsageRecord>) -> Self {
        records.sort_by(compare_usage);
        Self { records }
    }

    pub fn records(&self) -> &[UsageRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UsageRecord> {
        self.records.iter()
    }

    /// First `n` records, or all of them when `n` is `None`
    pub fn top(&self, n: Option<usize>) -> &[UsageRecord] {
        match n {
            Some(n) => &self.records[..n.min(self.records.len())],
            None => &self.records,
        }
    }

    pub fn find(&self, process_key: &str) -> Option<&UsageRecord> {
        self.records.iter().find(|r| r.process_key == process_key)
    }

    pub fn total_in_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.total_in_bytes).sum()
    }

    pub fn total_out_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.total_out_bytes).sum()
    }

    pub fn into_records(self) -> Vec<UsageRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a UsageRecord;
    type IntoIter = std::slice::Iter<'a, UsageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Owner of the per-process counters and the publish cadence
#[derive(Debug)]
pub struct Aggregator {
    records: HashMap<String, UsageRecord>,
    throttle: PublishThrottle,
    /// Events applied since the last publish
    pending: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLISH_INTERVAL)
    }
}

impl Aggregator {
    pub fn new(publish_interval: Duration) -> Self {
        Self {
            records: HashMap::new(),
            throttle: PublishThrottle::new(publish_interval),
            pending: false,
        }
    }

    /// Fold one event into its process record
    ///
    /// This is the only way counters change, and they only grow.
    pub fn apply(&mut self, event: &PagingEvent) {
        let record = self
            .records
            .entry(event.process_key.clone())
            .or_insert_with(|| {
                debug!("New process key: {} (pid {})", event.process_key, event.process_id);
                UsageRecord::new(event.process_key.clone(), event.process_id)
            });
        record.record(event);
        self.pending = true;
    }

    /// Copy and sort the current records
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_records(self.records.values().cloned().collect())
    }

    /// A snapshot if the publish interval allows one at `now`
    pub fn poll_publish_at(&mut self, now: Instant) -> Option<Snapshot> {
        if self.throttle.should_publish_at(now) {
            self.pending = false;
            Some(self.snapshot())
        } else {
            None
        }
    }

    /// A snapshot if anything changed since the last publish and the
    /// interval allows one now
    ///
    /// Polled after every batch of events and on a timer, so the last
    /// burst before a quiet period still reaches observers.
    pub fn poll_pending(&mut self) -> Option<Snapshot> {
        self.poll_pending_at(Instant::now())
    }

    pub fn poll_pending_at(&mut self, now: Instant) -> Option<Snapshot> {
        if self.pending {
            self.poll_publish_at(now)
        } else {
            None
        }
    }

    /// Drop every record and reopen the publish window
    pub fn reset(&mut self) {
        self.records.clear();
        self.throttle.reset();
        self.pending = false;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
