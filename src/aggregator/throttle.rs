//! Rate limiting for snapshot publication.

use std::time::{Duration, Instant};

/// Lets a publish through at most once per `interval`
///
/// The first check always passes. Events keep being applied between
/// publishes; only the hand-off to observers is limited.
#[derive(Debug, Clone)]
pub struct PublishThrottle {
    interval: Duration,
    last_publish: Option<Instant>,
}

impl PublishThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_publish: None,
        }
    }

    /// Check whether a publish may happen at `now`, recording it if so
    pub fn should_publish_at(&mut self, now: Instant) -> bool {
        match self.last_publish {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_publish = Some(now);
                true
            }
        }
    }

    /// Forget the last publish so the next check passes
    pub fn reset(&mut self) {
        self.last_publish = None;
    }
}
