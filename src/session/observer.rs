//! Notification boundary between a running session and whoever displays it.

use crate::aggregator::Snapshot;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};

/// Whether the tracer pipeline is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
}

/// Receives everything a session reports
///
/// Callbacks run on the session's worker threads and must not block for long.
/// They may call `stop` or `snapshot`, but not `start`: state change
/// callbacks run while the session holds its transition lock.
pub trait SessionObserver: Send + Sync {
    /// A fresh snapshot, at most once per publish interval
    fn on_snapshot(&self, snapshot: &Snapshot);

    /// `Idle` is delivered after `wait_idle` callers are released, but before
    /// a new `start` can take effect
    fn on_state_change(&self, state: SessionState);

    /// Launch failures and tracer diagnostics
    fn on_error(&self, message: &str);
}

/// Owned form of an observer callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Snapshot(Snapshot),
    StateChanged(SessionState),
    Error(String),
}

/// Observer that forwards every callback into a channel
///
/// Lets a single thread consume session output in order.
#[derive(Debug)]
pub struct ChannelObserver {
    tx: Sender<SessionEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session event dropped, receiver is gone");
        }
    }
}

impl SessionObserver for ChannelObserver {
    fn on_snapshot(&self, snapshot: &Snapshot) {
        self.send(SessionEvent::Snapshot(snapshot.clone()));
    }

    fn on_state_change(&self, state: SessionState) {
        self.send(SessionEvent::StateChanged(state));
    }

    fn on_error(&self, message: &str) {
        self.send(SessionEvent::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_observer_forwards_in_order() {
        let (observer, rx) = ChannelObserver::new();
        observer.on_state_change(SessionState::Running);
        observer.on_snapshot(&Snapshot::default());
        observer.on_error("boom");

        let events: Vec<SessionEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                SessionEvent::StateChanged(SessionState::Running),
                SessionEvent::Snapshot(Snapshot::default()),
                SessionEvent::Error("boom".to_string()),
            ]
        );
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.on_error("nobody listening");
    }
}
