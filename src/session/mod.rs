//! Tracer subprocess supervision.
//!
//! A `MonitorSession` owns the tracer child process and the aggregator,
//! and reports to a `SessionObserver`.

pub mod observer;
pub mod supervisor;

pub use observer::{ChannelObserver, SessionEvent, SessionObserver, SessionState};
pub use supervisor::MonitorSession;
