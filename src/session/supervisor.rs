//! Lifecycle of the tracer subprocess and its output pipeline.
//!
//! `start` launches the tracer in its own process group with piped
//! stdout/stderr and starts three workers:
//! - the stdout pump owns the line reassembler, parses each line and feeds
//!   the aggregator, all in arrival order
//! - the stderr drain keeps the error pipe from filling up
//! - the reaper polls the tracer for exit, flushes counters that are still
//!   waiting to be published, and winds the session down
//!
//! The session goes back to `Idle` when the tracer itself exits, whether it
//! was asked to by `stop` or not. Anything left in its process group is
//! terminated so the pipes close; a reader that still doesn't finish is
//! abandoned after `DRAIN_TIMEOUT`.

use super::observer::{SessionObserver, SessionState};
use crate::aggregator::{Aggregator, Snapshot};
use crate::parser::{parse_line, LineReassembler, PagingEvent};
use crate::utils::config::{
    TracerConfig, DEFAULT_PUBLISH_INTERVAL, DRAIN_TIMEOUT, READ_CHUNK_SIZE, REAP_POLL_INTERVAL,
    STOP_GRACE_PERIOD,
};
use crate::utils::error::SessionError;
use log::{debug, info, warn};
use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStderr, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

/// A restartable monitoring session
///
/// All control methods take `&self`, so a session can be shared with a
/// signal handler behind an `Arc`.
pub struct MonitorSession {
    tracer: TracerConfig,
    shared: Arc<Shared>,
}

/// State touched by both the caller and the worker threads
///
/// Lock order: `transition` → `publish` → `aggregator`.
struct Shared {
    state: Mutex<SessionState>,
    idle: Condvar,
    /// Held across a state change and its observer callback
    transition: Mutex<()>,
    /// Serializes snapshot hand-off so observers see them in order
    publish: Mutex<()>,
    aggregator: Mutex<Aggregator>,
    tracee: Mutex<Option<Tracee>>,
    /// Bumped on every start; workers of an older run stop touching counters
    generation: AtomicU64,
    observer: Arc<dyn SessionObserver>,
}

/// The running tracer and how far along its shutdown is
struct Tracee {
    child: Child,
    stop_requested_at: Option<Instant>,
    killed: bool,
}

/// What the reaper learned about the tracer's exit
struct Exit {
    pid: u32,
    status: Option<ExitStatus>,
    stop_requested: bool,
}

impl MonitorSession {
    /// Session running the default fs_usage command
    pub fn new(observer: Arc<dyn SessionObserver>) -> Self {
        Self::with_config(TracerConfig::default(), DEFAULT_PUBLISH_INTERVAL, observer)
    }

    pub fn with_config(
        tracer: TracerConfig,
        publish_interval: Duration,
        observer: Arc<dyn SessionObserver>,
    ) -> Self {
        Self {
            tracer,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::Idle),
                idle: Condvar::new(),
                transition: Mutex::new(()),
                publish: Mutex::new(()),
                aggregator: Mutex::new(Aggregator::new(publish_interval)),
                tracee: Mutex::new(None),
                generation: AtomicU64::new(0),
                observer,
            }),
        }
    }

    pub fn tracer(&self) -> &TracerConfig {
        &self.tracer
    }

    pub fn current_state(&self) -> SessionState {
        *lock(&self.shared.state)
    }

    /// Launch the tracer and begin streaming its output
    ///
    /// Counters from a previous run are discarded. If the previous run is
    /// still delivering its `Idle` callback, this waits for it.
    ///
    /// # Errors
    /// * `SessionError::AlreadyRunning` - a tracer is still attached
    /// * `SessionError::LaunchFailed` - the tracer could not be spawned
    /// * `SessionError::MissingPipe` / `SessionError::Worker` - plumbing failed;
    ///   the tracer is killed and the session stays `Idle`
    ///
    /// Launch failures are also reported through `on_error`.
    pub fn start(&self) -> Result<(), SessionError> {
        let _transition = lock(&self.shared.transition);
        if self.current_state() == SessionState::Running {
            return Err(SessionError::AlreadyRunning);
        }

        info!("Launching tracer: {}", self.tracer.command_line());

        let mut command = Command::new(&self.tracer.program);
        command
            .args(&self.tracer.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        configure_process_group(&mut command);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(source) => {
                let err = SessionError::LaunchFailed {
                    program: self.tracer.program.clone(),
                    source,
                };
                self.shared.observer.on_error(&err.to_string());
                return Err(err);
            }
        };

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            (stdout, _) => {
                discard_child(child);
                let err = SessionError::MissingPipe(if stdout.is_none() { "stdout" } else { "stderr" });
                self.shared.observer.on_error(&err.to_string());
                return Err(err);
            }
        };

        debug!("Tracer started with pid {}", child.id());

        let generation = {
            let _publish = lock(&self.shared.publish);
            lock(&self.shared.aggregator).reset();
            self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        *lock(&self.shared.tracee) = Some(Tracee::new(child));
        *lock(&self.shared.state) = SessionState::Running;
        self.shared.observer.on_state_change(SessionState::Running);

        if let Err(err) = self.spawn_workers(stdout, stderr, generation) {
            if let Some(tracee) = lock(&self.shared.tracee).take() {
                discard_child(tracee.child);
            }
            self.shared.observer.on_error(&err.to_string());
            self.shared.set_idle();
            return Err(err);
        }

        Ok(())
    }

    fn spawn_workers(
        &self,
        stdout: ChildStdout,
        stderr: ChildStderr,
        generation: u64,
    ) -> Result<(), SessionError> {
        let (diagnostics_tx, diagnostics_rx) = mpsc::channel();
        thread::Builder::new()
            .name("swapwatch-stderr".to_string())
            .spawn(move || {
                let _ = diagnostics_tx.send(drain_stderr(stderr));
            })
            .map_err(SessionError::Worker)?;

        let (drained_tx, drained_rx) = mpsc::channel();
        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("swapwatch-stdout".to_string())
            .spawn(move || {
                shared.pump(stdout, generation);
                let _ = drained_tx.send(());
            })
            .map_err(SessionError::Worker)?;

        let shared = Arc::clone(&self.shared);
        thread::Builder::new()
            .name("swapwatch-reaper".to_string())
            .spawn(move || shared.supervise(generation, drained_rx, diagnostics_rx))
            .map_err(SessionError::Worker)?;

        Ok(())
    }

    /// Ask the tracer to terminate
    ///
    /// Sends SIGTERM to the tracer's process group and returns without
    /// waiting. If the tracer is still alive after `STOP_GRACE_PERIOD` the
    /// group gets SIGKILL. The session becomes `Idle` once the exit is
    /// observed; use `wait_idle` to block on that.
    ///
    /// # Errors
    /// * `SessionError::NotRunning` - nothing to stop
    pub fn stop(&self) -> Result<(), SessionError> {
        if self.current_state() == SessionState::Idle {
            return Err(SessionError::NotRunning);
        }

        // Already reaped: the Idle transition is imminent
        if let Some(tracee) = lock(&self.shared.tracee).as_mut() {
            info!("Stopping tracer (pid {})", tracee.child.id());
            tracee.terminate();
        }

        Ok(())
    }

    /// Block until the session is `Idle` or `timeout` passes
    ///
    /// Returns true when the session is idle.
    pub fn wait_idle(&self, timeout: Option<Duration>) -> bool {
        let state = lock(&self.shared.state);
        let still_running = |s: &mut SessionState| *s == SessionState::Running;

        match timeout {
            None => {
                let state = self
                    .shared
                    .idle
                    .wait_while(state, still_running)
                    .unwrap_or_else(PoisonError::into_inner);
                *state == SessionState::Idle
            }
            Some(timeout) => {
                let (state, _) = self
                    .shared
                    .idle
                    .wait_timeout_while(state, timeout, still_running)
                    .unwrap_or_else(PoisonError::into_inner);
                *state == SessionState::Idle
            }
        }
    }

    /// Sorted copy of the current counters
    ///
    /// Remains readable after the session stops, until the next `start`.
    pub fn snapshot(&self) -> Snapshot {
        lock(&self.shared.aggregator).snapshot()
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        // Don't leave the tracer running behind us; the reaper escalates
        if let Some(tracee) = lock(&self.shared.tracee).as_mut() {
            tracee.terminate();
        }
    }
}

impl Tracee {
    fn new(child: Child) -> Self {
        Self {
            child,
            stop_requested_at: None,
            killed: false,
        }
    }

    fn terminate(&mut self) {
        self.stop_requested_at.get_or_insert_with(Instant::now);
        signal_group(&mut self.child, Signal::Terminate);
    }

    fn escalate_if_overdue(&mut self) {
        let Some(requested) = self.stop_requested_at else {
            return;
        };

        if !self.killed && requested.elapsed() >= STOP_GRACE_PERIOD {
            warn!(
                "Tracer (pid {}) ignored SIGTERM for {:?}, killing it",
                self.child.id(),
                STOP_GRACE_PERIOD
            );
            signal_group(&mut self.child, Signal::Kill);
            self.killed = true;
        }
    }
}

impl Shared {
    /// Stdout worker: stream until EOF
    fn pump(&self, mut stdout: ChildStdout, generation: u64) {
        let mut lines = LineReassembler::new();
        let mut buf = vec![0u8; READ_CHUNK_SIZE];

        loop {
            match stdout.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.ingest(&mut lines, &buf[..n], generation),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Reading tracer output failed: {}", e);
                    if let Some(tracee) = lock(&self.tracee).as_mut() {
                        tracee.terminate();
                    }
                    break;
                }
            }
        }

        lines.finish();
    }

    /// Reassemble, parse and apply one chunk, then publish if due
    fn ingest(&self, lines: &mut LineReassembler, chunk: &[u8], generation: u64) {
        let events: Vec<PagingEvent> = lines
            .feed(chunk)
            .iter()
            .filter_map(|line| parse_line(line))
            .collect();

        if events.is_empty() {
            return;
        }

        {
            let mut aggregator = lock(&self.aggregator);
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            for event in &events {
                aggregator.apply(event);
            }
        }

        self.publish_pending(generation);
    }

    /// Hand the observer a snapshot if one is due
    fn publish_pending(&self, generation: u64) {
        let _publish = lock(&self.publish);

        let snapshot = {
            let mut aggregator = lock(&self.aggregator);
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            aggregator.poll_pending()
        };

        if let Some(snapshot) = snapshot {
            self.observer.on_snapshot(&snapshot);
        }
    }

    /// Reaper worker: wait for the tracer to exit, then wind the session down
    fn supervise(&self, generation: u64, drained: Receiver<()>, diagnostics: Receiver<String>) {
        let exit = self.reap(generation);

        if let Some(exit) = &exit {
            // Helpers it left behind would hold our pipes open
            signal_pid_group(exit.pid, Signal::Terminate);

            if !wait_for(&drained) {
                warn!("Tracer output still open after exit, killing process group {}", exit.pid);
                signal_pid_group(exit.pid, Signal::Kill);
                if !wait_for(&drained) {
                    warn!("Abandoning tracer output reader");
                }
            }
        }

        self.publish_pending(generation);

        let diagnostics = diagnostics.recv_timeout(DRAIN_TIMEOUT).unwrap_or_default();
        let diagnostics = diagnostics.trim();

        if !diagnostics.is_empty() {
            self.observer
                .on_error(&SessionError::Tracer(diagnostics.to_string()).to_string());
        } else if let Some(Exit {
            status: Some(status),
            stop_requested: false,
            ..
        }) = exit
        {
            if !status.success() {
                self.observer.on_error(&SessionError::Exited(status).to_string());
            }
        }

        self.enter_idle();
    }

    /// Poll the tracer until it exits, flushing pending counters meanwhile
    ///
    /// Polling with the slot locked means `stop` never signals a pid that
    /// has already been reaped.
    fn reap(&self, generation: u64) -> Option<Exit> {
        let started = Instant::now();

        loop {
            {
                let mut slot = lock(&self.tracee);
                let tracee = slot.as_mut()?;

                let status = match tracee.child.try_wait() {
                    Ok(Some(status)) => Some(status),
                    Ok(None) => {
                        tracee.escalate_if_overdue();
                        None
                    }
                    Err(e) => {
                        warn!("Failed to poll tracer: {}", e);
                        let _ = tracee.child.kill();
                        tracee.child.wait().ok()
                    }
                };

                if let Some(status) = status {
                    info!(
                        "Tracer exited with {} after {:.2}s",
                        status,
                        started.elapsed().as_secs_f64()
                    );
                    let exit = Exit {
                        pid: tracee.child.id(),
                        status: Some(status),
                        stop_requested: tracee.stop_requested_at.is_some(),
                    };
                    *slot = None;
                    return Some(exit);
                }
            }

            self.publish_pending(generation);
            thread::sleep(REAP_POLL_INTERVAL);
        }
    }

    fn enter_idle(&self) {
        let _transition = lock(&self.transition);
        self.set_idle();
    }

    /// Caller holds `transition`, so no `start` can slip in before the
    /// `Idle` callback has run
    fn set_idle(&self) {
        *lock(&self.state) = SessionState::Idle;
        self.idle.notify_all();
        self.observer.on_state_change(SessionState::Idle);
    }
}

fn wait_for(drained: &Receiver<()>) -> bool {
    !matches!(
        drained.recv_timeout(DRAIN_TIMEOUT),
        Err(RecvTimeoutError::Timeout)
    )
}

/// Read the tracer's stderr to the end, keeping the pipe from filling up
fn drain_stderr(mut stderr: ChildStderr) -> String {
    let mut raw = Vec::new();
    if let Err(e) = stderr.read_to_end(&mut raw) {
        warn!("Reading tracer stderr failed: {}", e);
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn discard_child(mut child: Child) {
    signal_group(&mut child, Signal::Kill);
    let _ = child.wait();
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn configure_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn configure_process_group(_command: &mut Command) {}

/// Signal the tracer and everything in its process group
#[cfg(unix)]
fn signal_group(child: &mut Child, signal: Signal) {
    signal_pid_group(child.id(), signal);
}

#[cfg(not(unix))]
fn signal_group(child: &mut Child, _signal: Signal) {
    let _ = child.kill();
}

/// Signal a process group by its leader's pid
///
/// The group id stays reserved while any member is alive, so this is safe
/// after the leader has been reaped.
#[cfg(unix)]
fn signal_pid_group(pid: u32, signal: Signal) {
    let signo = match signal {
        Signal::Terminate => libc::SIGTERM,
        Signal::Kill => libc::SIGKILL,
    };

    let rc = unsafe { libc::kill(-(pid as libc::pid_t), signo) };
    if rc != 0 {
        debug!(
            "{:?} to process group {} failed: {}",
            signal,
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn signal_pid_group(_pid: u32, _signal: Signal) {}

/// Lock a mutex, ignoring poisoning
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
