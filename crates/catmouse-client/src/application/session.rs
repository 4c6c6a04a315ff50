//! Use case: run one game session from bus open to bus release.
//!
//! # Lifecycle (for beginners)
//!
//! ```text
//!  open bus ──fail──► print troubleshooting, return SessionError::Open
//!     │
//!     ▼
//!  spawn receiver thread ("catmouse-rx")
//!     │
//!  settle (500 ms), show prompt
//!     │
//!  input loop on this thread  ◄── stops on q, Ctrl-C, game over, EOF
//!     │
//!  stop latch (idempotent) ─► closing line
//!     │
//!  join receiver, bounded (1 s)  ── timeout ─► warn, carry on
//!     │
//!  release bus exactly once ─► report
//! ```
//!
//! The receiver starts before any key is read, so a game-over broadcast that
//! arrives during the settle interval is still seen.  The bus is wrapped in
//! a [`SharedBus`]: the explicit release at the end, a `Drop` on an early
//! return, and a detached receiver still holding an `Arc` can never shut
//! the adapter down twice.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use catmouse_core::{protocol::arbitration_id, Role};
use thiserror::Error;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::application::bus::{BusConfig, BusError, CanBus, SharedBus};
use crate::application::console::Console;
use crate::application::receive_frames::{spawn_receiver, ReceiverConfig, ReceiverStats};
use crate::application::send_commands::{run_input_loop, InputConfig, KeySource};
use crate::application::stop_signal::{StopReason, StopSignal};

const JOIN_POLL: Duration = Duration::from_millis(5);

/// Every timeout and interval the session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Bound on one receive call.
    pub receive_timeout: Duration,
    /// Bound on one key poll.
    pub key_poll_timeout: Duration,
    /// Sleep after each input iteration.
    pub input_tick: Duration,
    /// Delay between starting the receiver and accepting input.
    pub settle: Duration,
    /// How long shutdown waits for the receiver thread.
    pub join_timeout: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_millis(100),
            key_poll_timeout: Duration::from_millis(100),
            input_tick: Duration::from_millis(10),
            settle: Duration::from_millis(500),
            join_timeout: Duration::from_secs(1),
        }
    }
}

impl SessionTiming {
    /// Receiver settings derived from these timings.
    ///
    /// Receive errors back off for one receive timeout.
    pub fn receiver(&self) -> ReceiverConfig {
        ReceiverConfig {
            receive_timeout: self.receive_timeout,
            error_backoff: self.receive_timeout,
        }
    }

    /// Input-loop settings derived from these timings.
    pub fn input(&self) -> InputConfig {
        InputConfig {
            key_poll_timeout: self.key_poll_timeout,
            tick: self.input_tick,
        }
    }
}

/// Errors that prevent a session from running at all.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The CAN adapter could not be opened.  Nothing was started.
    #[error(transparent)]
    Open(BusError),

    /// The receiver thread could not be created.  The bus was released.
    #[error("failed to start receiver thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Final status of a session that ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionReport {
    /// The operator's role.
    pub role: Role,
    /// First reason the latch recorded.
    pub stop_reason: Option<StopReason>,
    /// Frames the input loop sent.
    pub frames_sent: u64,
    /// Failed sends.
    pub send_errors: u64,
    /// Frames the receiver read (zero if it failed to join).
    pub frames_received: u64,
    /// Receive errors reported while running.
    pub receive_errors: u64,
    /// Whether the receiver thread finished within the join timeout.
    pub receiver_joined: bool,
}

/// Owns the stop latch and the bus lifetime for one session.
pub struct SessionController {
    id: Uuid,
    role: Role,
    bus_config: BusConfig,
    timing: SessionTiming,
    stop: StopSignal,
    console: Console,
}

impl SessionController {
    /// Creates a controller with a fresh stop latch and session id.
    pub fn new(role: Role, bus_config: BusConfig, timing: SessionTiming, console: Console) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            bus_config,
            timing,
            stop: StopSignal::new(),
            console,
        }
    }

    /// Session id used in log spans.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// A handle to the session's stop latch, e.g. for a Ctrl-C handler.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Runs the session to completion on the calling thread.
    ///
    /// `open` is called once with the configured adapter settings.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Open`] if `open` fails.  Troubleshooting guidance
    ///   has been printed and neither loop was started.
    /// - [`SessionError::Spawn`] if the receiver thread could not start.
    pub fn run<B, F, K>(&self, open: F, keys: &mut K) -> Result<SessionReport, SessionError>
    where
        B: CanBus + 'static,
        F: FnOnce(&BusConfig) -> Result<B, BusError>,
        K: KeySource + ?Sized,
    {
        let span = info_span!("session", id = %self.id, role = %self.role);
        let _entered = span.enter();

        let bus = match open(&self.bus_config) {
            Ok(bus) => Arc::new(SharedBus::new(bus)),
            Err(e) => {
                error!("{e}");
                self.console.line(&format!("\nError: {e}"));
                self.console.line(&troubleshooting(&self.bus_config));
                return Err(SessionError::Open(e));
            }
        };
        info!(interface = %self.bus_config.interface, id = %arbitration_id(self.role), "bus open");
        self.console.line("✓ CAN bus initialized");
        self.console.banner(self.role, &self.bus_config);

        let receiver = spawn_receiver(
            Arc::clone(&bus),
            self.role,
            self.stop.clone(),
            self.console.clone(),
            self.timing.receiver(),
        )
        .map_err(|e| {
            error!("receiver thread failed to start: {e}");
            bus.release();
            SessionError::Spawn(e)
        })?;

        thread::sleep(self.timing.settle);
        if self.stop.is_running() {
            self.console.prompt(self.role);
        }

        let input = run_input_loop(
            &*bus,
            keys,
            self.role,
            &self.stop,
            &self.console,
            &self.timing.input(),
        );

        self.stop.stop(StopReason::Quit);
        let stop_reason = self.stop.reason();
        if let Some(line) = stop_reason.and_then(closing_line) {
            self.console.line(line);
        }

        let received = join_bounded(receiver, self.timing.join_timeout);
        if received.is_none() {
            warn!(
                timeout_ms = self.timing.join_timeout.as_millis() as u64,
                "receiver did not stop in time; releasing bus anyway"
            );
        }

        bus.release();
        self.console.line("CAN interface closed");

        let receiver_joined = received.is_some();
        let received = received.unwrap_or_default();
        let report = SessionReport {
            role: self.role,
            stop_reason,
            frames_sent: input.frames_sent,
            send_errors: input.send_errors,
            frames_received: received.frames_received,
            receive_errors: received.receive_errors,
            receiver_joined,
        };
        info!(
            reason = ?report.stop_reason,
            sent = report.frames_sent,
            send_errors = report.send_errors,
            received = report.frames_received,
            receive_errors = report.receive_errors,
            receiver_joined = report.receiver_joined,
            "session finished"
        );
        self.console.line(&summary(&report));
        self.console
            .line(&format!("Game Over! Thanks for playing as {}!", self.role));
        Ok(report)
    }
}

/// Waits up to `timeout` for the receiver to finish.
///
/// Returns `None` if it is still running (the thread is left detached) or
/// if it panicked.
fn join_bounded(handle: JoinHandle<ReceiverStats>, timeout: Duration) -> Option<ReceiverStats> {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(JOIN_POLL);
    }
    match handle.join() {
        Ok(stats) => Some(stats),
        Err(_) => {
            error!("receiver thread panicked");
            None
        }
    }
}

fn closing_line(reason: StopReason) -> Option<&'static str> {
    match reason {
        StopReason::Quit => Some("\nQuitting..."),
        StopReason::Interrupted => Some("\nInterrupted by user"),
        StopReason::InputClosed => Some("\nInput closed, quitting..."),
        StopReason::BusFailure => Some("\nCAN bus failure, stopping..."),
        // The receiver already printed the banner.
        StopReason::GameOver => None,
    }
}

fn summary(report: &SessionReport) -> String {
    let reason = report
        .stop_reason
        .map_or_else(|| "unknown".to_string(), |r| r.to_string());
    format!(
        "Session: {} sent ({} failed), {} received ({} errors), ended by {reason}",
        report.frames_sent, report.send_errors, report.frames_received, report.receive_errors
    )
}

/// Guidance printed when the adapter cannot be opened.
pub fn troubleshooting(bus: &BusConfig) -> String {
    format!(
        "\nTroubleshooting:\n\
         1. Check that the CAN adapter is plugged in\n\
         2. Bring the interface up: sudo ip link set {iface} up type can bitrate {bitrate}\n\
         3. Close other applications using {iface}\n\
         4. Unplug and replug the adapter",
        iface = bus.interface,
        bitrate = bus.bitrate,
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_timing_defaults() {
        let timing = SessionTiming::default();

        assert_eq!(timing.receive_timeout, Duration::from_millis(100));
        assert_eq!(timing.input_tick, Duration::from_millis(10));
        assert_eq!(timing.settle, Duration::from_millis(500));
        assert_eq!(timing.join_timeout, Duration::from_secs(1));
        assert_eq!(timing.receiver().error_backoff, timing.receive_timeout);
        assert_eq!(timing.input().tick, timing.input_tick);
    }

    #[test]
    fn test_join_bounded_returns_stats_of_finished_thread() {
        let handle = thread::spawn(|| ReceiverStats {
            frames_received: 4,
            ..ReceiverStats::default()
        });

        let stats = join_bounded(handle, Duration::from_secs(1));

        assert_eq!(stats.map(|s| s.frames_received), Some(4));
    }

    #[test]
    fn test_join_bounded_gives_up_after_timeout() {
        // Arrange – a thread that outlives the join timeout
        let handle = thread::spawn(|| {
            thread::sleep(Duration::from_millis(300));
            ReceiverStats::default()
        });
        let started = Instant::now();

        // Act
        let stats = join_bounded(handle, Duration::from_millis(20));

        // Assert
        assert!(stats.is_none());
        assert!(started.elapsed() < Duration::from_millis(250));
    }

    #[test]
    fn test_closing_lines() {
        assert_eq!(closing_line(StopReason::Interrupted), Some("\nInterrupted by user"));
        assert_eq!(closing_line(StopReason::Quit), Some("\nQuitting..."));
        assert_eq!(closing_line(StopReason::GameOver), None);
    }

    #[test]
    fn test_troubleshooting_names_interface_and_bitrate() {
        let text = troubleshooting(&BusConfig::default());

        assert!(text.contains("sudo ip link set can0 up type can bitrate 500000"));
        assert!(text.contains("plugged in"));
    }

    #[test]
    fn test_new_controllers_get_distinct_ids() {
        let (console, _out) = Console::capture();
        let a = SessionController::new(
            Role::Cat,
            BusConfig::default(),
            SessionTiming::default(),
            console.clone(),
        );
        let b = SessionController::new(
            Role::Cat,
            BusConfig::default(),
            SessionTiming::default(),
            console,
        );

        assert_ne!(a.id(), b.id());
        assert!(a.stop_signal().is_running());
    }
}
