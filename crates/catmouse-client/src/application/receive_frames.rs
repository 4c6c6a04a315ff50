//! Use case: listen to the bus until the game ends.
//!
//! The receiver runs on its own OS thread so a slow or silent bus can never
//! delay the operator's key presses.  Every iteration does a short, bounded
//! `receive`; between iterations it checks the shared [`StopSignal`], which
//! caps how long a stop takes to be noticed at one receive timeout.
//!
//! ```text
//!  Running ──(flag stopped)──────────────────────────► Stopped
//!     │
//!     ├─(GameOver frame)──► stop(GameOver) ─► Stopping ─► Stopped
//!     ├─(other frame)─────► print RX line, stay Running
//!     ├─(timeout)─────────► stay Running
//!     └─(error)───────────► report, back off, stay Running
//! ```

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use catmouse_core::{decode, decode_command, DecodedEvent, Role};
use tracing::{debug, info, warn, Span};

use crate::application::bus::{BusError, CanBus};
use crate::application::console::Console;
use crate::application::stop_signal::{StopReason, StopSignal};

/// Name given to the receiver's OS thread.
pub const RECEIVER_THREAD_NAME: &str = "catmouse-rx";

/// Timing knobs for the receiver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Upper bound on a single `receive` call.
    pub receive_timeout: Duration,
    /// Pause after a receive error before polling again.
    pub error_backoff: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            receive_timeout: Duration::from_millis(100),
            error_backoff: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiverState {
    Running,
    Stopping,
    Stopped,
}

/// What the receiver saw before it exited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Frames successfully read, including the game-over frame.
    pub frames_received: u64,
    /// Receive errors reported while running.
    pub receive_errors: u64,
    /// Whether this receiver observed the game-over broadcast.
    pub game_over: bool,
}

/// Runs the receiver loop on the current thread until the session stops.
///
/// Never returns an error: bus failures are reported on the console and in
/// the log, and the loop keeps going until the stop flag closes.
pub fn run_receiver<B: CanBus + ?Sized>(
    bus: &B,
    role: Role,
    stop: &StopSignal,
    console: &Console,
    config: &ReceiverConfig,
) -> ReceiverStats {
    let mut stats = ReceiverStats::default();
    let mut state = ReceiverState::Running;
    debug!("receiver started");
    console.line("[Receiver] Starting receive thread...\n");

    while state != ReceiverState::Stopped {
        if state == ReceiverState::Stopping || !stop.is_running() {
            state = ReceiverState::Stopped;
            continue;
        }

        match bus.receive(config.receive_timeout) {
            Ok(None) => {}
            Ok(Some(frame)) => {
                stats.frames_received += 1;
                match decode(&frame) {
                    DecodedEvent::GameOver => {
                        stats.game_over = true;
                        if stop.stop(StopReason::GameOver) {
                            info!("game over received");
                        }
                        console.game_over();
                        state = ReceiverState::Stopping;
                    }
                    DecodedEvent::OtherTraffic { .. } => {
                        match decode_command(&frame) {
                            Some((player, command)) => debug!(%player, %command, "player command"),
                            None => debug!(id = %frame.id(), "bus traffic"),
                        }
                        console.received(role, &frame);
                    }
                }
            }
            Err(_) if !stop.is_running() => {
                // Shutdown tears the handle down under us; that is expected.
                state = ReceiverState::Stopped;
            }
            Err(BusError::Closed) => {
                warn!("bus closed while the session was running");
                stop.stop(StopReason::BusFailure);
                state = ReceiverState::Stopped;
            }
            Err(e) => {
                stats.receive_errors += 1;
                warn!("receive error: {e}");
                console.line(&format!("\r[Receiver] Error: {e}"));
                console.prompt(role);
                thread::sleep(config.error_backoff);
            }
        }
    }

    debug!(
        frames = stats.frames_received,
        errors = stats.receive_errors,
        "receiver stopped"
    );
    console.line("[Receiver] Thread stopped");
    stats
}

/// Starts [`run_receiver`] on a dedicated, named thread.
///
/// # Errors
///
/// Returns the OS error if the thread cannot be created.
pub fn spawn_receiver<B>(
    bus: Arc<B>,
    role: Role,
    stop: StopSignal,
    console: Console,
    config: ReceiverConfig,
) -> io::Result<JoinHandle<ReceiverStats>>
where
    B: CanBus + ?Sized + 'static,
{
    // Carry the session span over so receiver logs keep the session id.
    let span = Span::current();
    thread::Builder::new()
        .name(RECEIVER_THREAD_NAME.to_string())
        .spawn(move || {
            let _entered = span.enter();
            run_receiver(&*bus, role, &stop, &console, &config)
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
