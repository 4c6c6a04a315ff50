//! The session's shared "running" latch.
//!
//! # Why a latch instead of a plain boolean? (for beginners)
//!
//! Both the input loop and the receiver loop may decide the session is over:
//! the operator presses `q`, the controller broadcasts "game over", or Ctrl-C
//! arrives.  Several of these can happen at nearly the same instant.  The
//! only transition ever made is *running → stopped*, so no lock is needed:
//! an atomic compare-and-swap from `RUNNING` to the stop reason succeeds for
//! exactly one writer and every later writer sees the latch already closed.
//!
//! The winning writer's [`StopReason`] is kept so the session controller can
//! tell the operator why the game ended.
//!
//! # Memory ordering
//!
//! `Release` on the write and `Acquire` on the read mean anything a loop
//! printed before stopping is visible to whoever observes the stop.  The
//! loops poll the latch at least once per polling interval, which bounds how
//! long a stop takes to be noticed.

use std::fmt;
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

const RUNNING: u8 = 0;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StopReason {
    /// The operator pressed the quit key.
    Quit = 1,
    /// The controller broadcast the game-over frame.
    GameOver = 2,
    /// SIGINT / Ctrl-C.
    Interrupted = 3,
    /// Standard input reached end-of-file or failed.
    InputClosed = 4,
    /// An unrecoverable bus condition ended the session.
    BusFailure = 5,
}

impl StopReason {
    fn from_u8(value: u8) -> Option<StopReason> {
        match value {
            1 => Some(StopReason::Quit),
            2 => Some(StopReason::GameOver),
            3 => Some(StopReason::Interrupted),
            4 => Some(StopReason::InputClosed),
            5 => Some(StopReason::BusFailure),
            _ => None,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Quit => "quit by operator",
            StopReason::GameOver => "game over",
            StopReason::Interrupted => "interrupted",
            StopReason::InputClosed => "input closed",
            StopReason::BusFailure => "bus failure",
        };
        f.write_str(text)
    }
}

/// A cloneable handle to the one-way running → stopped latch.
#[derive(Debug, Clone)]
pub struct StopSignal {
    state: Arc<AtomicU8>,
}

impl StopSignal {
    /// Creates a latch in the running state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RUNNING)),
        }
    }

    /// Returns `true` until any holder calls [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == RUNNING
    }

    /// Closes the latch.
    ///
    /// Returns `true` if this call performed the transition, `false` if the
    /// session was already stopped (the original reason is kept).
    pub fn stop(&self, reason: StopReason) -> bool {
        self.state
            .compare_exchange(RUNNING, reason as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// The reason recorded by the first [`stop`](Self::stop), if any.
    pub fn reason(&self) -> Option<StopReason> {
        StopReason::from_u8(self.state.load(Ordering::Acquire))
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
