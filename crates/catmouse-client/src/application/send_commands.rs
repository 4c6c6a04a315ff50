//! Use case: turn key presses into movement frames.
//!
//! This is the session's primary loop.  Each iteration asks the
//! [`KeySource`] for a key with a short timeout, maps it to a
//! [`KeyAction`], and, for movement keys, sends one frame for the session's
//! role.  The shared [`StopSignal`] is checked before every poll and again
//! right before every send, so nothing is transmitted once the session has
//! stopped, whichever thread stopped it.

use std::io;
use std::thread;
use std::time::Duration;

use catmouse_core::{encode, Command, Role};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::bus::CanBus;
use crate::application::console::Console;
use crate::application::stop_signal::{StopReason, StopSignal};

/// A key event delivered by a [`KeySource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    /// A printable character, as typed.
    Char(char),
    /// An arrow key, already mapped to its direction.
    Arrow(Command),
    /// Ctrl-C typed while the terminal is in key mode.
    Interrupt,
}

/// Errors produced by a keyboard source.
#[derive(Debug, Error)]
pub enum KeyboardError {
    /// Switching the terminal into key mode failed.
    #[error("failed to configure terminal: {0}")]
    Setup(#[source] io::Error),

    /// Reading a key failed.
    #[error("failed to read key: {0}")]
    Read(#[source] io::Error),

    /// The input stream reached end-of-file.
    #[error("input closed")]
    Closed,

    /// No terminal key source exists on this platform.
    #[error("raw key input is not supported on this platform")]
    Unsupported,
}

/// Port for "key pressed or none" polling.
#[cfg_attr(test, mockall::automock)]
pub trait KeySource {
    /// Waits at most `timeout` for one key.
    ///
    /// Returns `Ok(None)` when no key arrived in time.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<KeyPress>, KeyboardError>;
}

/// What the input loop does with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Send this movement command.
    Move(Command),
    /// End the session at the operator's request.
    Quit,
    /// End the session as if interrupted.
    Interrupt,
    /// Not bound to anything.
    Ignore,
}

impl KeyAction {
    /// Maps a key to its action.  Letters are case-insensitive.
    pub fn from_key(key: KeyPress) -> KeyAction {
        match key {
            KeyPress::Arrow(command) => KeyAction::Move(command),
            KeyPress::Interrupt => KeyAction::Interrupt,
            KeyPress::Char(c) if c.eq_ignore_ascii_case(&'q') => KeyAction::Quit,
            KeyPress::Char(c) => Command::from_key(c).map_or(KeyAction::Ignore, KeyAction::Move),
        }
    }
}

/// Timing knobs for the input loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    /// Upper bound on a single key poll.
    pub key_poll_timeout: Duration,
    /// Pause after every iteration.
    pub tick: Duration,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            key_poll_timeout: Duration::from_millis(100),
            tick: Duration::from_millis(10),
        }
    }
}

/// Counters from one run of the input loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputStats {
    /// Frames the bus accepted.
    pub frames_sent: u64,
    /// Sends that failed.
    pub send_errors: u64,
    /// Keys with no binding.
    pub keys_ignored: u64,
}

/// Runs the input loop on the current thread until the session stops.
pub fn run_input_loop<B, K>(
    bus: &B,
    keys: &mut K,
    role: Role,
    stop: &StopSignal,
    console: &Console,
    config: &InputConfig,
) -> InputStats
where
    B: CanBus + ?Sized,
    K: KeySource + ?Sized,
{
    let mut stats = InputStats::default();

    while stop.is_running() {
        match keys.poll_key(config.key_poll_timeout) {
            Ok(None) => {}
            Ok(Some(key)) => match KeyAction::from_key(key) {
                KeyAction::Move(command) => {
                    if !stop.is_running() {
                        break;
                    }
                    send_command(bus, role, command, console, &mut stats);
                }
                KeyAction::Quit => {
                    stop.stop(StopReason::Quit);
                    break;
                }
                KeyAction::Interrupt => {
                    stop.stop(StopReason::Interrupted);
                    break;
                }
                KeyAction::Ignore => {
                    stats.keys_ignored += 1;
                    debug!(?key, "unbound key");
                }
            },
            Err(e) => {
                info!("keyboard input ended: {e}");
                stop.stop(StopReason::InputClosed);
                break;
            }
        }
        thread::sleep(config.tick);
    }

    stats
}

fn send_command<B: CanBus + ?Sized>(
    bus: &B,
    role: Role,
    command: Command,
    console: &Console,
    stats: &mut InputStats,
) {
    let frame = encode(role, command);
    match bus.send(&frame) {
        Ok(()) => {
            stats.frames_sent += 1;
            debug!(id = %frame.id(), code = command.code(), "sent");
            console.sent(role, command);
        }
        Err(e) => {
            stats.send_errors += 1;
            warn!(%command, "send failed: {e}");
            console.line(&format!("\r[Sender] Error: {e}"));
            console.prompt(role);
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
