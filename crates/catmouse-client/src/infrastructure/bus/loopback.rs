//! In-memory CAN bus for tests and hardware-free demos.
//!
//! # Why a loopback bus?
//!
//! The SocketCAN adapter needs a real (or virtual) Linux CAN interface, and
//! what it puts on the wire cannot be observed from Rust test code.  The
//! `LoopbackBus` replaces the wire with two queues:
//!
//! - **Inbound script** – frames and errors that `receive` hands out in
//!   order, as if other nodes had transmitted them.  When the script is
//!   empty `receive` waits out its timeout and returns `Ok(None)`, exactly
//!   like an idle bus.
//! - **Sent log** – every frame passed to `send`, for assertions.
//!
//! Call counters and an injectable send failure let tests check the
//! "no operations after stop" and "shutdown exactly once" rules.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use catmouse_core::CanFrame;
use tracing::debug;

use crate::application::bus::{BusConfig, BusError, CanBus};

enum Scripted {
    Frame(CanFrame),
    Error(String),
}

/// A recording, scriptable [`CanBus`].
#[derive(Default)]
pub struct LoopbackBus {
    inbound: Mutex<VecDeque<Scripted>>,
    sent: Mutex<Vec<CanFrame>>,
    fail_sends: AtomicBool,
    closed: AtomicBool,
    send_calls: AtomicUsize,
    receive_calls: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl LoopbackBus {
    /// Creates an idle bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a loopback bus; never fails.
    pub fn open(config: &BusConfig) -> Result<Self, BusError> {
        debug!(interface = %config.interface, "opening loopback bus");
        Ok(Self::new())
    }

    /// Queues a frame for a later `receive`.
    pub fn push_frame(&self, frame: CanFrame) {
        self.lock_inbound().push_back(Scripted::Frame(frame));
    }

    /// Queues a receive error.
    pub fn push_error(&self, reason: &str) {
        self.lock_inbound()
            .push_back(Scripted::Error(reason.to_string()));
    }

    /// Makes every following `send` fail (or succeed again).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Frames successfully sent so far.
    pub fn sent_frames(&self) -> Vec<CanFrame> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `send` calls, successful or not.
    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Number of `receive` calls, including ones that timed out.
    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    /// Number of `shutdown` calls.
    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    fn lock_inbound(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.inbound.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CanBus for LoopbackBus {
    fn send(&self, frame: &CanFrame) -> Result<(), BusError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BusError::Send("injected failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*frame);
        Ok(())
    }

    fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, BusError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        // Pop before sleeping so the lock is never held across the wait.
        let next = self.lock_inbound().pop_front();
        match next {
            Some(Scripted::Frame(frame)) => Ok(Some(frame)),
            Some(Scripted::Error(reason)) => Err(BusError::Receive(reason)),
            None => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use catmouse_core::{encode, Command, Role};

    #[test]
    fn test_send_records_frames_in_order() {
        // Arrange
        let bus = LoopbackBus::new();

        // Act
        bus.send(&encode(Role::Cat, Command::Up)).unwrap();
        bus.send(&encode(Role::Cat, Command::Left)).unwrap();

        // Assert
        assert_eq!(
            bus.sent_frames(),
            vec![encode(Role::Cat, Command::Up), encode(Role::Cat, Command::Left)]
        );
        assert_eq!(bus.send_calls(), 2);
    }

    #[test]
    fn test_receive_replays_script_then_idles() {
        // Arrange
        let bus = LoopbackBus::new();
        let frame = encode(Role::Mouse, Command::Down);
        bus.push_frame(frame);
        bus.push_error("bus-off");

        // Act / Assert
        assert_eq!(bus.receive(Duration::ZERO).unwrap(), Some(frame));
        assert!(matches!(
            bus.receive(Duration::ZERO),
            Err(BusError::Receive(reason)) if reason == "bus-off"
        ));
        assert_eq!(bus.receive(Duration::ZERO).unwrap(), None);
        assert_eq!(bus.receive_calls(), 3);
    }

    #[test]
    fn test_injected_send_failure() {
        let bus = LoopbackBus::new();
        bus.set_fail_sends(true);

        let result = bus.send(&encode(Role::Cat, Command::Right));

        assert!(matches!(result, Err(BusError::Send(_))));
        assert!(bus.sent_frames().is_empty());
    }

    #[test]
    fn test_shutdown_closes_both_directions() {
        let bus = LoopbackBus::new();

        bus.shutdown();

        assert_eq!(bus.shutdown_count(), 1);
        assert!(matches!(
            bus.send(&encode(Role::Cat, Command::Up)),
            Err(BusError::Closed)
        ));
        assert!(matches!(bus.receive(Duration::ZERO), Err(BusError::Closed)));
    }
}
