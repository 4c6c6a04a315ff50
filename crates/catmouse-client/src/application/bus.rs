//! The bus handle port: what the session needs from a CAN adapter.
//!
//! The application layer only ever talks to a [`CanBus`]; the SocketCAN
//! adapter and the in-memory loopback used by tests live in
//! `infrastructure::bus`.
//!
//! # Sharing one handle between two threads
//!
//! The receiver thread calls [`CanBus::receive`] while the input loop calls
//! [`CanBus::send`], so implementations take `&self` and must be
//! `Send + Sync`.  Transports that cannot serve both directions at once
//! serialize access internally.
//!
//! [`SharedBus`] wraps an adapter and guarantees the adapter's
//! [`CanBus::shutdown`] runs exactly once, however many shutdown paths fire.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use catmouse_core::CanFrame;
use thiserror::Error;
use tracing::{debug, info};

/// Errors reported by a CAN adapter.
#[derive(Debug, Error)]
pub enum BusError {
    /// The adapter could not be opened.  Fatal to the session.
    #[error("failed to open CAN interface {interface}: {reason}")]
    Open { interface: String, reason: String },

    /// A single frame could not be transmitted.
    #[error("send failed: {0}")]
    Send(String),

    /// Reading from the adapter failed (not a timeout).
    #[error("receive failed: {0}")]
    Receive(String),

    /// The handle was already shut down.
    #[error("bus handle is shut down")]
    Closed,
}

/// Adapter selection and bit timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// OS interface name, e.g. `can0`.
    pub interface: String,
    /// Adapter channel index.
    pub channel: u8,
    /// Nominal bitrate in bits per second.
    pub bitrate: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            interface: "can0".to_string(),
            channel: 0,
            bitrate: 500_000,
        }
    }
}

/// An open connection to a CAN adapter.
pub trait CanBus: Send + Sync {
    /// Transmits one frame.
    fn send(&self, frame: &CanFrame) -> Result<(), BusError>;

    /// Waits at most `timeout` for the next frame.
    ///
    /// Returns `Ok(None)` when the wait elapses without traffic.
    fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, BusError>;

    /// Releases the adapter.  Later calls to `send`/`receive` return
    /// [`BusError::Closed`].
    fn shutdown(&self);
}

macro_rules! forward_can_bus {
    ($ptr:ident) => {
        impl<T: CanBus + ?Sized> CanBus for $ptr<T> {
            fn send(&self, frame: &CanFrame) -> Result<(), BusError> {
                (**self).send(frame)
            }

            fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, BusError> {
                (**self).receive(timeout)
            }

            fn shutdown(&self) {
                (**self).shutdown()
            }
        }
    };
}

forward_can_bus!(Box);
forward_can_bus!(Arc);

/// A bus handle whose release happens exactly once.
///
/// Dropping the wrapper also releases the adapter, so early returns and
/// panics on the controller thread cannot leak it.
pub struct SharedBus<B: CanBus> {
    inner: B,
    released: AtomicBool,
}

impl<B: CanBus> SharedBus<B> {
    /// Takes ownership of an open adapter.
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            released: AtomicBool::new(false),
        }
    }

    /// Shuts the adapter down if nobody has yet.
    ///
    /// Returns `true` for the call that actually released it.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            debug!("bus already released");
            return false;
        }
        self.inner.shutdown();
        info!("CAN bus released");
        true
    }

    /// Whether [`release`](Self::release) has run.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl<B: CanBus> CanBus for SharedBus<B> {
    fn send(&self, frame: &CanFrame) -> Result<(), BusError> {
        if self.is_released() {
            return Err(BusError::Closed);
        }
        self.inner.send(frame)
    }

    fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, BusError> {
        if self.is_released() {
            return Err(BusError::Closed);
        }
        self.inner.receive(timeout)
    }

    fn shutdown(&self) {
        self.release();
    }
}

impl<B: CanBus> Drop for SharedBus<B> {
    fn drop(&mut self) {
        self.release();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use catmouse_core::{encode, Command, Role};
    use std::sync::{atomic::AtomicUsize, Arc};
    use std::thread;

    #[derive(Default)]
    struct CountingBus {
        shutdowns: Arc<AtomicUsize>,
    }

    impl CanBus for CountingBus {
        fn send(&self, _frame: &CanFrame) -> Result<(), BusError> {
            Ok(())
        }

        fn receive(&self, _timeout: Duration) -> Result<Option<CanFrame>, BusError> {
            Ok(None)
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_bus_config_default_is_can0_at_500k() {
        let cfg = BusConfig::default();

        assert_eq!(cfg.interface, "can0");
        assert_eq!(cfg.channel, 0);
        assert_eq!(cfg.bitrate, 500_000);
    }

    #[test]
    fn test_release_shuts_down_once() {
        // Arrange
        let counter = Arc::new(AtomicUsize::new(0));
        let bus = SharedBus::new(CountingBus {
            shutdowns: Arc::clone(&counter),
        });

        // Act
        let first = bus.release();
        let second = bus.release();
        bus.shutdown();

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_unreleased_bus() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let _bus = SharedBus::new(CountingBus {
                shutdowns: Arc::clone(&counter),
            });
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_after_release_does_not_shut_down_again() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let bus = SharedBus::new(CountingBus {
                shutdowns: Arc::clone(&counter),
            });
            bus.release();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_operations_after_release_report_closed() {
        let bus = SharedBus::new(CountingBus::default());
        bus.release();

        assert!(matches!(
            bus.send(&encode(Role::Cat, Command::Up)),
            Err(BusError::Closed)
        ));
        assert!(matches!(
            bus.receive(Duration::from_millis(1)),
            Err(BusError::Closed)
        ));
    }

    #[test]
    fn test_racing_releases_shut_down_once() {
        // Arrange
        let counter = Arc::new(AtomicUsize::new(0));
        let bus = Arc::new(SharedBus::new(CountingBus {
            shutdowns: Arc::clone(&counter),
        }));

        // Act – quit key, game over, and Ctrl-C all land together
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || bus.release())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        drop(bus);

        // Assert
        assert_eq!(winners, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
