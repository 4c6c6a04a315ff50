//! Linux SocketCAN adapter.
//!
//! # How SocketCAN works (for beginners)
//!
//! On Linux a CAN adapter shows up as a network interface (`can0`), just
//! like an Ethernet card.  Programs open a raw CAN socket bound to that
//! interface and read or write one frame per system call.  Bit timing is a
//! property of the interface, not of the socket, so the bitrate is set
//! beforehand with:
//!
//! ```text
//! sudo ip link set can0 up type can bitrate 500000
//! ```
//!
//! # Concurrency
//!
//! A raw CAN socket supports one reader and one writer at the same time, so
//! `send` and `receive` both take a shared read lock on the socket.  Only
//! `shutdown` takes the write lock; it waits for an in-flight receive to
//! time out and then closes the socket.

use std::io::ErrorKind;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use catmouse_core::{CanFrame, StandardId};
use socketcan::{
    CanFrame as SocketFrame, CanSocket, EmbeddedFrame, Id, Socket, StandardId as SocketId,
};
use tracing::{debug, info};

use crate::application::bus::{BusConfig, BusError, CanBus};

/// A [`CanBus`] backed by a raw SocketCAN socket.
pub struct SocketCanBus {
    interface: String,
    socket: RwLock<Option<CanSocket>>,
}

impl SocketCanBus {
    /// Opens the configured interface.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Open`] if the interface does not exist, is down,
    /// or the process lacks permission.
    pub fn open(config: &BusConfig) -> Result<Self, BusError> {
        let socket = CanSocket::open(&config.interface).map_err(|e| BusError::Open {
            interface: config.interface.clone(),
            reason: e.to_string(),
        })?;
        info!(interface = %config.interface, "SocketCAN interface opened");
        Ok(Self {
            interface: config.interface.clone(),
            socket: RwLock::new(Some(socket)),
        })
    }
}

impl CanBus for SocketCanBus {
    fn send(&self, frame: &CanFrame) -> Result<(), BusError> {
        let out = to_socket_frame(frame)?;
        let guard = self.socket.read().unwrap_or_else(PoisonError::into_inner);
        let socket = guard.as_ref().ok_or(BusError::Closed)?;
        socket
            .write_frame(&out)
            .map_err(|e| BusError::Send(e.to_string()))
    }

    fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, BusError> {
        let guard = self.socket.read().unwrap_or_else(PoisonError::into_inner);
        let socket = guard.as_ref().ok_or(BusError::Closed)?;
        match socket.read_frame_timeout(timeout) {
            Ok(frame) => from_socket_frame(frame),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(None),
            Err(e) => Err(BusError::Receive(e.to_string())),
        }
    }

    fn shutdown(&self) {
        let mut guard = self.socket.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            info!(interface = %self.interface, "SocketCAN interface closed");
        }
    }
}

fn to_socket_frame(frame: &CanFrame) -> Result<SocketFrame, BusError> {
    let id = SocketId::new(frame.id().as_raw())
        .ok_or_else(|| BusError::Send(format!("invalid identifier {}", frame.id())))?;
    SocketFrame::new(id, frame.data())
        .ok_or_else(|| BusError::Send(format!("cannot build frame {frame}")))
}

/// Converts a received frame.  Frames this game never uses (extended
/// identifiers, remote requests) read as "nothing received".
fn from_socket_frame(frame: SocketFrame) -> Result<Option<CanFrame>, BusError> {
    match frame {
        SocketFrame::Data(data) => match data.id() {
            Id::Standard(id) => {
                let id = StandardId::new(u32::from(id.as_raw()))
                    .map_err(|e| BusError::Receive(e.to_string()))?;
                CanFrame::new(id, data.data())
                    .map(Some)
                    .map_err(|e| BusError::Receive(e.to_string()))
            }
            Id::Extended(id) => {
                debug!(id = id.as_raw(), "skipping extended frame");
                Ok(None)
            }
        },
        SocketFrame::Remote(_) => {
            debug!("skipping remote frame");
            Ok(None)
        }
        SocketFrame::Error(err) => Err(BusError::Receive(err.into_error().to_string())),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
