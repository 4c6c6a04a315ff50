//! CAN adapter implementations.
//!
//! The SocketCAN adapter is compiled on Linux only.  Other platforms get an
//! [`open_socketcan`] that fails with [`BusError::Open`], so the session
//! reports it the same way as a missing interface.

pub mod loopback;
#[cfg(target_os = "linux")]
pub mod socketcan;

pub use loopback::LoopbackBus;
#[cfg(target_os = "linux")]
pub use self::socketcan::SocketCanBus;

use crate::application::bus::{BusConfig, BusError, CanBus};

/// Opens the configured SocketCAN interface as a boxed [`CanBus`].
///
/// # Errors
///
/// Returns [`BusError::Open`] if the interface cannot be opened, or always on
/// platforms without SocketCAN.
pub fn open_socketcan(config: &BusConfig) -> Result<Box<dyn CanBus>, BusError> {
    #[cfg(target_os = "linux")]
    {
        Ok(Box::new(SocketCanBus::open(config)?))
    }
    #[cfg(not(target_os = "linux"))]
    {
        Err(BusError::Open {
            interface: config.interface.clone(),
            reason: "SocketCAN is only available on Linux".to_string(),
        })
    }
}
