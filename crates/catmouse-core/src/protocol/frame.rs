//! Classic CAN data frames with standard (11-bit) identifiers.
//!
//! # Frame layout (for beginners)
//!
//! A classic CAN data frame carries an *arbitration identifier* and up to
//! 8 payload bytes.  The identifier tells every node on the bus what the
//! frame means; lower identifiers also win bus arbitration when two nodes
//! transmit at once.  This game only uses *standard* identifiers, which are
//! 11 bits wide (`0x000`–`0x7FF`).
//!
//! Frames this controller sends are always 8 bytes long.  Frames received
//! from other nodes may be shorter (the Linux test client sends 1-byte
//! frames), so [`CanFrame`] remembers the actual data length.

use std::fmt;

use thiserror::Error;

/// Maximum payload length of a classic CAN frame.
pub const MAX_PAYLOAD_LEN: usize = 8;

/// Errors raised when constructing frames from raw values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The identifier does not fit in 11 bits.
    #[error("identifier 0x{0:X} exceeds the 11-bit standard range")]
    IdOutOfRange(u32),

    /// More than 8 payload bytes were supplied.
    #[error("payload of {0} bytes exceeds the 8-byte classic CAN limit")]
    PayloadTooLong(usize),
}

/// An 11-bit standard CAN identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StandardId(u16);

impl StandardId {
    /// Largest valid standard identifier.
    pub const MAX: StandardId = StandardId(0x7FF);

    /// Creates an identifier from a constant known to be in range.
    ///
    /// Used for the protocol's fixed identifiers; evaluating it in a `const`
    /// with an out-of-range value fails compilation.
    pub const fn from_const(raw: u16) -> StandardId {
        assert!(raw <= 0x7FF, "standard CAN identifiers are 11 bits");
        StandardId(raw)
    }

    /// Validates a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::IdOutOfRange`] if `raw > 0x7FF`.
    pub fn new(raw: u32) -> Result<StandardId, FrameError> {
        if raw > u32::from(Self::MAX.0) {
            return Err(FrameError::IdOutOfRange(raw));
        }
        Ok(StandardId(raw as u16))
    }

    /// The raw identifier value.
    pub fn as_raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for StandardId {
    /// Formats as `0x` followed by three upper-case hex digits, e.g. `0x101`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03X}", self.0)
    }
}

/// A classic CAN data frame with a standard identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    id: StandardId,
    data: [u8; MAX_PAYLOAD_LEN],
    len: u8,
}

impl CanFrame {
    /// Builds a frame from an identifier and up to 8 payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLong`] if `data` has more than 8 bytes.
    pub fn new(id: StandardId, data: &[u8]) -> Result<CanFrame, FrameError> {
        if data.len() > MAX_PAYLOAD_LEN {
            return Err(FrameError::PayloadTooLong(data.len()));
        }
        let mut buf = [0u8; MAX_PAYLOAD_LEN];
        buf[..data.len()].copy_from_slice(data);
        Ok(CanFrame {
            id,
            data: buf,
            len: data.len() as u8,
        })
    }

    /// Builds a full-length 8-byte frame.
    pub fn with_payload(id: StandardId, data: [u8; MAX_PAYLOAD_LEN]) -> CanFrame {
        CanFrame {
            id,
            data,
            len: MAX_PAYLOAD_LEN as u8,
        }
    }

    /// The arbitration identifier.
    pub fn id(&self) -> StandardId {
        self.id
    }

    /// The payload bytes actually carried by the frame.
    pub fn data(&self) -> &[u8] {
        &self.data[..usize::from(self.len)]
    }
}

impl fmt::Display for CanFrame {
    /// `ID: 0x101, Data: [00 00 00 00 00 00 00 00]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID: {}, Data: [{}]", self.id, format_payload(self.data()))
    }
}

/// Formats payload bytes as space-separated two-digit upper-case hex.
///
/// ```rust
/// use catmouse_core::protocol::frame::format_payload;
///
/// assert_eq!(format_payload(&[0x00, 0x1F, 0xFF]), "00 1F FF");
/// assert_eq!(format_payload(&[]), "");
/// ```
pub fn format_payload(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_id_accepts_full_11_bit_range() {
        assert_eq!(StandardId::new(0).unwrap().as_raw(), 0);
        assert_eq!(StandardId::new(0x7FF).unwrap(), StandardId::MAX);
    }

    #[test]
    fn test_standard_id_rejects_extended_values() {
        assert_eq!(StandardId::new(0x800), Err(FrameError::IdOutOfRange(0x800)));
        assert_eq!(
            StandardId::new(0x1FFF_FFFF),
            Err(FrameError::IdOutOfRange(0x1FFF_FFFF))
        );
    }

    #[test]
    fn test_standard_id_display_pads_to_three_digits() {
        assert_eq!(StandardId::from_const(0x101).to_string(), "0x101");
        assert_eq!(StandardId::from_const(0x7).to_string(), "0x007");
        assert_eq!(StandardId::from_const(0x2A).to_string(), "0x02A");
    }

    #[test]
    fn test_new_keeps_short_payload_length() {
        // Arrange
        let id = StandardId::from_const(0x200);

        // Act
        let frame = CanFrame::new(id, &[0x01]).unwrap();

        // Assert
        assert_eq!(frame.data(), &[0x01]);
    }

    #[test]
    fn test_new_rejects_nine_bytes() {
        let id = StandardId::from_const(0x200);
        assert_eq!(
            CanFrame::new(id, &[0u8; 9]),
            Err(FrameError::PayloadTooLong(9))
        );
    }

    #[test]
    fn test_with_payload_is_eight_bytes() {
        let frame = CanFrame::with_payload(StandardId::from_const(0x102), [3, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(frame.data().len(), 8);
    }

    #[test]
    fn test_display_matches_receive_line_format() {
        let frame =
            CanFrame::with_payload(StandardId::from_const(0x123), [0xDE, 0xAD, 0, 0, 0, 0, 0, 0x0F]);
        assert_eq!(frame.to_string(), "ID: 0x123, Data: [DE AD 00 00 00 00 00 0F]");
    }
}
