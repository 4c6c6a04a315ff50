//! Encoding and classification of game frames.
//!
//! Wire format (classic CAN, standard identifiers, 8-byte payload):
//! ```text
//! command:   id = 0x101 (Cat) | 0x102 (Mouse)   data = [code, 0, 0, 0, 0, 0, 0, 0]
//! game over: id = 0x200                          data = [0x01, ...]
//! ```
//! `code` is the [`Command`] wire code (Up=0, Down=1, Left=2, Right=3).

use crate::domain::{command::Command, role::Role};
use crate::protocol::frame::{CanFrame, StandardId, MAX_PAYLOAD_LEN};
use tracing::trace;

/// Identifier of commands sent by the Cat.
pub const CAT_COMMAND_ID: StandardId = StandardId::from_const(0x101);

/// Identifier of commands sent by the Mouse.
pub const MOUSE_COMMAND_ID: StandardId = StandardId::from_const(0x102);

/// Identifier of the controller's "game over" broadcast.
pub const GAME_OVER_ID: StandardId = StandardId::from_const(0x200);

/// Payload byte 0 of a game-over broadcast.
pub const GAME_OVER_CODE: u8 = 0x01;

/// Classification of an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    /// The controller reports that the cat caught the mouse.
    GameOver,
    /// Any other frame; shown to the operator, no further action.
    OtherTraffic {
        id: StandardId,
        payload: Vec<u8>,
    },
}

/// Returns the outbound arbitration identifier for `role`.
pub fn arbitration_id(role: Role) -> StandardId {
    match role {
        Role::Cat => CAT_COMMAND_ID,
        Role::Mouse => MOUSE_COMMAND_ID,
    }
}

/// Builds the frame that moves `role` in the direction of `command`.
///
/// # Examples
///
/// ```rust
/// use catmouse_core::{encode, Command, Role};
///
/// let frame = encode(Role::Mouse, Command::Right);
/// assert_eq!(frame.id().as_raw(), 0x102);
/// assert_eq!(frame.data(), &[3, 0, 0, 0, 0, 0, 0, 0]);
/// ```
pub fn encode(role: Role, command: Command) -> CanFrame {
    let mut data = [0u8; MAX_PAYLOAD_LEN];
    data[0] = command.code();
    CanFrame::with_payload(arbitration_id(role), data)
}

/// Classifies an inbound frame.
///
/// A frame is [`DecodedEvent::GameOver`] iff its identifier is
/// [`GAME_OVER_ID`] and its first payload byte is [`GAME_OVER_CODE`]; the
/// remaining bytes are not inspected.  Everything else, including command
/// frames from the other player, is [`DecodedEvent::OtherTraffic`].
pub fn decode(frame: &CanFrame) -> DecodedEvent {
    if frame.id() == GAME_OVER_ID && frame.data().first() == Some(&GAME_OVER_CODE) {
        trace!(id = %frame.id(), "game-over frame");
        return DecodedEvent::GameOver;
    }
    DecodedEvent::OtherTraffic {
        id: frame.id(),
        payload: frame.data().to_vec(),
    }
}

/// Recovers the `(role, command)` pair from a command frame.
///
/// Returns `None` for identifiers other than the two role identifiers, for
/// empty payloads, and for unknown command codes.
pub fn decode_command(frame: &CanFrame) -> Option<(Role, Command)> {
    let role = Role::ALL
        .into_iter()
        .find(|role| arbitration_id(*role) == frame.id())?;
    let command = Command::from_code(*frame.data().first()?)?;
    Some((role, command))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: u16, data: &[u8]) -> CanFrame {
        CanFrame::new(StandardId::new(u32::from(id)).unwrap(), data).unwrap()
    }

    // ── encode ────────────────────────────────────────────────────────────────

    #[test]
    fn test_arbitration_ids_per_role() {
        assert_eq!(arbitration_id(Role::Cat).as_raw(), 0x101);
        assert_eq!(arbitration_id(Role::Mouse).as_raw(), 0x102);
    }

    #[test]
    fn test_encode_cat_up_is_all_zero_payload() {
        let frame = encode(Role::Cat, Command::Up);
        assert_eq!(frame.id().as_raw(), 0x101);
        assert_eq!(frame.data(), &[0u8; 8]);
    }

    #[test]
    fn test_encode_leaves_reserved_bytes_zero() {
        for role in Role::ALL {
            for cmd in Command::ALL {
                let frame = encode(role, cmd);
                assert_eq!(frame.data().len(), 8);
                assert_eq!(frame.data()[0], cmd.code());
                assert!(frame.data()[1..].iter().all(|b| *b == 0));
            }
        }
    }

    // ── decode ────────────────────────────────────────────────────────────────

    #[test]
    fn test_decode_game_over() {
        assert_eq!(decode(&frame(0x200, &[1, 0, 0, 0, 0, 0, 0, 0])), DecodedEvent::GameOver);
    }

    #[test]
    fn test_decode_game_over_ignores_trailing_bytes() {
        assert_eq!(
            decode(&frame(0x200, &[1, 0xFF, 0xAA, 0x55, 9, 8, 7, 6])),
            DecodedEvent::GameOver
        );
        assert_eq!(decode(&frame(0x200, &[1])), DecodedEvent::GameOver);
    }

    #[test]
    fn test_decode_game_over_id_with_other_code_is_traffic() {
        for code in [0x00, 0x02, 0xFF] {
            let f = frame(0x200, &[code, 0, 0, 0, 0, 0, 0, 0]);
            assert!(matches!(decode(&f), DecodedEvent::OtherTraffic { .. }));
        }
    }

    #[test]
    fn test_decode_empty_game_over_frame_is_traffic() {
        let f = frame(0x200, &[]);
        assert_eq!(
            decode(&f),
            DecodedEvent::OtherTraffic {
                id: GAME_OVER_ID,
                payload: vec![],
            }
        );
    }

    #[test]
    fn test_decode_terminal_code_on_other_id_is_traffic() {
        let f = frame(0x201, &[1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            decode(&f),
            DecodedEvent::OtherTraffic {
                id: StandardId::from_const(0x201),
                payload: vec![1, 0, 0, 0, 0, 0, 0, 0],
            }
        );
    }

    #[test]
    fn test_decode_command_frame_never_classifies_as_game_over() {
        for role in Role::ALL {
            for cmd in Command::ALL {
                assert!(matches!(
                    decode(&encode(role, cmd)),
                    DecodedEvent::OtherTraffic { .. }
                ));
            }
        }
    }

    // ── decode_command ────────────────────────────────────────────────────────

    #[test]
    fn test_decode_command_recovers_role_and_command() {
        for role in Role::ALL {
            for cmd in Command::ALL {
                assert_eq!(decode_command(&encode(role, cmd)), Some((role, cmd)));
            }
        }
    }

    #[test]
    fn test_decode_command_rejects_unknown_id_and_code() {
        assert_eq!(decode_command(&frame(0x200, &[0])), None);
        assert_eq!(decode_command(&frame(0x101, &[4])), None);
        assert_eq!(decode_command(&frame(0x102, &[])), None);
    }
}
