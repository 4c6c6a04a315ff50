//! Protocol module containing the frame type and the game codec.

pub mod codec;
pub mod frame;

pub use codec::{
    arbitration_id, decode, decode_command, encode, DecodedEvent, CAT_COMMAND_ID, GAME_OVER_CODE,
    GAME_OVER_ID, MOUSE_COMMAND_ID,
};
pub use frame::{format_payload, CanFrame, FrameError, StandardId, MAX_PAYLOAD_LEN};
