//! # catmouse-core
//!
//! Shared library for the Cat & Mouse CAN game controller containing the
//! player domain types and the fixed 8-byte CAN frame codec.
//!
//! It has zero dependencies on OS APIs, terminals, or CAN drivers, so every
//! rule here can be unit-tested on any machine.
//!
//! # Architecture overview (for beginners)
//!
//! Two operators play a game of "cat and mouse" drawn by an embedded
//! controller on an oscilloscope.  Each operator runs this controller client,
//! picks a role, and steers their dot with the keyboard.  Every key press
//! becomes one CAN frame on the bus; the embedded controller broadcasts a
//! "game over" frame when the cat catches the mouse.
//!
//! This crate defines:
//!
//! - **`domain`** – The player [`Role`] and the movement [`Command`], plus
//!   the keyboard bindings that select a command.
//!
//! - **`protocol`** – How a command travels on the wire: an 11-bit
//!   identifier chosen by the role plus an 8-byte payload whose first byte is
//!   the command code.  Inbound frames are classified as either the terminal
//!   game-over event or ordinary traffic shown for information only.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `catmouse_core::Role` instead of `catmouse_core::domain::role::Role`.
pub use domain::command::Command;
pub use domain::role::{Role, RoleSelectionError};
pub use protocol::codec::{decode, decode_command, encode, DecodedEvent};
pub use protocol::frame::{CanFrame, FrameError, StandardId};
