//! Application layer use cases for the controller client.
//!
//! # What use cases does the client have?
//!
//! - **`select_role`** – Shows the role menu and reads `1` or `2`, asking
//!   again on anything else.
//!
//! - **`receive_frames`** – The background receiver loop: polls the bus,
//!   prints unrelated traffic, and stops the session on the controller's
//!   game-over broadcast.
//!
//! - **`send_commands`** – The foreground input loop: maps key presses to
//!   movement commands and sends one frame per key.
//!
//! - **`session`** – Ties everything together.  Opens the bus, starts the
//!   receiver before input, and on shutdown joins the receiver with a
//!   bounded wait and releases the bus exactly once.
//!
//! The ports the use cases depend on live here too: [`bus::CanBus`] for the
//! adapter and [`send_commands::KeySource`] for the keyboard.  Concrete
//! implementations are in `crate::infrastructure`.

pub mod bus;
pub mod console;
pub mod receive_frames;
pub mod select_role;
pub mod send_commands;
pub mod session;
pub mod stop_signal;
