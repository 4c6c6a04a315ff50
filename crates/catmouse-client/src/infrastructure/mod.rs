//! Infrastructure layer for the controller client.
//!
//! Contains OS-facing adapters: CAN bus access, raw keyboard input, and the
//! TOML configuration file.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `catmouse_core`, but MUST NOT be imported by the `application` or domain
//! layers (tests excepted).
//!
//! # Sub-modules
//!
//! - **`bus`** – [`CanBus`](crate::application::bus::CanBus) implementations.
//!   `SocketCanBus` talks to a Linux SocketCAN interface; `LoopbackBus` is an
//!   in-memory bus for tests and hardware-free runs.
//!
//! - **`keyboard`** – [`KeySource`](crate::application::send_commands::KeySource)
//!   implementations.  `TerminalKeys` puts a Unix terminal into
//!   single-key, no-echo mode; `ScriptedKeys` replays a fixed list.
//!
//! - **`storage`** – Loading `catmouse.toml`.

pub mod bus;
pub mod keyboard;
pub mod storage;
