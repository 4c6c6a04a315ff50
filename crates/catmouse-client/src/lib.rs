//! catmouse-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does catmouse-client do? (for beginners)
//!
//! Two people play "cat and mouse" on a small embedded controller that
//! draws the game.  Each player runs this client on a machine connected to
//! the same CAN bus as the controller.  The client:
//!
//! 1. Asks whether the operator plays the Cat (`1`) or the Mouse (`2`).
//! 2. Opens the CAN adapter.  If that fails it prints troubleshooting steps
//!    and exits with a failure status.
//! 3. Starts a background receiver thread that watches the bus for the
//!    controller's "game over" broadcast and prints any other traffic.
//! 4. Reads single key presses (`w a s d` or arrow keys) and sends one
//!    8-byte movement frame per key under the role's identifier.
//! 5. Stops on `q`, Ctrl-C, end of input, or game over; waits briefly for
//!    the receiver, then closes the adapter exactly once.

/// Application layer: use cases and the ports they depend on.
pub mod application;

/// Infrastructure layer: bus adapters, keyboard sources, configuration.
pub mod infrastructure;
