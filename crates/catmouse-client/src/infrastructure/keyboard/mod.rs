//! Keyboard sources.

pub mod scripted;
#[cfg(unix)]
pub mod terminal;

pub use scripted::ScriptedKeys;
#[cfg(unix)]
pub use terminal::{stdin_lines, TerminalKeys};
