//! Movement commands.
//!
//! Each command has a fixed one-byte wire code and a fixed keyboard binding:
//!
//! | Command | Code | Key |
//! |---------|------|-----|
//! | Up      | 0    | `w` |
//! | Down    | 1    | `s` |
//! | Left    | 2    | `a` |
//! | Right   | 3    | `d` |
//!
//! The embedded controller interprets the code, so the mapping must never
//! change.  Key matching is case-insensitive.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A directional movement command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Command {
    /// Every command, in wire-code order.
    pub const ALL: [Command; 4] = [Command::Up, Command::Down, Command::Left, Command::Right];

    /// The code carried in payload byte 0.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a command by its wire code.
    pub fn from_code(code: u8) -> Option<Command> {
        match code {
            0 => Some(Command::Up),
            1 => Some(Command::Down),
            2 => Some(Command::Left),
            3 => Some(Command::Right),
            _ => None,
        }
    }

    /// The lower-case key bound to this command.
    pub fn key(self) -> char {
        match self {
            Command::Up => 'w',
            Command::Down => 's',
            Command::Left => 'a',
            Command::Right => 'd',
        }
    }

    /// Maps a pressed key to its command, ignoring case.
    ///
    /// ```rust
    /// use catmouse_core::Command;
    ///
    /// assert_eq!(Command::from_key('W'), Some(Command::Up));
    /// assert_eq!(Command::from_key('x'), None);
    /// ```
    pub fn from_key(key: char) -> Option<Command> {
        match key.to_ascii_lowercase() {
            'w' => Some(Command::Up),
            's' => Some(Command::Down),
            'a' => Some(Command::Left),
            'd' => Some(Command::Right),
            _ => None,
        }
    }

    /// Upper-case direction label shown in confirmation lines.
    pub fn label(self) -> &'static str {
        match self {
            Command::Up => "UP",
            Command::Down => "DOWN",
            Command::Left => "LEFT",
            Command::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
