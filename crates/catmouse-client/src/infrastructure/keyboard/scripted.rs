//! A key source that replays a fixed list of key presses.
//!
//! Used by tests to drive the input loop deterministically.  Once the
//! script runs out the source either idles (every poll waits out its
//! timeout and returns `None`, like a keyboard nobody touches) or reports
//! the input as closed.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use crate::application::send_commands::{KeyPress, KeySource, KeyboardError};

/// Replays scripted [`KeyPress`]es, one per poll.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    script: VecDeque<KeyPress>,
    close_when_done: bool,
    polls: usize,
}

impl ScriptedKeys {
    /// A source that idles after the last key.
    pub fn new(keys: impl IntoIterator<Item = KeyPress>) -> Self {
        Self {
            script: keys.into_iter().collect(),
            close_when_done: false,
            polls: 0,
        }
    }

    /// A source that never delivers a key.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Builds a script from typed text, one character per key.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.chars().map(KeyPress::Char))
    }

    /// Report [`KeyboardError::Closed`] instead of idling once the script ends.
    pub fn then_close(mut self) -> Self {
        self.close_when_done = true;
        self
    }

    /// How many times [`KeySource::poll_key`] was called.
    pub fn polls(&self) -> usize {
        self.polls
    }

    /// Keys not yet delivered.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl KeySource for ScriptedKeys {
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<KeyPress>, KeyboardError> {
        self.polls += 1;
        match self.script.pop_front() {
            Some(key) => Ok(Some(key)),
            None if self.close_when_done => Err(KeyboardError::Closed),
            None => {
                thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
