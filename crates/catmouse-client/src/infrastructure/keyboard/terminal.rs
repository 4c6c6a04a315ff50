//! Single-key input from a Unix terminal.
//!
//! # Raw-ish terminal mode (for beginners)
//!
//! A terminal normally works in *canonical* mode: it buffers a whole line
//! until Enter and echoes every key.  A game wants each key the moment it is
//! pressed and without echo, so [`TerminalKeys::stdin`] clears the `ICANON`
//! and `ECHO` flags with `tcsetattr`.  `ISIG` stays on, so Ctrl-C still
//! raises SIGINT.
//!
//! The previous settings are saved and put back in `Drop`, which runs on
//! normal return, on an early `?` return, and while a panic unwinds.
//!
//! When standard input is not a terminal (a pipe or a file) the settings are
//! left alone and bytes are read as they come.
//!
//! The role answer is read before key mode starts, from the same descriptor.
//! [`stdin_lines`] reads it one byte at a time, so keys typed or piped after
//! the answer's newline are still there for [`TerminalKeys`].
//!
//! Waiting is done with `poll(2)` so a key poll never blocks longer than its
//! timeout.

use std::collections::VecDeque;
use std::io::{self, BufReader, Read};
use std::os::unix::io::RawFd;
use std::time::Duration;

use catmouse_core::Command;
use tracing::debug;

use crate::application::send_commands::{KeyPress, KeySource, KeyboardError};

const ESC: u8 = 0x1B;
const CTRL_C: u8 = 0x03;

/// Unbuffered reader over a raw descriptor.
pub struct FdReader {
    fd: RawFd,
}

impl FdReader {
    /// Reader over standard input.
    pub fn stdin() -> Self {
        Self::from_fd(libc::STDIN_FILENO)
    }

    fn from_fd(fd: RawFd) -> Self {
        Self { fd }
    }
}

impl Read for FdReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        usize::try_from(n).map_err(|_| io::Error::last_os_error())
    }
}

/// Line reader over standard input that never reads past a newline.
pub fn stdin_lines() -> BufReader<FdReader> {
    BufReader::with_capacity(1, FdReader::stdin())
}

/// Key source reading standard input in single-key, no-echo mode.
pub struct TerminalKeys {
    fd: RawFd,
    saved: Option<libc::termios>,
    pending: VecDeque<u8>,
}

impl TerminalKeys {
    /// Switches standard input to key mode.
    ///
    /// # Errors
    ///
    /// Returns [`KeyboardError::Setup`] if the terminal settings cannot be
    /// read or changed.
    pub fn stdin() -> Result<Self, KeyboardError> {
        Self::from_fd(libc::STDIN_FILENO)
    }

    fn from_fd(fd: RawFd) -> Result<Self, KeyboardError> {
        // SAFETY: isatty only inspects the descriptor.
        let saved = if unsafe { libc::isatty(fd) } == 1 {
            Some(enter_key_mode(fd)?)
        } else {
            debug!("standard input is not a terminal; reading bytes as-is");
            None
        };
        Ok(Self {
            fd,
            saved,
            pending: VecDeque::new(),
        })
    }

    /// Whether terminal settings were changed (and will be restored).
    pub fn is_raw(&self) -> bool {
        self.saved.is_some()
    }

    fn fill(&mut self, timeout: Duration) -> Result<(), KeyboardError> {
        let mut fds = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        // SAFETY: `fds` is a valid, exclusively borrowed pollfd array of length 1.
        let ready = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(());
            }
            return Err(KeyboardError::Read(err));
        }
        if ready == 0 {
            return Ok(());
        }

        let mut buf = [0u8; 16];
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        match n {
            0 => Err(KeyboardError::Closed),
            n if n < 0 => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    Ok(())
                } else {
                    Err(KeyboardError::Read(err))
                }
            }
            n => {
                // n is positive and at most buf.len() here.
                self.pending.extend(&buf[..n as usize]);
                Ok(())
            }
        }
    }
}

impl KeySource for TerminalKeys {
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<KeyPress>, KeyboardError> {
        if self.pending.is_empty() {
            self.fill(timeout)?;
        }
        Ok(parse_key(&mut self.pending))
    }
}

impl Drop for TerminalKeys {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            // SAFETY: `saved` came from tcgetattr on the same descriptor.
            if unsafe { libc::tcsetattr(self.fd, libc::TCSANOW, &saved) } != 0 {
                debug!(
                    "failed to restore terminal settings: {}",
                    io::Error::last_os_error()
                );
            }
        }
    }
}

fn enter_key_mode(fd: RawFd) -> Result<libc::termios, KeyboardError> {
    // SAFETY: termios is plain data; tcgetattr fills it before it is read.
    let mut saved: libc::termios = unsafe { std::mem::zeroed() };
    // SAFETY: `saved` is a valid termios to write into.
    if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
        return Err(KeyboardError::Setup(io::Error::last_os_error()));
    }

    let mut raw = saved;
    raw.c_lflag &= !(libc::ICANON | libc::ECHO);
    raw.c_cc[libc::VMIN] = 1;
    raw.c_cc[libc::VTIME] = 0;
    // SAFETY: `raw` is a fully initialised termios.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
        return Err(KeyboardError::Setup(io::Error::last_os_error()));
    }
    Ok(saved)
}

/// Takes one key off the front of `pending`.
///
/// Recognises `ESC [ A`..`ESC [ D` as arrow keys and byte `0x03` as Ctrl-C;
/// every other byte is delivered as a character.
pub fn parse_key(pending: &mut VecDeque<u8>) -> Option<KeyPress> {
    let first = pending.pop_front()?;
    match first {
        CTRL_C => Some(KeyPress::Interrupt),
        ESC if pending.front() == Some(&b'[') => {
            let arrow = match pending.get(1) {
                Some(b'A') => Some(Command::Up),
                Some(b'B') => Some(Command::Down),
                Some(b'C') => Some(Command::Right),
                Some(b'D') => Some(Command::Left),
                _ => None,
            };
            match arrow {
                Some(command) => {
                    pending.drain(..2);
                    Some(KeyPress::Arrow(command))
                }
                None => Some(KeyPress::Char(char::from(first))),
            }
        }
        byte => Some(KeyPress::Char(char::from(byte))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
