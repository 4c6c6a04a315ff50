//! Operator-facing text output.
//!
//! Everything the operator reads (banner, prompts, confirmation lines, the
//! game-over banner) goes through a [`Console`].  Diagnostics go through
//! `tracing` instead, so the two streams never have to share a format.
//!
//! Both loops print from different threads; the writer sits behind a mutex
//! so a line is never interleaved with another one.  The receive and send
//! lines start with `\r` to overwrite the pending prompt, then the prompt is
//! printed again.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use catmouse_core::{protocol::arbitration_id, CanFrame, Command, Role};
use tracing::debug;

use crate::application::bus::BusConfig;

/// Shared, line-oriented writer for operator output.
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    /// Console writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Console writing to any sink.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Console writing into memory, plus a handle to read back what was written.
    pub fn capture() -> (Self, CapturedOutput) {
        let captured = CapturedOutput::default();
        (Self::new(captured.clone()), captured)
    }

    /// Writes `text` without a trailing newline and flushes.
    pub fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        let result = out.write_all(text.as_bytes());
        if let Err(e) = result.and_then(|()| out.flush()) {
            debug!("console write failed: {e}");
        }
    }

    /// Writes `text` followed by a newline.
    pub fn line(&self, text: &str) {
        self.write(&format!("{text}\n"));
    }

    /// The startup banner: role, identifier, bitrate, and key bindings.
    pub fn banner(&self, role: Role, bus: &BusConfig) {
        let mut text = String::from("\n=== CAN Bus Game Controller ===\n");
        text.push_str(&format!("Player: {role}\n"));
        text.push_str(&format!("Command ID: {}\n", arbitration_id(role)));
        text.push_str(&format!(
            "Interface: {} (channel {})\n",
            bus.interface, bus.channel
        ));
        text.push_str(&format!("Bitrate: {} kbps\n", bus.bitrate / 1000));
        text.push_str("\nControls:\n");
        for command in [Command::Up, Command::Left, Command::Down, Command::Right] {
            text.push_str(&format!(
                "  {} (Data: {}) - Move {}\n",
                command.key().to_ascii_uppercase(),
                command.code(),
                title_case(command.label()),
            ));
        }
        text.push_str("  Arrow keys also move\n");
        text.push_str("  Q - Quit\n");
        self.line(&text);
    }

    /// The input prompt, re-printed after every status line.
    pub fn prompt(&self, role: Role) {
        self.write(&format!("[{role}] Press W/A/S/D to move, Q to quit: "));
    }

    /// Confirmation of a transmitted command.
    pub fn sent(&self, role: Role, command: Command) {
        self.line(&format!("\r[{}] → [{role}] {}", clock_hms(SystemTime::now()), command.label()));
        self.prompt(role);
    }

    /// A received frame that carries no game meaning.
    pub fn received(&self, role: Role, frame: &CanFrame) {
        self.line(&format!("\r[{}] ← CAN RX - {frame}", clock_hms(SystemTime::now())));
        self.prompt(role);
    }

    /// The terminal banner shown when the controller reports a catch.
    pub fn game_over(&self) {
        self.line("\r\n=======================================================");
        self.line("!!! GAME OVER: CAT CATCHES MOUSE !!!");
        self.line("=======================================================\n");
    }
}

/// In-memory sink returned by [`Console::capture`].
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Formats a wall-clock instant as local `HH:MM:SS`.
///
/// Falls back to UTC where the local offset is unknown.
pub fn clock_hms(now: SystemTime) -> String {
    let secs = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    match local_hms(secs) {
        Some((h, m, s)) => format!("{h:02}:{m:02}:{s:02}"),
        None => utc_hms(secs),
    }
}

#[cfg(unix)]
fn local_hms(secs: u64) -> Option<(i32, i32, i32)> {
    let t = libc::time_t::try_from(secs).ok()?;
    // SAFETY: tm is plain data; localtime_r fills it before it is read.
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    // SAFETY: both pointers are valid for the duration of the call.
    if unsafe { libc::localtime_r(&t, &mut tm) }.is_null() {
        return None;
    }
    Some((tm.tm_hour, tm.tm_min, tm.tm_sec))
}

#[cfg(not(unix))]
fn local_hms(_secs: u64) -> Option<(i32, i32, i32)> {
    None
}

fn utc_hms(secs: u64) -> String {
    let of_day = secs % 86_400;
    format!(
        "{:02}:{:02}:{:02}",
        of_day / 3600,
        (of_day % 3600) / 60,
        of_day % 60
    )
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
