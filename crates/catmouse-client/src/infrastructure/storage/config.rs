//! TOML configuration for the controller client.
//!
//! The client has no command-line flags, so everything that may differ
//! between setups (adapter, timeouts, log level) lives in an optional
//! `catmouse.toml`:
//!
//! ```toml
//! [bus]
//! backend = "socketcan"   # or "loopback" to run without hardware
//! interface = "can0"
//! channel = 0
//! bitrate = 500000
//!
//! [timing]
//! receive_timeout_ms = 100
//! key_poll_timeout_ms = 100
//! input_tick_ms = 10
//! settle_ms = 500
//! join_timeout_ms = 1000
//!
//! [logging]
//! log_level = "warn"
//! ```
//!
//! # Where is the file?
//!
//! 1. The path in the `CATMOUSE_CONFIG` environment variable, if set.
//! 2. Otherwise `catmouse.toml` in the working directory.
//!
//! A missing file is not an error: every field has a default, applied with
//! `#[serde(default = "...")]`, so a partial file only needs the values
//! that differ.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::bus::BusConfig;
use crate::application::session::SessionTiming;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CATMOUSE_CONFIG";

/// File name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "catmouse.toml";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default)]
    pub bus: BusSection,
    #[serde(default)]
    pub timing: TimingSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Which [`CanBus`](crate::application::bus::CanBus) implementation to open.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BusBackend {
    /// Linux SocketCAN interface.
    #[default]
    SocketCan,
    /// In-memory bus; nothing leaves the process.
    Loopback,
}

/// CAN adapter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusSection {
    #[serde(default)]
    pub backend: BusBackend,
    /// SocketCAN interface name.
    #[serde(default = "default_interface")]
    pub interface: String,
    #[serde(default)]
    pub channel: u8,
    /// Nominal bitrate in bit/s.  Shown in the banner; the interface itself
    /// is configured with `ip link`.
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
}

/// Timeouts and intervals, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingSection {
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,
    #[serde(default = "default_key_poll_timeout_ms")]
    pub key_poll_timeout_ms: u64,
    #[serde(default = "default_input_tick_ms")]
    pub input_tick_ms: u64,
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

/// Diagnostics settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSection {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Default value functions ───────────────────────────────────────────────────

fn default_interface() -> String {
    "can0".to_string()
}

fn default_bitrate() -> u32 {
    500_000
}

fn default_receive_timeout_ms() -> u64 {
    100
}

fn default_key_poll_timeout_ms() -> u64 {
    100
}

fn default_input_tick_ms() -> u64 {
    10
}

fn default_settle_ms() -> u64 {
    500
}

fn default_join_timeout_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    // Keeps diagnostics from interleaving with the game display.
    "warn".to_string()
}

impl Default for BusSection {
    fn default() -> Self {
        Self {
            backend: BusBackend::default(),
            interface: default_interface(),
            channel: 0,
            bitrate: default_bitrate(),
        }
    }
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            receive_timeout_ms: default_receive_timeout_ms(),
            key_poll_timeout_ms: default_key_poll_timeout_ms(),
            input_tick_ms: default_input_tick_ms(),
            settle_ms: default_settle_ms(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Adapter settings for the session.
    pub fn bus_config(&self) -> BusConfig {
        BusConfig {
            interface: self.bus.interface.clone(),
            channel: self.bus.channel,
            bitrate: self.bus.bitrate,
        }
    }

    /// Session timeouts and intervals.
    pub fn session_timing(&self) -> SessionTiming {
        let t = &self.timing;
        SessionTiming {
            receive_timeout: Duration::from_millis(t.receive_timeout_ms),
            key_poll_timeout: Duration::from_millis(t.key_poll_timeout_ms),
            input_tick: Duration::from_millis(t.input_tick_ms),
            settle: Duration::from_millis(t.settle_ms),
            join_timeout: Duration::from_millis(t.join_timeout_ms),
        }
    }
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Resolves the config path from the value of [`CONFIG_ENV_VAR`].
pub fn config_path(env_value: Option<OsString>) -> PathBuf {
    env_value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Resolves the config path from the process environment.
pub fn default_config_path() -> PathBuf {
    config_path(std::env::var_os(CONFIG_ENV_VAR))
}

/// Loads configuration from `path`.
///
/// Returns the default configuration if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
/// [`ConfigError::Parse`] if it is not valid TOML for this schema.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
