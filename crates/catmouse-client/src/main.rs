//! Cat & Mouse CAN controller entry point.
//!
//! Wires together configuration, logging, role selection, the Ctrl-C
//! handler, and the session controller.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load catmouse.toml (or defaults)
//!  └─ tracing subscriber → stderr
//!  └─ select_role()                -- blocking stdin, spawn_blocking
//!  └─ ctrl_c handler               -- sets the stop latch (Interrupted)
//!  └─ SessionController::run()     -- blocking, spawn_blocking
//!       ├─ receiver thread "catmouse-rx"
//!       └─ input loop
//! ```
//!
//! # Why tokio here?
//!
//! The game loops are plain threads; the runtime is only used for the
//! SIGINT handler.  Both blocking phases run under `spawn_blocking` so the
//! signal task keeps running while they wait on the terminal.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use catmouse_client::application::{
    console::Console,
    select_role::{select_role, RolePromptError},
    send_commands::{KeySource, KeyboardError},
    session::{SessionController, SessionError},
    stop_signal::StopReason,
};
use catmouse_client::infrastructure::{
    bus::{open_socketcan, LoopbackBus},
    storage::config::{default_config_path, load_config, BusBackend, ClientConfig},
};
use catmouse_core::Role;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Configuration first: it carries the default log level.
    let config_path = default_config_path();
    let (config, config_error) = match load_config(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (ClientConfig::default(), Some(e)),
    };

    // Initialise structured logging on stderr; stdout belongs to the game.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    if let Some(e) = config_error {
        warn!(path = %config_path.display(), "{e}; using default configuration");
    }
    info!(backend = ?config.bus.backend, interface = %config.bus.interface, "Cat & Mouse controller starting");

    let console = Console::stdout();

    // ── Role selection ────────────────────────────────────────────────────────
    let role = {
        let console = console.clone();
        tokio::task::spawn_blocking(move || read_role(&console))
            .await
            .context("role selection task failed")?
    };
    let role = match role {
        Ok(role) => role,
        Err(RolePromptError::InputClosed) => {
            info!("input closed before a role was chosen");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(e).context("role selection failed"),
    };

    let controller = SessionController::new(
        role,
        config.bus_config(),
        config.session_timing(),
        console,
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let stop = controller.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            stop.stop(StopReason::Interrupted);
        }
    });

    // ── Session ───────────────────────────────────────────────────────────────
    let backend = config.bus.backend;
    let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let mut keys = open_keys().context("failed to set up keyboard input")?;
        let result = match backend {
            BusBackend::SocketCan => controller.run(open_socketcan, keys.as_mut()),
            BusBackend::Loopback => controller.run(LoopbackBus::open, keys.as_mut()),
        };
        Ok(result)
    })
    .await
    .context("session task failed")??;

    match outcome {
        Ok(report) => {
            info!(reason = ?report.stop_reason, "exiting");
            Ok(ExitCode::SUCCESS)
        }
        Err(SessionError::Open(_)) => Ok(ExitCode::FAILURE),
        Err(e) => Err(e.into()),
    }
}

/// Reads the role answer without taking bytes meant for the key source.
#[cfg(unix)]
fn read_role(console: &Console) -> Result<Role, RolePromptError> {
    use catmouse_client::infrastructure::keyboard::stdin_lines;

    select_role(&mut stdin_lines(), console)
}

#[cfg(not(unix))]
fn read_role(console: &Console) -> Result<Role, RolePromptError> {
    select_role(&mut io::stdin().lock(), console)
}

#[cfg(unix)]
fn open_keys() -> Result<Box<dyn KeySource + Send>, KeyboardError> {
    use catmouse_client::infrastructure::keyboard::TerminalKeys;

    Ok(Box::new(TerminalKeys::stdin()?))
}

#[cfg(not(unix))]
fn open_keys() -> Result<Box<dyn KeySource + Send>, KeyboardError> {
    Err(KeyboardError::Unsupported)
}
