//! Interactive role selection.
//!
//! The only operation in the client that retries: the menu is answered with
//! `1` or `2`, anything else prints a hint and asks again.  Invalid answers
//! have no other side effect.

use std::io::{self, BufRead};

use catmouse_core::{protocol::arbitration_id, Role};
use thiserror::Error;
use tracing::debug;

use crate::application::console::Console;

/// Errors that end role selection without a choice.
#[derive(Debug, Error)]
pub enum RolePromptError {
    /// Standard input reached end-of-file before a valid answer.
    #[error("input closed before a role was chosen")]
    InputClosed,

    /// Reading standard input failed.
    #[error("failed to read role selection: {0}")]
    Io(#[from] io::Error),
}

/// Shows the role menu and reads answers from `input` until one is valid.
///
/// # Errors
///
/// Returns [`RolePromptError`] if `input` ends or fails; invalid answers are
/// never errors.
pub fn select_role<R: BufRead>(input: &mut R, console: &Console) -> Result<Role, RolePromptError> {
    console.line("\n=== CAT AND MOUSE GAME (CAN Protocol v1.0) ===");
    console.line("Choose your player:");
    for role in Role::ALL {
        console.line(&format!(
            "{} - {role} - Command ID: {}",
            role.menu_choice(),
            arbitration_id(role)
        ));
    }

    let mut answer = String::new();
    loop {
        console.write("Choose (1 or 2): ");
        answer.clear();
        if input.read_line(&mut answer)? == 0 {
            return Err(RolePromptError::InputClosed);
        }

        match Role::from_selection(&answer) {
            Ok(role) => {
                console.line(&format!(
                    "\n✓ You chose: {role} (Command ID: {})",
                    arbitration_id(role)
                ));
                return Ok(role);
            }
            Err(e) => {
                debug!("{e}");
                console.line("Invalid option. Choose 1 or 2.");
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
