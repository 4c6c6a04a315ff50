//! Player roles.
//!
//! A session is played as exactly one [`Role`], chosen once at startup from a
//! two-entry menu.  The role never changes afterwards; it decides which
//! arbitration identifier every outbound command carries (see
//! [`crate::protocol::codec::arbitration_id`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when the operator's menu choice is not one of the two roles.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid role selection {input:?}: choose 1 or 2")]
pub struct RoleSelectionError {
    /// The trimmed text the operator entered.
    pub input: String,
}

/// The player identity for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Menu choice `1`.
    Cat,
    /// Menu choice `2`.
    Mouse,
}

impl Role {
    /// Every role, in menu order.
    pub const ALL: [Role; 2] = [Role::Cat, Role::Mouse];

    /// Parses a role-selection answer.
    ///
    /// Only `"1"` (Cat) and `"2"` (Mouse) are accepted; surrounding
    /// whitespace, including the trailing newline of a terminal line, is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RoleSelectionError`] for anything else.  Callers re-prompt;
    /// this is never fatal.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use catmouse_core::Role;
    ///
    /// assert_eq!(Role::from_selection("1\n"), Ok(Role::Cat));
    /// assert_eq!(Role::from_selection(" 2 "), Ok(Role::Mouse));
    /// assert!(Role::from_selection("cat").is_err());
    /// ```
    pub fn from_selection(input: &str) -> Result<Role, RoleSelectionError> {
        match input.trim() {
            "1" => Ok(Role::Cat),
            "2" => Ok(Role::Mouse),
            other => Err(RoleSelectionError {
                input: other.to_string(),
            }),
        }
    }

    /// The menu entry that selects this role.
    pub fn menu_choice(self) -> &'static str {
        match self {
            Role::Cat => "1",
            Role::Mouse => "2",
        }
    }

    /// Display name used in prompts and confirmation lines.
    pub fn name(self) -> &'static str {
        match self {
            Role::Cat => "Cat",
            Role::Mouse => "Mouse",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
