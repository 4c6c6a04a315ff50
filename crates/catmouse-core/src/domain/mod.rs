//! Domain entities for the Cat & Mouse controller.
//!
//! This module contains pure game rules with no infrastructure dependencies:
//! which roles exist, which movement commands exist, and which keys select
//! them.  Wire identifiers and byte layouts live in [`crate::protocol`].

/// Movement commands and their keyboard bindings.
pub mod command;

/// Player roles and the interactive role-selection rule.
pub mod role;
