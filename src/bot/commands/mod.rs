//! Slash commands. Everything else arrives as plain messages and buttons.

/// Start, ping and help
pub mod general;

pub use general::*;
