//! Bot layer - conversation router, handlers and the Discord interface
//!
//! Inbound chat traffic is translated into [`messenger::Event`]s and fed to
//! [`router::dispatch`]. Handlers speak through the [`messenger::Messenger`]
//! trait, so everything above the Discord adapter runs against a recording
//! fake in tests.

/// Slash commands (start, ping, help)
pub mod commands;
/// Discord adapter: event translation, component buttons, run loop
pub mod discord;
/// Handler families the router dispatches to
pub mod handlers;
/// Transport-neutral event and message shapes
pub mod messenger;
/// Ordered route tables and event dispatch
pub mod router;
/// Message texts and keyboards
pub mod views;

use crate::{
    config::{admins::AdminRegistry, settings::Config},
    core::scratch::ScratchStore,
};
use sea_orm::DatabaseConnection;

/// Shared data available to every event handler and command.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Allowlist consulted on every admin action
    pub admins: AdminRegistry,
    /// In-flight multi-step flows
    pub scratch: ScratchStore,
    /// Shop settings from `config.toml`
    pub config: Config,
}

impl BotData {
    /// Creates the shared context with an empty scratch store.
    #[must_use]
    pub fn new(database: DatabaseConnection, admins: AdminRegistry, config: Config) -> Self {
        Self {
            database,
            admins,
            scratch: ScratchStore::new(),
            config,
        }
    }
}

pub use commands::*;
