//! Core business logic - framework-agnostic storefront operations.
//!
//! Nothing in here knows about the chat platform. Services take a database
//! connection and return models or typed errors; the bot layer turns those
//! into messages.

/// Audit trail for admin actions and security violations
pub mod audit;
/// Reservation-style cart
pub mod cart;
/// City-scoped catalog and product management
pub mod catalog;
/// Checkout snapshots and the order status pipeline
pub mod order;
/// Unit size → price mapping
pub mod price_table;
/// Per-user scratch state for multi-step flows
pub mod scratch;
/// Conversation states
pub mod state;
/// Admin dashboard figures
pub mod stats;
/// Support threads and read tracking
pub mod support;
/// Callback-token vocabulary
pub mod token;
/// User registration and conversation state persistence
pub mod user;
