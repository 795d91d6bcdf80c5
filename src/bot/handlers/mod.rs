//! Handler families.
//!
//! Each module owns the callbacks of one router family and, where the family
//! collects typed input, the message handler for its waiting states.

pub mod admin;
pub mod admin_orders;
pub mod admin_products;
pub mod admin_support;
pub mod cart;
pub mod catalog;
pub mod menu;
pub mod orders;
pub mod payment;
pub mod support;

use crate::{core::token::Action, errors::Result};

/// Called when the router hands a family an action it does not own.
pub(crate) fn misrouted(family: &str, action: &Action) -> Result<()> {
    tracing::warn!(family, %action, "Action routed to the wrong family");
    Ok(())
}
