//! Unified error type for the storefront.
//!
//! Variants fall into the categories the router cares about: validation and
//! not-found errors are shown to the user, authorization failures are audited,
//! and everything else is logged and the event dropped.

use crate::entities::OrderStatus;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Invalid amount: {input}")]
    InvalidAmount { input: String },

    #[error("Unit size {size} is not offered for product {product_id}")]
    UnknownUnitSize { product_id: i64, size: Decimal },

    #[error("Not enough stock: {available} left, {requested} requested")]
    InsufficientStock { available: i32, requested: i32 },

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Order cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Product not found: {id}")]
    ProductNotFound { id: i64 },

    #[error("Order not found: {id}")]
    OrderNotFound { id: i64 },

    #[error("Access denied for user {user_id}: {action}")]
    AccessDenied { user_id: i64, action: String },

    #[error("Message delivery failed: {message}")]
    Delivery { message: String },

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Whether the error describes something the user did (bad input, a
    /// missing record, an empty cart) and can be shown to them as-is.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::InvalidAmount { .. }
                | Self::UnknownUnitSize { .. }
                | Self::InsufficientStock { .. }
                | Self::EmptyCart
                | Self::InvalidStatusTransition { .. }
                | Self::UserNotFound { .. }
                | Self::ProductNotFound { .. }
                | Self::OrderNotFound { .. }
        )
    }

    /// Whether the error is a missing record.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UserNotFound { .. } | Self::ProductNotFound { .. } | Self::OrderNotFound { .. }
        )
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
