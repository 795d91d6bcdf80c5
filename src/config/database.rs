//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Parent tables are created before the
//! tables that reference them.

use crate::entities::{
    AuditEntry, CartItem, CartItemColumn, Order, OrderItem, Product, SupportMessage,
    SupportMessageColumn, User,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop_buddy.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(&get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates all tables (if missing) plus the unique index that keeps one cart
/// line per (user, product, unit size).
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(CartItem),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(OrderItem),
        schema.create_table_from_entity(SupportMessage),
        schema.create_table_from_entity(AuditEntry),
    ];
    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    let cart_line_index = Index::create()
        .name("idx_cart_items_line")
        .table(CartItem)
        .col(CartItemColumn::UserId)
        .col(CartItemColumn::ProductId)
        .col(CartItemColumn::UnitSize)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&cart_line_index)).await?;

    let support_thread_index = Index::create()
        .name("idx_support_messages_order")
        .table(SupportMessage)
        .col(SupportMessageColumn::OrderId)
        .col(SupportMessageColumn::ClientId)
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&support_thread_index)).await?;

    Ok(())
}
