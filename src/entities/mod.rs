//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod audit_entry;
pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;
pub mod support_message;
pub mod user;

// Re-export specific types to avoid conflicts
pub use audit_entry::{
    Column as AuditEntryColumn, Entity as AuditEntry, Model as AuditEntryModel,
};
pub use cart_item::{Column as CartItemColumn, Entity as CartItem, Model as CartItemModel};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use support_message::{
    Column as SupportMessageColumn, Entity as SupportMessage, Model as SupportMessageModel,
    SenderKind,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
