//! Shared test utilities for `ShopBuddy`.
//!
//! Helpers for in-memory databases, seeded users/products/orders, and a
//! recording [`Messenger`] that lets router tests inspect what the bot sent.

use crate::{
    bot::{
        BotData,
        messenger::{Event, Messenger, Outbound, Payload},
    },
    config::{admins::AdminRegistry, settings::Config},
    core::{
        cart,
        catalog::{self, NewProduct},
        order,
        price_table::PriceTable,
        user::{self, Profile},
    },
    entities,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Platform profile for a test user.
pub fn test_profile(id: i64) -> Profile {
    Profile {
        id,
        username: Some(format!("user{id}")),
        display_name: format!("User {id}"),
    }
}

/// Product input with sensible defaults.
///
/// # Defaults
/// * stock: 5
/// * prices: size 1 for 100, size 2 for 180
pub fn new_product(name: &str, category: &str, city: &str) -> NewProduct {
    let mut prices = PriceTable::single(Decimal::from(100));
    prices
        .insert(Decimal::TWO, Decimal::from(180))
        .unwrap_or_default();
    NewProduct {
        name: name.to_string(),
        description: format!("{name} description"),
        stock: 5,
        category: category.to_string(),
        city: city.to_string(),
        prices,
        image_url: None,
    }
}

/// Registers a user living in `city`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    id: i64,
    city: &str,
) -> Result<entities::user::Model> {
    user::get_or_create_user(db, &test_profile(id), false).await?;
    user::set_city(db, id, city).await
}

/// Sets up a client (id 100, Moscow) and a "Widget" sold in Moscow.
/// Returns (db, user, product).
pub async fn setup_with_product() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::product::Model,
)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, 100, "Moscow").await?;
    let product = catalog::create_product(&db, new_product("Widget", "tea", "Moscow")).await?;
    Ok((db, user, product))
}

/// Like [`setup_with_product`], plus a pending order for one unit of size 1.
/// Returns (db, user, order); the order total is 100.
pub async fn setup_with_order() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::order::Model,
)> {
    let (db, user, product) = setup_with_product().await?;
    cart::add_to_cart(&db, user.id, product.id, Decimal::ONE, 1).await?;
    let details = order::create_order_from_cart(&db, user.id, "Main street 1").await?;
    Ok((db, user, details.order))
}

/// Bot state over a fresh database with the given admins and default config.
pub async fn setup_test_bot(admins: &[i64]) -> Result<BotData> {
    let db = setup_test_db().await?;
    Ok(BotData::new(
        db,
        AdminRegistry::new(admins.iter().copied()),
        Config::default(),
    ))
}

/// A text message from `user_id` in their private chat.
pub fn text_event(user_id: i64, text: &str) -> Event {
    Event {
        sender: test_profile(user_id),
        chat_id: user_id,
        payload: Payload::Text(text.to_string()),
    }
}

/// A button press from `user_id`.
pub fn callback_event(user_id: i64, token: &str) -> Event {
    Event {
        sender: test_profile(user_id),
        chat_id: user_id,
        payload: Payload::Callback(token.to_string()),
    }
}

/// A photo from `user_id`.
pub fn photo_event(user_id: i64, photo: &str, caption: Option<&str>) -> Event {
    Event {
        sender: test_profile(user_id),
        chat_id: user_id,
        payload: Payload::Photo {
            photo: photo.to_string(),
            caption: caption.map(ToString::to_string),
        },
    }
}

/// Messenger that records everything instead of sending it
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    replies: Mutex<Vec<(i64, Outbound)>>,
    notifications: Mutex<Vec<(i64, Outbound)>>,
    acks: Mutex<Vec<Option<String>>>,
    unreachable: HashSet<i64>,
    reject_photos: bool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications to any of `user_ids` fail.
    #[must_use]
    pub fn with_unreachable(mut self, user_ids: &[i64]) -> Self {
        self.unreachable.extend(user_ids);
        self
    }

    /// Every message carrying a photo fails.
    #[must_use]
    pub const fn rejecting_photos(mut self) -> Self {
        self.reject_photos = true;
        self
    }

    pub fn replies(&self) -> Vec<(i64, Outbound)> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_reply(&self) -> Option<Outbound> {
        self.replies().pop().map(|(_, message)| message)
    }

    pub fn notifications(&self) -> Vec<(i64, Outbound)> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn notifications_to(&self, user_id: i64) -> Vec<Outbound> {
        self.notifications()
            .into_iter()
            .filter(|(recipient, _)| *recipient == user_id)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn acks(&self) -> Vec<Option<String>> {
        self.acks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets everything recorded so far.
    pub fn reset(&self) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.acks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn check_photo(&self, message: &Outbound) -> Result<()> {
        if self.reject_photos && message.photo.is_some() {
            return Err(Error::Delivery {
                message: "photo rejected".to_string(),
            });
        }
        Ok(())
    }
}

impl Messenger for RecordingMessenger {
    async fn reply(&self, chat_id: i64, message: Outbound) -> Result<()> {
        self.check_photo(&message)?;
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((chat_id, message));
        Ok(())
    }

    async fn notify(&self, user_id: i64, message: Outbound) -> Result<()> {
        if self.unreachable.contains(&user_id) {
            return Err(Error::Delivery {
                message: format!("user {user_id} is unreachable"),
            });
        }
        self.check_photo(&message)?;
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user_id, message));
        Ok(())
    }

    async fn acknowledge(&self, notice: Option<&str>) -> Result<()> {
        let mut acks = self.acks.lock().unwrap_or_else(PoisonError::into_inner);
        // Mirrors the platform: only the first acknowledgement counts.
        if acks.is_empty() {
            acks.push(notice.map(ToString::to_string));
        }
        Ok(())
    }
}
