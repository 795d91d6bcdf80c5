//! User business logic - registration, conversation state and city selection.

use crate::{
    core::state::ConversationState,
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};

/// Identity fields the chat platform reports for a sender
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Platform user id
    pub id: i64,
    /// Platform handle
    pub username: Option<String>,
    /// Name to show
    pub display_name: String,
}

/// Returns the user for `profile`, creating it in [`ConversationState::MainMenu`]
/// on first contact. Existing users get their names, admin mirror flag and
/// `last_activity` refreshed.
pub async fn get_or_create_user(
    db: &DatabaseConnection,
    profile: &Profile,
    is_admin: bool,
) -> Result<user::Model> {
    let now = chrono::Utc::now();

    if let Some(existing) = User::find_by_id(profile.id).one(db).await? {
        let mut active: user::ActiveModel = existing.into();
        active.username = Set(profile.username.clone());
        active.display_name = Set(profile.display_name.clone());
        active.is_admin = Set(is_admin);
        active.last_activity = Set(now);
        return active.update(db).await.map_err(Into::into);
    }

    tracing::info!(user_id = profile.id, "Registering new user");
    let model = user::ActiveModel {
        id: Set(profile.id),
        username: Set(profile.username.clone()),
        display_name: Set(profile.display_name.clone()),
        city: Set(None),
        state: Set(ConversationState::MainMenu),
        is_admin: Set(is_admin),
        created_at: Set(now),
        last_activity: Set(now),
    };
    model.insert(db).await.map_err(Into::into)
}

/// Looks a user up by platform id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Moves a user to `state`.
///
/// # Errors
/// Returns [`Error::UserNotFound`] if no such user exists.
pub async fn set_state(
    db: &DatabaseConnection,
    user_id: i64,
    state: ConversationState,
) -> Result<()> {
    let result = User::update_many()
        .col_expr(user::Column::State, Expr::value(state))
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::UserNotFound { id: user_id });
    }
    Ok(())
}

/// Stores the city a user's catalog is scoped to.
///
/// # Errors
/// Returns an error if the city is blank or the user does not exist.
pub async fn set_city(db: &DatabaseConnection, user_id: i64, city: &str) -> Result<user::Model> {
    let city = city.trim();
    if city.is_empty() {
        return Err(Error::invalid_input("City cannot be empty"));
    }

    let mut active: user::ActiveModel = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?
        .into();
    active.city = Set(Some(city.to_string()));
    active.update(db).await.map_err(Into::into)
}

/// Number of registered users.
pub async fn count_users(db: &DatabaseConnection) -> Result<u64> {
    User::find().count(db).await.map_err(Into::into)
}

/// The `limit` most recently active users.
pub async fn recently_active_users(
    db: &DatabaseConnection,
    limit: u64,
) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_desc(user::Column::LastActivity)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_first_contact_creates_user_in_main_menu() -> Result<()> {
        let db = setup_test_db().await?;

        let user = get_or_create_user(&db, &test_profile(42), false).await?;
        assert_eq!(user.id, 42);
        assert_eq!(user.state, ConversationState::MainMenu);
        assert_eq!(user.city, None);
        assert!(!user.is_admin);
        assert_eq!(count_users(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_returning_user_is_refreshed_not_duplicated() -> Result<()> {
        let db = setup_test_db().await?;
        get_or_create_user(&db, &test_profile(42), false).await?;
        set_state(&db, 42, ConversationState::Cart).await?;

        let renamed = Profile {
            display_name: "Renamed".to_string(),
            ..test_profile(42)
        };
        let user = get_or_create_user(&db, &renamed, true).await?;

        assert_eq!(user.display_name, "Renamed");
        assert!(user.is_admin);
        assert_eq!(user.state, ConversationState::Cart);
        assert_eq!(count_users(&db).await?, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_state_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = set_state(&db, 7, ConversationState::Cart).await;
        assert!(matches!(result.unwrap_err(), Error::UserNotFound { id: 7 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_city() -> Result<()> {
        let db = setup_test_db().await?;
        get_or_create_user(&db, &test_profile(1), false).await?;

        let user = set_city(&db, 1, " Moscow ").await?;
        assert_eq!(user.city.as_deref(), Some("Moscow"));

        let result = set_city(&db, 1, "  ").await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_recently_active_users() -> Result<()> {
        let db = setup_test_db().await?;
        for id in 1..=3 {
            get_or_create_user(&db, &test_profile(id), false).await?;
        }
        get_or_create_user(&db, &test_profile(1), false).await?;

        let users = recently_active_users(&db, 2).await?;
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, 1);

        Ok(())
    }
}
