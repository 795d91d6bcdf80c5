//! Main menu, profile and city selection.

use crate::{
    bot::{messenger::Messenger, router::Turn, views},
    core::{catalog, order, state::ConversationState, token::Action, user},
    errors::{Error, Result},
};

/// Largest order count shown on the profile.
const PROFILE_ORDER_LIMIT: u64 = 100;

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::MainMenu => main_menu(turn).await,
        Action::ShowProfile => profile(turn).await,
        Action::ChangeCity => prompt_city(turn).await,
        Action::SelectCity(city) => select_city(turn, &city).await,
        other => super::misrouted("menu", &other),
    }
}

/// `/start`: forgets any flow in progress and shows the menu, or asks for a
/// city first.
pub async fn start<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    turn.data.scratch.clear(turn.user.id);
    if turn.user.city.is_none() {
        return prompt_city(turn).await;
    }
    main_menu(turn).await
}

pub async fn main_menu<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    turn.data.scratch.clear(turn.user.id);
    turn.set_state(ConversationState::MainMenu).await?;
    turn.reply(views::main_menu(&turn.user, turn.is_admin())).await
}

pub async fn prompt_city<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    let cities = catalog::available_cities(turn.db(), &turn.data.config.cities).await?;
    turn.set_state(ConversationState::SelectingCity).await?;
    turn.reply(views::city_prompt(&cities)).await
}

async fn select_city<M: Messenger>(turn: &mut Turn<'_, M>, city: &str) -> Result<()> {
    let cities = catalog::available_cities(turn.db(), &turn.data.config.cities).await?;
    if !cities.iter().any(|known| known == city) {
        return Err(Error::invalid_input(format!("Unknown city: {city}")));
    }

    turn.user = user::set_city(turn.db(), turn.user.id, city).await?;
    tracing::info!(user_id = turn.user.id, city, "City selected");
    main_menu(turn).await
}

async fn profile<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    let orders = order::user_orders(turn.db(), turn.user.id, PROFILE_ORDER_LIMIT).await?;
    turn.set_state(ConversationState::Profile).await?;
    turn.reply(views::profile(&turn.user, orders.len())).await
}
