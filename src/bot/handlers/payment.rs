//! Payment confirmation.
//!
//! Reporting payment does not change the order status; an admin confirms it.
//! It does settle the cart: the reserved units count as sold from here on.
//! An order whose units are no longer in the cart cannot be reported paid.

use crate::{
    bot::{messenger::Messenger, router::Turn, views},
    core::{cart, order, state::ConversationState, token::Action},
    entities::{OrderStatus, order as order_entity},
    errors::{Error, Result},
};
use tracing::info;

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::ConfirmPayment(order_id) => {
            let order = order::require_user_order(turn.db(), turn.user.id, order_id).await?;
            confirm(turn, order).await
        }
        Action::Paid => on_text(turn).await,
        other => super::misrouted("payment", &other),
    }
}

/// "paid" without an order id: the user's newest pending order.
pub async fn on_text<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    let order = order::latest_pending_order(turn.db(), turn.user.id)
        .await?
        .ok_or_else(|| Error::invalid_input("You have no order awaiting payment"))?;
    confirm(turn, order).await
}

async fn confirm<M: Messenger>(turn: &mut Turn<'_, M>, order: order_entity::Model) -> Result<()> {
    if order.status != OrderStatus::Pending {
        return Err(Error::invalid_input(format!(
            "Order #{} is already {}",
            order.id, order.status
        )));
    }

    let details = order::order_details(turn.db(), order.id).await?;
    let lines = cart::cart_lines(turn.db(), turn.user.id).await?;
    if !details.is_reserved_by(&lines) {
        return Err(Error::invalid_input(format!(
            "Order #{} no longer matches your cart. Cancel it and check out again.",
            order.id
        )));
    }
    cart::clear_sold_cart(turn.db(), turn.user.id).await?;
    turn.set_state(ConversationState::MainMenu).await?;
    turn.reply(views::payment_received(&order)).await?;

    let alert = views::admin_payment_alert(&details, &turn.user, turn.currency());
    let reached = turn.notify_admins(&alert).await;
    info!(
        order_id = order.id,
        user_id = turn.user.id,
        admins = reached,
        "Payment reported"
    );
    Ok(())
}
