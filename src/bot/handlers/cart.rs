//! Cart screen and checkout.

use crate::{
    bot::{messenger::Messenger, router::Turn, views},
    core::{cart, order, state::ConversationState, token::Action},
    errors::{Error, Result},
};

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::ShowCart => show(turn).await,
        Action::ClearCart => {
            let removed = cart::clear_cart(turn.db(), turn.user.id).await?;
            if removed > 0 {
                turn.toast("🗑 Cart cleared").await?;
            }
            show(turn).await
        }
        Action::RemoveCartItem(item_id) => {
            cart::remove_line(turn.db(), turn.user.id, item_id).await?;
            show(turn).await
        }
        Action::Checkout => checkout(turn).await,
        other => super::misrouted("cart", &other),
    }
}

pub async fn show<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    let lines = cart::cart_lines(turn.db(), turn.user.id).await?;
    turn.set_state(ConversationState::Cart).await?;
    turn.reply(views::cart(&lines, turn.currency())).await
}

async fn checkout<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    if cart::cart_lines(turn.db(), turn.user.id).await?.is_empty() {
        return Err(Error::EmptyCart);
    }
    turn.set_state(ConversationState::WaitingForDistrict).await?;
    turn.reply(views::address_prompt()).await
}

/// Address typed during checkout: creates the order and asks for payment.
pub async fn on_address<M: Messenger>(turn: &mut Turn<'_, M>, address: &str) -> Result<()> {
    let details = order::create_order_from_cart(turn.db(), turn.user.id, address).await?;
    turn.set_state(ConversationState::WaitingForPayment).await?;
    turn.reply(views::payment_prompt(
        &details,
        &turn.data.config.shop.payment_details,
        turn.currency(),
    ))
    .await
}
