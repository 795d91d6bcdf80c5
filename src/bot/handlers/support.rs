//! Client side of support: choosing a thread, writing, reading history.

use crate::{
    bot::{
        messenger::{Button, Messenger, Outbound, Payload},
        router::Turn,
        views,
    },
    core::{
        order,
        state::ConversationState,
        support::{self, MessageBody, ThreadId},
        token::Action,
    },
    entities::support_message::GENERAL_THREAD,
    errors::Result,
};

/// Recent orders offered as support topics.
const SUPPORT_ORDER_LIMIT: u64 = 5;

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::SupportStart => start(turn).await,
        Action::SupportOrder(order_id) => open_thread(turn, order_id).await,
        Action::SupportHistory(order_id) => history(turn, order_id).await,
        other => super::misrouted("support", &other),
    }
}

async fn start<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    let orders = order::open_user_orders(turn.db(), turn.user.id, SUPPORT_ORDER_LIMIT).await?;
    turn.set_state(ConversationState::MainMenu).await?;
    turn.reply(views::support_targets(&orders, turn.currency()))
        .await
}

/// Thread of the sender about `order_id`, checking the order is theirs.
async fn own_thread<M: Messenger>(turn: &Turn<'_, M>, order_id: i64) -> Result<ThreadId> {
    if order_id != GENERAL_THREAD {
        order::require_user_order(turn.db(), turn.user.id, order_id).await?;
    }
    Ok(ThreadId {
        order_id,
        client_id: turn.user.id,
    })
}

async fn open_thread<M: Messenger>(turn: &mut Turn<'_, M>, order_id: i64) -> Result<()> {
    let thread = own_thread(turn, order_id).await?;
    support::mark_read_by_client(turn.db(), thread).await?;
    turn.data.scratch.update(turn.user.id, |scratch| {
        scratch.support_order = Some(order_id);
    });
    turn.set_state(ConversationState::WaitingForSupportMessage)
        .await?;
    turn.reply(views::support_prompt(order_id)).await
}

async fn history<M: Messenger>(turn: &mut Turn<'_, M>, order_id: i64) -> Result<()> {
    let thread = own_thread(turn, order_id).await?;
    let messages = support::thread_messages(turn.db(), thread).await?;
    support::mark_read_by_client(turn.db(), thread).await?;

    let chunks = support::split_for_budget(
        &support::format_thread(&messages),
        turn.data.config.shop.history_budget,
    );
    let navigation = vec![
        Button::new("✍️ Write", &Action::SupportOrder(order_id)),
        Button::new("🏠 Main menu", &Action::MainMenu),
    ];
    turn.reply_all(views::history(chunks, navigation)).await
}

/// Text or photo written while in a support thread.
pub async fn on_message<M: Messenger>(turn: &mut Turn<'_, M>, payload: &Payload) -> Result<()> {
    let order_id = turn
        .data
        .scratch
        .get(turn.user.id)
        .support_order
        .unwrap_or(GENERAL_THREAD);
    let thread = own_thread(turn, order_id).await?;
    let body = MessageBody {
        text: payload.text().map(ToString::to_string),
        photo: payload.photo().map(ToString::to_string),
    };
    let saved = support::save_client_message(turn.db(), thread, body).await?;

    turn.reply(
        Outbound::text("✅ Message sent. Support will answer here.")
            .button("🏠 Main menu", &Action::MainMenu),
    )
    .await?;

    let alert = views::admin_support_alert(
        &turn.user,
        order_id,
        saved.text.as_deref(),
        saved.photo.clone(),
    );
    let reached = turn.notify_admins(&alert).await;
    tracing::info!(
        order_id,
        user_id = turn.user.id,
        admins = reached,
        "Support message received"
    );
    Ok(())
}
