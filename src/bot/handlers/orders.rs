//! Client order list, details and cancellation.

use crate::{
    bot::{messenger::{Messenger, Outbound}, router::Turn, views},
    core::{
        order,
        state::ConversationState,
        support::{self, ThreadId},
        token::Action,
    },
    errors::Result,
};

/// Orders shown in the client's list.
const ORDER_LIST_LIMIT: u64 = 10;

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::MyOrders => list(turn).await,
        Action::OrderDetails(order_id) => details(turn, order_id).await,
        Action::CancelOrder(order_id) => cancel(turn, order_id).await,
        other => super::misrouted("orders", &other),
    }
}

async fn list<M: Messenger>(turn: &mut Turn<'_, M>) -> Result<()> {
    let orders = order::user_orders(turn.db(), turn.user.id, ORDER_LIST_LIMIT).await?;
    turn.set_state(ConversationState::MainMenu).await?;
    turn.reply(views::order_list(&orders, turn.currency())).await
}

async fn details<M: Messenger>(turn: &mut Turn<'_, M>, order_id: i64) -> Result<()> {
    order::require_user_order(turn.db(), turn.user.id, order_id).await?;
    let details = order::order_details(turn.db(), order_id).await?;
    let thread = ThreadId {
        order_id,
        client_id: turn.user.id,
    };
    let unread = support::has_unread_for_client(turn.db(), thread).await?;
    turn.reply(views::order_details(&details, turn.currency(), unread))
        .await
}

async fn cancel<M: Messenger>(turn: &mut Turn<'_, M>, order_id: i64) -> Result<()> {
    let cancelled = order::cancel_order(turn.db(), turn.user.id, order_id).await?;
    turn.set_state(ConversationState::MainMenu).await?;
    turn.reply(views::status_notice(&cancelled)).await?;

    let notice = Outbound::text(format!(
        "❌ {} cancelled order #{order_id}.",
        turn.user.display_name
    ))
    .button("🔎 View", &Action::AdminOrderView(order_id));
    turn.notify_admins(&notice).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::bot::{BotData, router::dispatch};
    use crate::config::{admins::AdminRegistry, settings::Config};
    use crate::core::{
        order,
        support::{self, MessageBody, ThreadId},
    };
    use crate::entities::OrderStatus;
    use crate::errors::Result;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_details_flag_unread_support_reply() -> Result<()> {
        let (db, user, order) = setup_with_order().await?;
        let thread = ThreadId {
            order_id: order.id,
            client_id: user.id,
        };
        support::save_admin_message(&db, thread, 1, MessageBody::text("Soon")).await?;
        let data = BotData::new(db, AdminRegistry::new([1]), Config::default());
        let out = RecordingMessenger::new();

        dispatch(&data, &out, callback_event(user.id, &format!("order_details_{}", order.id)))
            .await;

        let reply = out.last_reply().unwrap();
        assert!(reply.buttons.iter().flatten().any(|b| b.label.contains("🆕")));
        assert!(reply.tokens().any(|t| t == format!("cancel_order_{}", order.id)));
        Ok(())
    }

    #[tokio::test]
    async fn test_client_cancels_pending_order() -> Result<()> {
        let (db, user, order) = setup_with_order().await?;
        let data = BotData::new(db, AdminRegistry::new([1]), Config::default());
        let out = RecordingMessenger::new();

        dispatch(&data, &out, callback_event(user.id, &format!("cancel_order_{}", order.id)))
            .await;

        let stored = order::require_order(&data.database, order.id).await?;
        assert_eq!(stored.status, OrderStatus::Cancelled);
        assert_eq!(out.notifications_to(1).len(), 1);
        Ok(())
    }
}
