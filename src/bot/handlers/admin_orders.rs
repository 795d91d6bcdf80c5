//! Admin order pipeline and delivery reporting.
//!
//! Delivery is a two-message flow: a photo, then a comment. The order id and
//! the photo wait in scratch between the two.

use crate::{
    bot::{
        messenger::{Messenger, Outbound, Payload},
        router::Turn,
        views,
    },
    core::{
        order,
        scratch::DeliveryDraft,
        state::ConversationState,
        token::Action,
        user,
    },
    entities::OrderStatus,
    errors::{Error, Result},
};

/// Orders listed per screen.
const ADMIN_ORDER_LIMIT: u64 = 20;

/// Stored when the admin leaves the delivery comment empty.
const NO_COMMENT: &str = "No comment";

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::AdminOrders => list(turn, None).await,
        Action::AdminOrdersFilter(status) => list(turn, Some(status)).await,
        Action::AdminOrderView(order_id) => view(turn, order_id).await,
        Action::AdminSetStatus { order_id, status } => set_status(turn, order_id, status).await,
        Action::AdminSendPhoto(order_id) => {
            order::require_order(turn.db(), order_id).await?;
            turn.data.scratch.update(turn.user.id, |scratch| {
                scratch.delivery = Some(DeliveryDraft {
                    order_id,
                    photo: None,
                });
            });
            turn.set_state(ConversationState::AdminWaitingForProductPhoto)
                .await?;
            turn.reply(views::admin_prompt(turn.user.state)).await
        }
        Action::AdminDeliveryTime(order_id) => {
            order::require_order(turn.db(), order_id).await?;
            turn.data.scratch.update(turn.user.id, |scratch| {
                scratch.delivery_time_order = Some(order_id);
            });
            turn.set_state(ConversationState::AdminWaitingForDeliveryTime)
                .await?;
            turn.reply(views::admin_prompt(turn.user.state)).await
        }
        other => super::misrouted("admin_orders", &other),
    }
}

async fn list<M: Messenger>(turn: &mut Turn<'_, M>, filter: Option<OrderStatus>) -> Result<()> {
    let orders = order::orders_by_status(turn.db(), filter, ADMIN_ORDER_LIMIT).await?;
    turn.set_state(ConversationState::AdminPanel).await?;
    turn.reply(views::admin_orders(&orders, filter, turn.currency()))
        .await
}

async fn view<M: Messenger>(turn: &mut Turn<'_, M>, order_id: i64) -> Result<()> {
    let details = order::order_details(turn.db(), order_id).await?;
    let client = user::get_user(turn.db(), details.order.user_id).await?;
    turn.reply(views::admin_order_view(
        &details,
        client.as_ref(),
        turn.currency(),
    ))
    .await
}

async fn set_status<M: Messenger>(
    turn: &mut Turn<'_, M>,
    order_id: i64,
    status: OrderStatus,
) -> Result<()> {
    let updated = order::set_status(turn.db(), order_id, status).await?;
    turn.audit("order_status", &format!("order {order_id} -> {status}"))
        .await?;
    turn.toast(&format!("{} Order #{order_id}: {status}", status.glyph()))
        .await?;
    turn.notify(updated.user_id, views::status_notice(&updated))
        .await;
    view(turn, order_id).await
}

fn no_delivery_in_progress() -> Error {
    Error::invalid_input("No order is waiting for a delivery report. Pick one from the order list.")
}

/// Photo step of the delivery report.
pub async fn on_delivery_photo<M: Messenger>(
    turn: &mut Turn<'_, M>,
    payload: &Payload,
) -> Result<()> {
    let Some(photo) = payload.photo() else {
        return Err(Error::invalid_input("Please send a photo."));
    };
    let stored = turn.data.scratch.update(turn.user.id, |scratch| {
        scratch.delivery.as_mut().map(|draft| {
            draft.photo = Some(photo.to_string());
        })
    });
    if stored.is_none() {
        return Err(no_delivery_in_progress());
    }

    turn.set_state(ConversationState::AdminWaitingForOrderComment)
        .await?;
    turn.reply(views::admin_prompt(turn.user.state)).await
}

/// Comment step: stores the report and sends it to the client.
pub async fn on_delivery_comment<M: Messenger>(turn: &mut Turn<'_, M>, text: &str) -> Result<()> {
    let Some(DeliveryDraft {
        order_id,
        photo: Some(photo),
    }) = turn.data.scratch.get(turn.user.id).delivery
    else {
        return Err(no_delivery_in_progress());
    };

    let comment = match text.trim() {
        "" | "-" => NO_COMMENT,
        comment => comment,
    };
    let updated = order::attach_delivery(turn.db(), order_id, &photo, comment).await?;
    turn.audit("delivery_report", &format!("order {order_id}"))
        .await?;

    let report = views::delivery_report(&updated, &photo, comment);
    let outcome = match turn.notify_with_fallback(updated.user_id, report).await {
        Some(true) => "📬 Delivery photo sent to the client.",
        Some(false) => "📬 Delivery comment sent to the client (the photo could not be delivered).",
        None => "⚠️ Delivery report saved, but the client could not be reached.",
    };

    turn.data.scratch.update(turn.user.id, |scratch| {
        scratch.delivery = None;
    });
    super::admin::panel_with(turn, &format!("{outcome} Order #{order_id}."))
        .await
}

/// Relays a delivery time to the client.
pub async fn on_delivery_time<M: Messenger>(turn: &mut Turn<'_, M>, text: &str) -> Result<()> {
    let Some(order_id) = turn.data.scratch.get(turn.user.id).delivery_time_order else {
        return Err(no_delivery_in_progress());
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::invalid_input("Delivery time cannot be empty"));
    }
    let order = order::require_order(turn.db(), order_id).await?;

    let notice = Outbound::text(format!("⏰ Delivery time for order #{order_id}: {text}"))
        .button("🔎 Details", &Action::OrderDetails(order_id));
    let report = if turn.notify(order.user_id, notice).await {
        format!("✅ Delivery time sent for order #{order_id}.")
    } else {
        format!("⚠️ The client of order #{order_id} could not be reached.")
    };

    turn.data.scratch.update(turn.user.id, |scratch| {
        scratch.delivery_time_order = None;
    });
    super::admin::panel_with(turn, &report).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::bot::{BotData, router::dispatch};
    use crate::config::{admins::AdminRegistry, settings::Config};
    use crate::core::{order, state::ConversationState, user};
    use crate::errors::Result;
    use crate::test_utils::*;

    const ADMIN: i64 = 1;

    async fn bot_with_order() -> Result<(BotData, i64, i64)> {
        let (db, client, order) = setup_with_order().await?;
        let data = BotData::new(db, AdminRegistry::new([ADMIN]), Config::default());
        Ok((data, client.id, order.id))
    }

    #[tokio::test]
    async fn test_delivery_photo_and_comment_reach_client() -> Result<()> {
        let (data, client, order_id) = bot_with_order().await?;
        let out = RecordingMessenger::new();

        dispatch(&data, &out, callback_event(ADMIN, &format!("admin_send_photo_{order_id}")))
            .await;
        dispatch(&data, &out, photo_event(ADMIN, "https://cdn/door.jpg", None)).await;
        dispatch(&data, &out, text_event(ADMIN, "Left at the door")).await;

        let stored = order::require_order(&data.database, order_id).await?;
        assert_eq!(stored.delivery_photo.as_deref(), Some("https://cdn/door.jpg"));
        assert_eq!(stored.delivery_comment.as_deref(), Some("Left at the door"));

        let sent = out.notifications_to(client);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].photo.as_deref(), Some("https://cdn/door.jpg"));
        assert!(sent[0].text.contains("Left at the door"));

        assert!(data.scratch.get(ADMIN).delivery.is_none());
        let admin = user::get_user(&data.database, ADMIN).await?.unwrap();
        assert_eq!(admin.state, ConversationState::AdminPanel);
        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_falls_back_to_text() -> Result<()> {
        let (data, client, order_id) = bot_with_order().await?;
        let out = RecordingMessenger::new().rejecting_photos();

        dispatch(&data, &out, callback_event(ADMIN, &format!("admin_send_photo_{order_id}")))
            .await;
        dispatch(&data, &out, photo_event(ADMIN, "https://cdn/door.jpg", None)).await;
        dispatch(&data, &out, text_event(ADMIN, "-")).await;

        let sent = out.notifications_to(client);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].photo.is_none());
        assert!(sent[0].text.contains("No comment"));
        assert!(out.last_reply().unwrap().text.contains("could not be delivered"));
        Ok(())
    }

    #[tokio::test]
    async fn test_comment_without_photo_is_rejected() -> Result<()> {
        let (data, client, order_id) = bot_with_order().await?;
        let out = RecordingMessenger::new();

        dispatch(&data, &out, callback_event(ADMIN, &format!("admin_send_photo_{order_id}")))
            .await;
        dispatch(&data, &out, text_event(ADMIN, "Here you go")).await;

        assert!(out.last_reply().unwrap().text.contains("send a photo"));
        assert!(out.notifications_to(client).is_empty());
        let admin = user::get_user(&data.database, ADMIN).await?.unwrap();
        assert_eq!(admin.state, ConversationState::AdminWaitingForProductPhoto);
        Ok(())
    }

    #[tokio::test]
    async fn test_photo_without_order_context_is_rejected() -> Result<()> {
        let (data, _client, _order_id) = bot_with_order().await?;
        user::get_or_create_user(&data.database, &test_profile(ADMIN), true).await?;
        user::set_state(
            &data.database,
            ADMIN,
            ConversationState::AdminWaitingForProductPhoto,
        )
        .await?;
        let out = RecordingMessenger::new();

        dispatch(&data, &out, photo_event(ADMIN, "https://cdn/x.jpg", None)).await;

        assert!(out.last_reply().unwrap().text.contains("No order is waiting"));
        assert!(out.notifications().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_time_is_relayed() -> Result<()> {
        let (data, client, order_id) = bot_with_order().await?;
        let out = RecordingMessenger::new();

        dispatch(
            &data,
            &out,
            callback_event(ADMIN, &format!("admin_delivery_time_{order_id}")),
        )
        .await;
        dispatch(&data, &out, text_event(ADMIN, "Tomorrow 10:00-12:00")).await;

        let sent = out.notifications_to(client);
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("Tomorrow 10:00-12:00"));
        assert!(data.scratch.get(ADMIN).delivery_time_order.is_none());
        Ok(())
    }
}
