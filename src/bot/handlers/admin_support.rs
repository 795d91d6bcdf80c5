//! Admin side of support: unread threads, history and replies.

use crate::{
    bot::{
        messenger::{Button, Messenger, Payload},
        router::Turn,
        views,
    },
    core::{
        scratch::SupportReply,
        state::ConversationState,
        support::{self, MessageBody, ThreadId},
        token::Action,
    },
    errors::{Error, Result},
};

pub async fn handle<M: Messenger>(turn: &mut Turn<'_, M>, action: Action) -> Result<()> {
    match action {
        Action::AdminSupportRequests => {
            let threads = support::threads_unread_by_admin(turn.db()).await?;
            turn.set_state(ConversationState::AdminPanel).await?;
            turn.reply(views::support_requests(&threads)).await
        }
        Action::AdminSupportHistory(order_id) => history(turn, order_id).await,
        Action::AdminReplySupport {
            order_id,
            client_id,
        } => {
            turn.data.scratch.update(turn.user.id, |scratch| {
                scratch.support_reply = Some(SupportReply {
                    order_id,
                    client_id,
                });
            });
            turn.set_state(ConversationState::AdminReplyingToSupport)
                .await?;
            turn.reply(views::admin_prompt(turn.user.state)).await
        }
        other => super::misrouted("admin_support", &other),
    }
}

/// Every client's thread about `order_id`, marked read for admins.
async fn history<M: Messenger>(turn: &mut Turn<'_, M>, order_id: i64) -> Result<()> {
    let threads = support::threads_for_order(turn.db(), order_id).await?;
    let mut sections = Vec::with_capacity(threads.len());
    for thread in &threads {
        let messages = support::thread_messages(turn.db(), *thread).await?;
        support::mark_read_by_admin(turn.db(), *thread).await?;
        sections.push(format!(
            "👤 Client {}\n{}",
            thread.client_id,
            support::format_thread(&messages)
        ));
    }
    let text = sections.join("\n\n");

    let chunks = support::split_for_budget(&text, turn.data.config.shop.history_budget);
    let mut navigation: Vec<Button> = threads
        .iter()
        .map(|thread| {
            Button::new(
                format!("↩️ {}", thread.client_id),
                &Action::AdminReplySupport {
                    order_id: thread.order_id,
                    client_id: thread.client_id,
                },
            )
        })
        .take(3)
        .collect();
    navigation.push(Button::new("⬅️ Requests", &Action::AdminSupportRequests));
    turn.reply_all(views::history(chunks, navigation)).await
}

/// Admin answer typed after choosing a thread.
pub async fn on_reply<M: Messenger>(turn: &mut Turn<'_, M>, payload: &Payload) -> Result<()> {
    let Some(target) = turn.data.scratch.get(turn.user.id).support_reply else {
        return Err(Error::invalid_input(
            "No support thread selected. Pick one from the requests list.",
        ));
    };
    let thread = ThreadId {
        order_id: target.order_id,
        client_id: target.client_id,
    };
    let body = MessageBody {
        text: payload.text().map(ToString::to_string),
        photo: payload.photo().map(ToString::to_string),
    };
    let saved = support::save_admin_message(turn.db(), thread, turn.user.id, body).await?;
    support::mark_read_by_admin(turn.db(), thread).await?;

    let message = views::support_reply(thread.order_id, saved.text.as_deref(), saved.photo.clone());
    let report = match turn.notify_with_fallback(thread.client_id, message).await {
        Some(_) => format!("✅ Reply sent to client {}.", thread.client_id),
        None => format!(
            "⚠️ Reply saved, but client {} could not be reached.",
            thread.client_id
        ),
    };

    turn.data.scratch.update(turn.user.id, |scratch| {
        scratch.support_reply = None;
    });
    super::admin::panel_with(turn, &report).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::bot::router::dispatch;
    use crate::core::{
        state::ConversationState,
        support::{self, MessageBody, ThreadId},
        user,
    };
    use crate::entities::SenderKind;
    use crate::errors::Result;
    use crate::test_utils::*;

    const ADMIN: i64 = 1;
    const CLIENT: i64 = 9;
    const THREAD: ThreadId = ThreadId {
        order_id: 0,
        client_id: CLIENT,
    };

    #[tokio::test]
    async fn test_requests_list_unread_threads() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        support::save_client_message(&data.database, THREAD, MessageBody::text("hi")).await?;
        let out = RecordingMessenger::new();

        dispatch(&data, &out, callback_event(ADMIN, "admin_support_requests")).await;

        let reply = out.last_reply().unwrap();
        assert!(reply.tokens().any(|t| t == "admin_reply_support_0_9"));
        Ok(())
    }

    #[tokio::test]
    async fn test_history_marks_client_messages_read() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        support::save_client_message(&data.database, THREAD, MessageBody::text("hi")).await?;
        let out = RecordingMessenger::new();

        dispatch(&data, &out, callback_event(ADMIN, "admin_support_history_0")).await;

        assert!(out.last_reply().unwrap().text.contains("hi"));
        assert!(support::threads_unread_by_admin(&data.database).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reply_is_saved_and_relayed() -> Result<()> {
        let data = setup_test_bot(&[ADMIN]).await?;
        create_test_user(&data.database, CLIENT, "Moscow").await?;
        support::save_client_message(&data.database, THREAD, MessageBody::text("hi")).await?;
        let out = RecordingMessenger::new();

        dispatch(&data, &out, callback_event(ADMIN, "admin_reply_support_0_9")).await;
        dispatch(&data, &out, text_event(ADMIN, "Hello, how can we help?")).await;

        let messages = support::thread_messages(&data.database, THREAD).await?;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender_kind, SenderKind::Admin);
        assert!(!messages[1].is_read_by_client);
        assert!(messages[0].is_read_by_admin);

        let relayed = out.notifications_to(CLIENT);
        assert_eq!(relayed.len(), 1);
        assert!(relayed[0].text.contains("Hello, how can we help?"));
        assert!(data.scratch.get(ADMIN).support_reply.is_none());
        let admin = user::get_user(&data.database, ADMIN).await?.unwrap();
        assert_eq!(admin.state, ConversationState::AdminPanel);
        Ok(())
    }
}
