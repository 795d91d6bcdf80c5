//! Support business logic - per-order threads with independent read flags.
//!
//! A thread is one client's conversation about one order (order 0 for general
//! questions). A client message starts unread for admins and read for the
//! client; an admin message is the mirror image. Opening a thread marks the
//! other side's messages as read for the viewer only.

use crate::{
    entities::{SenderKind, SupportMessage, support_message},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*, sea_query::Expr};
use std::collections::BTreeMap;

/// Content of a support message; at least one part must be present
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageBody {
    pub text: Option<String>,
    pub photo: Option<String>,
}

impl MessageBody {
    /// A text-only body.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            photo: None,
        }
    }

    fn validated(self) -> Result<Self> {
        let text = self
            .text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        if text.is_none() && self.photo.is_none() {
            return Err(Error::invalid_input("Send a text or a photo"));
        }
        Ok(Self {
            text,
            photo: self.photo,
        })
    }
}

/// Identifies a support thread
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId {
    pub order_id: i64,
    pub client_id: i64,
}

/// A thread with messages no admin has read yet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnreadThread {
    pub thread: ThreadId,
    pub unread: usize,
}

fn in_thread(thread: ThreadId) -> sea_orm::Condition {
    sea_orm::Condition::all()
        .add(support_message::Column::OrderId.eq(thread.order_id))
        .add(support_message::Column::ClientId.eq(thread.client_id))
}

async fn save(
    db: &DatabaseConnection,
    thread: ThreadId,
    sender_id: i64,
    kind: SenderKind,
    body: MessageBody,
) -> Result<support_message::Model> {
    let body = body.validated()?;
    let from_client = kind == SenderKind::Client;
    support_message::ActiveModel {
        order_id: Set(thread.order_id),
        client_id: Set(thread.client_id),
        sender_id: Set(sender_id),
        sender_kind: Set(kind),
        text: Set(body.text),
        photo: Set(body.photo),
        sent_at: Set(chrono::Utc::now()),
        is_read_by_admin: Set(!from_client),
        is_read_by_client: Set(from_client),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Saves a message written by the client of `thread`.
pub async fn save_client_message(
    db: &DatabaseConnection,
    thread: ThreadId,
    body: MessageBody,
) -> Result<support_message::Model> {
    save(db, thread, thread.client_id, SenderKind::Client, body).await
}

/// Saves a message written by an admin into `thread`.
pub async fn save_admin_message(
    db: &DatabaseConnection,
    thread: ThreadId,
    admin_id: i64,
    body: MessageBody,
) -> Result<support_message::Model> {
    save(db, thread, admin_id, SenderKind::Admin, body).await
}

/// All messages of a thread, oldest first.
pub async fn thread_messages(
    db: &DatabaseConnection,
    thread: ThreadId,
) -> Result<Vec<support_message::Model>> {
    SupportMessage::find()
        .filter(in_thread(thread))
        .order_by_asc(support_message::Column::SentAt)
        .order_by_asc(support_message::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Every thread about `order_id`, one per client who wrote or was written
/// to, ordered by client id.
pub async fn threads_for_order(db: &DatabaseConnection, order_id: i64) -> Result<Vec<ThreadId>> {
    let clients: Vec<i64> = SupportMessage::find()
        .select_only()
        .column(support_message::Column::ClientId)
        .distinct()
        .filter(support_message::Column::OrderId.eq(order_id))
        .order_by_asc(support_message::Column::ClientId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(clients
        .into_iter()
        .map(|client_id| ThreadId {
            order_id,
            client_id,
        })
        .collect())
}

/// Marks every client message of a thread as read by admins.
pub async fn mark_read_by_admin(db: &DatabaseConnection, thread: ThreadId) -> Result<u64> {
    let result = SupportMessage::update_many()
        .col_expr(support_message::Column::IsReadByAdmin, Expr::value(true))
        .filter(in_thread(thread))
        .filter(support_message::Column::SenderKind.eq(SenderKind::Client))
        .filter(support_message::Column::IsReadByAdmin.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Marks every admin message of a thread as read by the client.
pub async fn mark_read_by_client(db: &DatabaseConnection, thread: ThreadId) -> Result<u64> {
    let result = SupportMessage::update_many()
        .col_expr(support_message::Column::IsReadByClient, Expr::value(true))
        .filter(in_thread(thread))
        .filter(support_message::Column::SenderKind.eq(SenderKind::Admin))
        .filter(support_message::Column::IsReadByClient.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Whether the thread has admin messages the client has not seen.
pub async fn has_unread_for_client(db: &DatabaseConnection, thread: ThreadId) -> Result<bool> {
    let unread = SupportMessage::find()
        .select_only()
        .column(support_message::Column::Id)
        .filter(in_thread(thread))
        .filter(support_message::Column::SenderKind.eq(SenderKind::Admin))
        .filter(support_message::Column::IsReadByClient.eq(false))
        .into_tuple::<i64>()
        .one(db)
        .await?;
    Ok(unread.is_some())
}

/// Threads with client messages no admin has read, oldest thread first.
pub async fn threads_unread_by_admin(db: &DatabaseConnection) -> Result<Vec<UnreadThread>> {
    let messages = SupportMessage::find()
        .filter(support_message::Column::SenderKind.eq(SenderKind::Client))
        .filter(support_message::Column::IsReadByAdmin.eq(false))
        .order_by_asc(support_message::Column::SentAt)
        .order_by_asc(support_message::Column::Id)
        .all(db)
        .await?;

    let mut counts: BTreeMap<ThreadId, usize> = BTreeMap::new();
    let mut first_seen = Vec::new();
    for message in messages {
        let thread = ThreadId {
            order_id: message.order_id,
            client_id: message.client_id,
        };
        let count = counts.entry(thread).or_insert_with(|| {
            first_seen.push(thread);
            0
        });
        *count += 1;
    }
    Ok(first_seen
        .into_iter()
        .map(|thread| UnreadThread {
            thread,
            unread: counts.get(&thread).copied().unwrap_or_default(),
        })
        .collect())
}

/// Renders a thread as chat lines.
#[must_use]
pub fn format_thread(messages: &[support_message::Model]) -> String {
    messages
        .iter()
        .map(|message| {
            let who = match message.sender_kind {
                SenderKind::Client => "👤 Client",
                SenderKind::Admin => "🛠 Support",
            };
            let mut body = message.text.clone().unwrap_or_default();
            if message.photo.is_some() {
                if !body.is_empty() {
                    body.push(' ');
                }
                body.push_str("[photo]");
            }
            format!("{} {who}: {body}", message.sent_at.format("%d.%m %H:%M"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits `text` into chunks of at most `budget` characters, breaking at line
/// ends where possible. Nothing is dropped.
#[must_use]
pub fn split_for_budget(text: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let mut rest = line;
        loop {
            let rest_len = rest.chars().count();
            if current_len + rest_len <= budget {
                current.push_str(rest);
                current_len += rest_len;
                break;
            }
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            // A single line longer than the budget: hard split on characters.
            let split_at = rest
                .char_indices()
                .nth(budget)
                .map_or(rest.len(), |(index, _)| index);
            chunks.push(rest[..split_at].to_string());
            rest = &rest[split_at..];
            if rest.is_empty() {
                break;
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
        .into_iter()
        .map(|chunk| chunk.trim_end_matches('\n').to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}
