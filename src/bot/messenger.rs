//! Transport-neutral message shapes.
//!
//! The router consumes [`Event`]s and talks back through a [`Messenger`]. The
//! Discord adapter implements the trait for real traffic; tests use a
//! recording fake.

use crate::{core::token::Action, core::user::Profile, errors::Result};
use std::future::Future;

/// What the user sent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Free-form text
    Text(String),
    /// An image, optionally with a caption
    Photo {
        photo: String,
        caption: Option<String>,
    },
    /// Token of a pressed inline button
    Callback(String),
}

impl Payload {
    /// Text of a text message, or the caption of a photo.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Photo { caption, .. } => caption.as_deref(),
            Self::Callback(_) => None,
        }
    }

    /// Photo reference, if the payload is a photo.
    #[must_use]
    pub fn photo(&self) -> Option<&str> {
        match self {
            Self::Photo { photo, .. } => Some(photo),
            _ => None,
        }
    }

    /// Whether this is a plain text message.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// One inbound event from the chat platform
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Who sent it
    pub sender: Profile,
    /// Conversation the reply should go to
    pub chat_id: i64,
    /// What was sent
    pub payload: Payload,
}

/// Inline button
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

impl Button {
    /// A button that triggers `action` when pressed.
    pub fn new(label: impl Into<String>, action: &Action) -> Self {
        Self {
            label: label.into(),
            token: action.to_string(),
        }
    }
}

/// One outbound message
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outbound {
    pub text: String,
    /// Rows of inline buttons
    pub buttons: Vec<Vec<Button>>,
    /// Photo to show above the text
    pub photo: Option<String>,
}

impl Outbound {
    /// A plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Appends a row of buttons.
    #[must_use]
    pub fn row(mut self, row: Vec<Button>) -> Self {
        if !row.is_empty() {
            self.buttons.push(row);
        }
        self
    }

    /// Appends one button on its own row.
    #[must_use]
    pub fn button(self, label: impl Into<String>, action: &Action) -> Self {
        self.row(vec![Button::new(label, action)])
    }

    /// Attaches a photo.
    #[must_use]
    pub fn with_photo(mut self, photo: Option<String>) -> Self {
        self.photo = photo;
        self
    }

    /// The same message without its photo.
    #[must_use]
    pub fn without_photo(&self) -> Self {
        Self {
            photo: None,
            ..self.clone()
        }
    }

    /// Every token carried by the message's buttons.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.buttons
            .iter()
            .flatten()
            .map(|button| button.token.as_str())
    }
}

/// Outbound side of the chat platform
pub trait Messenger: Send + Sync {
    /// Sends a message into the conversation an event came from.
    fn reply(&self, chat_id: i64, message: Outbound) -> impl Future<Output = Result<()>> + Send;

    /// Sends a message to a user's private conversation.
    fn notify(&self, user_id: i64, message: Outbound) -> impl Future<Output = Result<()>> + Send;

    /// Acknowledges the callback being handled, optionally with a short
    /// notice. Only the first call per event has an effect.
    fn acknowledge(&self, notice: Option<&str>) -> impl Future<Output = Result<()>> + Send;
}
