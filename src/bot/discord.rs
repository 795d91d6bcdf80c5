//! Discord adapter.
//!
//! Direct messages and button presses become [`Event`]s for the router;
//! [`Outbound`] messages become Discord messages with component buttons.
//! Guild traffic is ignored, the shop lives in DMs.

use crate::{
    bot::{
        BotData, commands,
        messenger::{Button, Event, Messenger, Outbound, Payload},
        router,
    },
    core::{support, user::Profile},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, instrument, warn};

/// Discord allows at most this many action rows per message.
const MAX_ROWS: usize = 5;
/// ... and this many buttons per row.
const MAX_BUTTONS_PER_ROW: usize = 5;
const MAX_LABEL_CHARS: usize = 80;
/// Longest message text Discord accepts.
const MAX_CONTENT_CHARS: usize = 2000;

/// [`Messenger`] bound to one inbound Discord event.
pub struct DiscordMessenger<'a> {
    http: &'a serenity::Http,
    interaction: Option<&'a serenity::ComponentInteraction>,
    /// Discord already has the deferred response for the press
    deferred: AtomicBool,
    /// The router's acknowledgement was already handled
    acknowledged: AtomicBool,
}

/// What to send when the router acknowledges a button press
#[derive(Debug, PartialEq, Eq)]
enum AckStep<'n> {
    /// Nothing left to send
    Nothing,
    /// Initial response, silent or with an ephemeral toast
    Respond(Option<&'n str>),
    /// Ephemeral follow-up after the deferred response
    Followup(&'n str),
}

impl<'n> AckStep<'n> {
    const fn plan(notice: Option<&'n str>, deferred: bool) -> Self {
        match (notice, deferred) {
            (Some(text), true) => Self::Followup(text),
            (None, true) => Self::Nothing,
            (notice, false) => Self::Respond(notice),
        }
    }
}

impl<'a> DiscordMessenger<'a> {
    /// Messenger for a plain message; acknowledgements are no-ops.
    #[must_use]
    pub const fn new(http: &'a serenity::Http) -> Self {
        Self {
            http,
            interaction: None,
            deferred: AtomicBool::new(false),
            acknowledged: AtomicBool::new(false),
        }
    }

    /// Messenger for a button press, which must be acknowledged once.
    #[must_use]
    pub const fn for_interaction(
        http: &'a serenity::Http,
        interaction: &'a serenity::ComponentInteraction,
    ) -> Self {
        Self {
            http,
            interaction: Some(interaction),
            deferred: AtomicBool::new(false),
            acknowledged: AtomicBool::new(false),
        }
    }

    /// Sends the deferred response for a button press. Must run within three
    /// seconds of the press, before any handler work.
    pub async fn defer(&self) -> Result<()> {
        let Some(interaction) = self.interaction else {
            return Ok(());
        };
        interaction
            .create_response(self.http, serenity::CreateInteractionResponse::Acknowledge)
            .await?;
        self.deferred.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn send_to_channel(&self, channel: serenity::ChannelId, message: &Outbound) -> Result<()> {
        for builder in build_messages(message) {
            channel.send_message(self.http, builder).await?;
        }
        Ok(())
    }
}

impl Messenger for DiscordMessenger<'_> {
    async fn reply(&self, chat_id: i64, message: Outbound) -> Result<()> {
        let channel = serenity::ChannelId::new(snowflake(chat_id)?);
        match self.send_to_channel(channel, &message).await {
            Err(e) if message.photo.is_some() => {
                warn!(chat_id, error = %e, "Photo reply failed, sending text only");
                self.send_to_channel(channel, &message.without_photo()).await
            }
            result => result,
        }
    }

    async fn notify(&self, user_id: i64, message: Outbound) -> Result<()> {
        let user = serenity::UserId::new(snowflake(user_id)?);
        for builder in build_messages(&message) {
            user.direct_message(self.http, builder).await?;
        }
        Ok(())
    }

    async fn acknowledge(&self, notice: Option<&str>) -> Result<()> {
        let Some(interaction) = self.interaction else {
            return Ok(());
        };
        if self.acknowledged.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match AckStep::plan(notice, self.deferred.load(Ordering::SeqCst)) {
            AckStep::Nothing => {}
            AckStep::Followup(text) => {
                interaction
                    .create_followup(
                        self.http,
                        serenity::CreateInteractionResponseFollowup::new()
                            .content(text)
                            .ephemeral(true),
                    )
                    .await?;
            }
            AckStep::Respond(Some(text)) => {
                let toast = serenity::CreateInteractionResponseMessage::new()
                    .content(text)
                    .ephemeral(true);
                interaction
                    .create_response(
                        self.http,
                        serenity::CreateInteractionResponse::Message(toast),
                    )
                    .await?;
            }
            AckStep::Respond(None) => {
                interaction
                    .create_response(self.http, serenity::CreateInteractionResponse::Acknowledge)
                    .await?;
            }
        }
        Ok(())
    }
}

fn snowflake(id: i64) -> Result<u64> {
    let id = u64::try_from(id)?;
    if id == 0 {
        return Err(Error::Delivery {
            message: "Discord ids are never zero".to_string(),
        });
    }
    Ok(id)
}

fn platform_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

fn profile(user: &serenity::User) -> Option<Profile> {
    Some(Profile {
        id: platform_id(user.id.get())?,
        username: Some(user.name.clone()),
        display_name: user.global_name.clone().unwrap_or_else(|| user.name.clone()),
    })
}

/// Splits button rows into pages Discord accepts: rows of at most five
/// buttons, at most five rows per message.
fn button_pages(rows: &[Vec<Button>]) -> Vec<Vec<&[Button]>> {
    let rows: Vec<&[Button]> = rows
        .iter()
        .flat_map(|row| row.chunks(MAX_BUTTONS_PER_ROW))
        .collect();
    rows.chunks(MAX_ROWS).map(<[&[Button]]>::to_vec).collect()
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

fn action_row(row: &[Button]) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(
        row.iter()
            .map(|button| {
                serenity::CreateButton::new(button.token.as_str())
                    .label(clip(&button.label, MAX_LABEL_CHARS))
                    .style(serenity::ButtonStyle::Secondary)
            })
            .collect(),
    )
}

/// One Discord message as laid out before building
#[derive(Debug)]
struct Part<'m> {
    text: String,
    photo: Option<&'m str>,
    rows: Vec<&'m [Button]>,
}

/// Lays a message out over as many Discord messages as it needs. Text longer
/// than the content limit is split at line ends; the photo rides on the first
/// part and the buttons start on the last text part, overflowing into extra
/// parts five rows at a time.
fn layout(message: &Outbound) -> Vec<Part<'_>> {
    let mut parts: Vec<Part<'_>> = support::split_for_budget(&message.text, MAX_CONTENT_CHARS)
        .into_iter()
        .map(|text| Part {
            text,
            photo: None,
            rows: Vec::new(),
        })
        .collect();
    if parts.is_empty() {
        parts.push(Part {
            text: String::new(),
            photo: None,
            rows: Vec::new(),
        });
    }
    if let Some(first) = parts.first_mut() {
        first.photo = message.photo.as_deref();
    }

    let mut pages = button_pages(&message.buttons).into_iter();
    if let (Some(last), Some(page)) = (parts.last_mut(), pages.next()) {
        last.rows = page;
    }
    parts.extend(pages.map(|rows| Part {
        text: "…".to_string(),
        photo: None,
        rows,
    }));
    parts
}

fn build_messages(message: &Outbound) -> Vec<serenity::CreateMessage> {
    layout(message)
        .into_iter()
        .map(|part| {
            let mut builder = serenity::CreateMessage::new().content(part.text);
            if let Some(photo) = part.photo {
                builder = builder.embed(serenity::CreateEmbed::new().image(photo));
            }
            if !part.rows.is_empty() {
                builder = builder.components(part.rows.into_iter().map(action_row).collect());
            }
            builder
        })
        .collect()
}

fn is_image(attachment: &serenity::Attachment) -> bool {
    attachment
        .content_type
        .as_deref()
        .is_some_and(|kind| kind.starts_with("image/"))
}

/// Translates a direct message into an [`Event`]. Bot and guild messages are
/// dropped.
fn message_event(message: &serenity::Message) -> Option<Event> {
    if message.author.bot || message.guild_id.is_some() {
        return None;
    }
    let payload = match message.attachments.iter().find(|a| is_image(a)) {
        Some(image) => Payload::Photo {
            photo: image.url.clone(),
            caption: Some(message.content.clone()).filter(|text| !text.trim().is_empty()),
        },
        None if message.content.trim().is_empty() => return None,
        None => Payload::Text(message.content.clone()),
    };
    Some(Event {
        sender: profile(&message.author)?,
        chat_id: platform_id(message.channel_id.get())?,
        payload,
    })
}

fn component_event(interaction: &serenity::ComponentInteraction) -> Option<Event> {
    Some(Event {
        sender: profile(&interaction.user)?,
        chat_id: platform_id(interaction.channel_id.get())?,
        payload: Payload::Callback(interaction.data.custom_id.clone()),
    })
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!("Logged in as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::Message { new_message } => {
            if let Some(inbound) = message_event(new_message) {
                router::dispatch(data, &DiscordMessenger::new(&ctx.http), inbound).await;
            }
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let Some(component) = interaction.as_message_component() {
                match component_event(component) {
                    Some(inbound) => {
                        let out = DiscordMessenger::for_interaction(&ctx.http, component);
                        if let Err(e) = out.defer().await {
                            warn!(error = %e, "Failed to defer component response");
                        }
                        router::dispatch(data, &out, inbound).await;
                    }
                    None => debug!("Ignoring component press from unmappable user"),
                }
            }
        }
        _ => {}
    }
    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("⚠️ {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::EventHandler { error, .. } => {
            error!("Error in event handler: {}", error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Connects to Discord and serves the shop until the client stops.
#[instrument(skip_all)]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![commands::start(), commands::ping(), commands::help()],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::token::Action;

    fn buttons(count: usize) -> Vec<Button> {
        (0..count)
            .map(|i| Button::new(format!("b{i}"), &Action::Product(i64::try_from(i).unwrap())))
            .collect()
    }

    #[test]
    fn test_button_pages_split_long_rows_and_many_rows() {
        let rows = vec![buttons(7), buttons(1), buttons(1), buttons(1), buttons(1)];
        let pages = button_pages(&rows);

        // 7 buttons become rows of 5 and 2, pushing the total to 6 rows.
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), 5);
        assert_eq!(pages[0][0].len(), 5);
        assert_eq!(pages[0][1].len(), 2);
        assert_eq!(pages[1].len(), 1);
    }

    #[test]
    fn test_button_pages_empty() {
        assert!(button_pages(&[]).is_empty());
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        let clipped = clip("ééééééééééé", 5);
        assert_eq!(clipped.chars().count(), 5);
        assert!(clipped.ends_with('…'));
    }

    #[test]
    fn test_long_text_is_split_not_truncated() {
        let line = "x".repeat(99);
        let text = vec![line.as_str(); 45].join("\n");
        let message = Outbound::text(text.clone())
            .with_photo(Some("https://cdn.example/p.png".to_string()))
            .row(buttons(2));

        let parts = layout(&message);

        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|part| part.text.chars().count() <= MAX_CONTENT_CHARS));
        let rejoined: Vec<&str> = parts.iter().map(|part| part.text.as_str()).collect();
        assert_eq!(rejoined.join("\n"), text);
        assert_eq!(parts[0].photo, Some("https://cdn.example/p.png"));
        assert!(parts[1].photo.is_none());
        assert!(parts[0].rows.is_empty());
        assert_eq!(parts[2].rows.len(), 1);
    }

    #[test]
    fn test_short_text_is_one_part() {
        let binding = Outbound::text("Pick one").row(buttons(3));
        let parts = layout(&binding);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].text, "Pick one");
        assert_eq!(parts[0].rows.len(), 1);
    }

    #[test]
    fn test_build_messages_pages() {
        let message = Outbound::text("Pick one").row(buttons(5)).row(buttons(5));
        assert_eq!(build_messages(&message).len(), 1);

        let mut crowded = Outbound::text("Pick one");
        for _ in 0..6 {
            crowded = crowded.row(buttons(2));
        }
        assert_eq!(build_messages(&crowded).len(), 2);
    }

    #[test]
    fn test_ack_after_defer_only_sends_toasts() {
        assert_eq!(AckStep::plan(None, true), AckStep::Nothing);
        assert_eq!(
            AckStep::plan(Some("✅ Added to cart"), true),
            AckStep::Followup("✅ Added to cart")
        );
    }

    #[test]
    fn test_ack_without_defer_is_the_initial_response() {
        assert_eq!(AckStep::plan(None, false), AckStep::Respond(None));
        assert_eq!(
            AckStep::plan(Some("🤔 Not recognized"), false),
            AckStep::Respond(Some("🤔 Not recognized"))
        );
    }

    #[test]
    fn test_snowflake_rejects_invalid_ids() {
        assert!(snowflake(0).is_err());
        assert!(snowflake(-5).is_err());
        assert_eq!(snowflake(42).unwrap(), 42);
    }
}
