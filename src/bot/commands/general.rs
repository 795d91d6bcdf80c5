//! General Discord commands - start, ping and help.
//! The shop itself runs on buttons in direct messages; these slash commands
//! only open it and explain how it works.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            discord::DiscordMessenger,
            messenger::{Event, Payload},
            router,
        },
        core::user::Profile,
        errors::{Error, Result},
    };

    /// Opens the shop in a direct message.
    ///
    /// Runs the same flow as sending `/start` in the DM: a new user is asked
    /// for their city, a returning user gets the main menu.
    #[poise::command(slash_command, prefix_command)]
    pub async fn start(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let author = ctx.author();
        let channel = author.create_dm_channel(ctx).await?;
        ctx.say("🛍 The shop is open in your direct messages.")
            .await?;

        let event = Event {
            sender: Profile {
                id: i64::try_from(author.id.get())?,
                username: Some(author.name.clone()),
                display_name: author
                    .global_name
                    .clone()
                    .unwrap_or_else(|| author.name.clone()),
            },
            chat_id: i64::try_from(channel.id.get())?,
            payload: Payload::Text("/start".to_string()),
        };
        router::dispatch(ctx.data(), &DiscordMessenger::new(ctx.http()), event).await;
        Ok(())
    }

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Explains how to shop with the bot.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**ShopBuddy Help**\n\
        Everything happens in direct messages with the bot, using the buttons under each message.\n\n\
        **Shopping**\n\
        • `/start` - Opens the shop. New customers pick their city first.\n\
        • 🛍 Catalog - Browse categories and products available in your city.\n\
        • 🛒 Cart - Review your items and check out with a delivery address.\n\
        • After paying, press **I've paid** (or write \"paid\") and we confirm your order.\n\n\
        **After ordering**\n\
        • 📦 My orders - Track status, cancel unpaid orders.\n\
        • 💬 Support - Ask about an order or anything else; replies arrive here.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
