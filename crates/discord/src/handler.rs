//! Discord event handler for serenity.
//!
//! Translates gateway message events into relay core events.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use {
    serenity::{
        all::{Context, EventHandler, GatewayIntents, Message, Ready},
        async_trait,
    },
    tracing::info,
};

use relay_core::{Relay, platform::PlatformMessage};

use crate::platform::markers_of;

/// Handler for Discord gateway events.
pub struct RelayHandler {
    relay: Arc<Relay>,
    bot_user_id: AtomicU64,
}

impl RelayHandler {
    pub fn new(relay: Arc<Relay>) -> Self {
        Self {
            relay,
            bot_user_id: AtomicU64::new(0),
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
            | GatewayIntents::MESSAGE_CONTENT
    }
}

/// Convert a serenity message into the core's platform-neutral shape.
pub(crate) fn to_platform_message(msg: &Message) -> PlatformMessage {
    let reactions: Vec<_> = msg
        .reactions
        .iter()
        .map(|reaction| reaction.reaction_type.clone())
        .collect();
    PlatformMessage {
        id: msg.id.to_string(),
        channel_id: msg.channel_id.to_string(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
        attachment_urls: msg.attachments.iter().map(|a| a.url.clone()).collect(),
        markers: markers_of(&reactions),
    }
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "relay bot ready"
        );
        self.bot_user_id.store(ready.user.id.get(), Ordering::SeqCst);
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        // Skip our own messages to prevent loops.
        if msg.author.id.get() == self.bot_user_id.load(Ordering::SeqCst) {
            return;
        }
        self.relay.handle_message(&to_platform_message(&msg)).await;
    }
}
