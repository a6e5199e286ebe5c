//! `ChatPlatform` implementation over the serenity HTTP client.

use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::{
        all::{ChannelId, CreateEmbed, CreateMessage, GetMessages, MessageId, ReactionType},
        http::Http,
    },
};

use relay_core::platform::{
    ChatPlatform, Marker, PlatformError, PlatformMessage, PlatformResult,
};

/// Discord error code for "you can only bulk delete messages that are
/// under 14 days old".
const BULK_DELETE_TOO_OLD: isize = 50034;

pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn channel(id: &str) -> PlatformResult<ChannelId> {
    id.parse::<u64>()
        .map(ChannelId::new)
        .map_err(|_| PlatformError::message(format!("invalid channel id: {id}")))
}

fn message_id(id: &str) -> PlatformResult<MessageId> {
    id.parse::<u64>()
        .map(MessageId::new)
        .map_err(|_| PlatformError::message(format!("invalid message id: {id}")))
}

fn reaction(marker: Marker) -> ReactionType {
    ReactionType::Unicode(marker.emoji().to_string())
}

/// Markers already present on a message, derived from its unicode
/// reactions.
pub(crate) fn markers_of(reactions: &[ReactionType]) -> Vec<Marker> {
    reactions
        .iter()
        .filter_map(|reaction| match reaction {
            ReactionType::Unicode(emoji) => Marker::from_emoji(emoji),
            _ => None,
        })
        .collect()
}

fn is_bulk_delete_age_rejection(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(response))
            if response.error.code == BULK_DELETE_TOO_OLD
    )
}

fn external(context: &str, err: serenity::Error) -> PlatformError {
    PlatformError::other(context.to_string(), err)
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn send_text(&self, channel_id: &str, text: &str) -> PlatformResult<()> {
        channel(channel_id)?
            .say(&self.http, text)
            .await
            .map_err(|err| external("send message", err))?;
        Ok(())
    }

    async fn send_notice(&self, channel_id: &str, title: &str, body: &str) -> PlatformResult<()> {
        let embed = CreateEmbed::new().title(title).description(body);
        channel(channel_id)?
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
            .map_err(|err| external("send notice", err))?;
        Ok(())
    }

    async fn add_marker(
        &self,
        channel_id: &str,
        message: &str,
        marker: Marker,
    ) -> PlatformResult<()> {
        channel(channel_id)?
            .create_reaction(&self.http, message_id(message)?, reaction(marker))
            .await
            .map_err(|err| external("add reaction", err))
    }

    async fn remove_marker(
        &self,
        channel_id: &str,
        message: &str,
        marker: Marker,
    ) -> PlatformResult<()> {
        // user_id None removes the bot's own reaction.
        channel(channel_id)?
            .delete_reaction(&self.http, message_id(message)?, None, reaction(marker))
            .await
            .map_err(|err| external("remove reaction", err))
    }

    async fn delete_message(&self, channel_id: &str, message: &str) -> PlatformResult<()> {
        channel(channel_id)?
            .delete_message(&self.http, message_id(message)?)
            .await
            .map_err(|err| external("delete message", err))
    }

    async fn delete_messages(
        &self,
        channel_id: &str,
        message_ids: &[String],
    ) -> PlatformResult<()> {
        let ids = message_ids
            .iter()
            .map(|id| message_id(id))
            .collect::<PlatformResult<Vec<_>>>()?;
        channel(channel_id)?
            .delete_messages(&self.http, ids)
            .await
            .map_err(|err| {
                if is_bulk_delete_age_rejection(&err) {
                    PlatformError::BulkDeleteUnsupported
                } else {
                    external("bulk delete messages", err)
                }
            })
    }

    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> PlatformResult<Vec<PlatformMessage>> {
        let mut request = GetMessages::new().limit(limit);
        if let Some(before) = before {
            request = request.before(message_id(before)?);
        }
        let messages = channel(channel_id)?
            .messages(&self.http, request)
            .await
            .map_err(|err| external("fetch messages", err))?;
        Ok(messages.iter().map(crate::handler::to_platform_message).collect())
    }
}
