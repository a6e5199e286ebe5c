//! Capability interface over the chat platform.
//!
//! The core only ever talks to the platform through [`ChatPlatform`];
//! `relay-discord` provides the production implementation.

use {async_trait::async_trait, thiserror::Error};

/// Visible reaction markers the relay places on source messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Delivery deferred because the destination is locked.
    Pending,
    /// Forwarded successfully.
    Delivered,
    /// Forwarding failed; the message is dropped.
    Failed,
}

impl Marker {
    #[must_use]
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Pending => "\u{231b}",
            Self::Delivered => "\u{2705}",
            Self::Failed => "\u{274c}",
        }
    }

    #[must_use]
    pub fn from_emoji(emoji: &str) -> Option<Self> {
        match emoji {
            "\u{231b}" => Some(Self::Pending),
            "\u{2705}" => Some(Self::Delivered),
            "\u{274c}" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A platform message as seen by the core: identity, authorship, text,
/// attachment URLs, and whichever markers are already present on it.
#[derive(Debug, Clone)]
pub struct PlatformMessage {
    pub id: String,
    pub channel_id: String,
    pub author_is_bot: bool,
    pub content: String,
    pub attachment_urls: Vec<String>,
    pub markers: Vec<Marker>,
}

impl PlatformMessage {
    #[must_use]
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

/// Failure from the external platform. Never retried by the core, except
/// that [`PlatformError::BulkDeleteUnsupported`] signals the
/// one-at-a-time deletion fallback.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform rejected a bulk delete (typically for message age).
    #[error("bulk delete rejected by the platform")]
    BulkDeleteUnsupported,

    #[error("{message}")]
    Message { message: String },

    #[error("{context}: {source}")]
    Other {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PlatformError {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn other(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Everything the relay needs from the chat platform. All calls are
/// fallible and bounded by the platform client's own timeouts.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, channel_id: &str, text: &str) -> PlatformResult<()>;

    /// Send an embed-style notice (title plus optional body).
    async fn send_notice(&self, channel_id: &str, title: &str, body: &str) -> PlatformResult<()>;

    /// Add a reaction marker to a message.
    async fn add_marker(
        &self,
        channel_id: &str,
        message_id: &str,
        marker: Marker,
    ) -> PlatformResult<()>;

    /// Remove the bot's own reaction marker from a message.
    async fn remove_marker(
        &self,
        channel_id: &str,
        message_id: &str,
        marker: Marker,
    ) -> PlatformResult<()>;

    /// Delete a single message.
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> PlatformResult<()>;

    /// Delete a batch of messages. Fails with
    /// [`PlatformError::BulkDeleteUnsupported`] when the platform refuses
    /// the batch, in which case the caller falls back to single deletes.
    async fn delete_messages(
        &self,
        channel_id: &str,
        message_ids: &[String],
    ) -> PlatformResult<()>;

    /// Fetch up to `limit` most recent messages, newest first, optionally
    /// only those older than `before`.
    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> PlatformResult<Vec<PlatformMessage>>;
}
