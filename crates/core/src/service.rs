//! The relay service: event entry point and command dispatch.

use std::sync::Arc;

use tracing::{info, warn};

use relay_store::ConnectionStore;

use crate::{
    command::Command,
    pending::PendingBinds,
    platform::{ChatPlatform, Marker, PlatformMessage},
};

/// Ties the persistence store, pending-bind cache, and platform together.
/// One instance serves every channel; each inbound event is handled
/// independently.
pub struct Relay {
    pub(crate) store: Arc<dyn ConnectionStore>,
    pub(crate) pending: Arc<PendingBinds>,
    pub(crate) platform: Arc<dyn ChatPlatform>,
    pub(crate) prefix: String,
}

impl Relay {
    pub fn new(
        store: Arc<dyn ConnectionStore>,
        pending: Arc<PendingBinds>,
        platform: Arc<dyn ChatPlatform>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            store,
            pending,
            platform,
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn command_prefix(&self) -> &str {
        &self.prefix
    }

    /// Entry point for every inbound message event.
    pub async fn handle_message(&self, message: &PlatformMessage) {
        if message.author_is_bot {
            return;
        }
        if message.content.starts_with(&self.prefix) {
            let Some(command) = Command::parse(&message.content, &self.prefix) else {
                return;
            };
            info!(
                channel_id = %message.channel_id,
                command = command.name(),
                "handling command"
            );
            match command {
                Command::Bind { target } => self.handle_bind(&message.channel_id, &target).await,
                Command::Unbind => self.handle_unbind(&message.channel_id).await,
                Command::Clear => self.handle_clear(message, false).await,
                Command::ClearOther => self.handle_clear(message, true).await,
                Command::Lock => self.handle_lock(&message.channel_id, true).await,
                Command::Unlock => self.handle_lock(&message.channel_id, false).await,
                Command::Pull => self.handle_pull(message).await,
            }
        } else {
            self.forward_inbound(message).await;
        }
    }

    /// Set or clear the issuing channel's lock flag and confirm.
    pub async fn handle_lock(&self, channel_id: &str, locked: bool) {
        let action = if locked { "lock" } else { "unlock" };
        match self.store.set_locked(channel_id, locked).await {
            Ok(()) => {
                info!(channel_id, action, "lock flag updated");
                self.notify(channel_id, &format!("Channel has been {action}ed"), "")
                    .await;
            },
            Err(err) => {
                warn!(channel_id, action, error = %err, "failed to update lock flag");
                self.notify(
                    channel_id,
                    &format!("Failed to {action} channel"),
                    &format!("```{err}```"),
                )
                .await;
            },
        }
    }

    /// Best-effort notice; failures are logged, never propagated.
    pub(crate) async fn notify(&self, channel_id: &str, title: &str, body: &str) {
        if let Err(err) = self.platform.send_notice(channel_id, title, body).await {
            warn!(channel_id, title, error = %err, "failed to send notice");
        }
    }

    /// Best-effort marker addition.
    pub(crate) async fn mark(&self, message: &PlatformMessage, marker: Marker) {
        if let Err(err) = self
            .platform
            .add_marker(&message.channel_id, &message.id, marker)
            .await
        {
            warn!(
                channel_id = %message.channel_id,
                message_id = %message.id,
                error = %err,
                "failed to add marker"
            );
        }
    }

    /// Best-effort marker removal.
    pub(crate) async fn unmark(&self, message: &PlatformMessage, marker: Marker) {
        if let Err(err) = self
            .platform
            .remove_marker(&message.channel_id, &message.id, marker)
            .await
        {
            warn!(
                channel_id = %message.channel_id,
                message_id = %message.id,
                error = %err,
                "failed to remove marker"
            );
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use {
        crate::testsupport::{Effect, RecordingPlatform, marked, msg},
        relay_store::InMemoryStore,
    };

    fn relay_with(platform: Arc<RecordingPlatform>) -> Relay {
        Relay::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(PendingBinds::new()),
            platform,
            "!",
        )
    }

    #[tokio::test]
    async fn test_bot_messages_are_ignored() {
        let platform = Arc::new(RecordingPlatform::new());
        let relay = relay_with(Arc::clone(&platform));
        let mut message = msg("1", "c1", "!lock");
        message.author_is_bot = true;
        relay.handle_message(&message).await;
        assert!(platform.effects().is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_command_is_silently_ignored() {
        let platform = Arc::new(RecordingPlatform::new());
        let relay = relay_with(Arc::clone(&platform));
        relay.handle_message(&msg("1", "c1", "!dance")).await;
        assert!(platform.effects().is_empty());
    }

    #[tokio::test]
    async fn test_lock_command_confirms() {
        let platform = Arc::new(RecordingPlatform::new());
        let relay = relay_with(Arc::clone(&platform));
        relay.handle_message(&msg("1", "c1", "!lock")).await;
        assert!(relay.store.is_locked("c1").await);
        assert_eq!(
            platform.effects(),
            vec![Effect::Notice {
                channel: "c1".into(),
                title: "Channel has been locked".into(),
                body: String::new(),
            }]
        );
    }

    #[tokio::test]
    async fn test_unlock_command_confirms() {
        let platform = Arc::new(RecordingPlatform::new());
        let relay = relay_with(Arc::clone(&platform));
        relay.store.set_locked("c1", true).await.unwrap();
        relay.handle_message(&msg("1", "c1", "!unlock")).await;
        assert!(!relay.store.is_locked("c1").await);
    }

    /// The full lifecycle: mutual bind, lock, deferred delivery, unlock,
    /// pull, marker reconciliation.
    #[tokio::test]
    async fn test_bind_lock_defer_pull_scenario() {
        let platform = Arc::new(RecordingPlatform::new());
        let relay = relay_with(Arc::clone(&platform));

        relay.handle_message(&msg("1", "c1", "!bind c2")).await;
        relay.handle_message(&msg("2", "c2", "!bind c1")).await;
        assert_eq!(relay.store.paired_channel("c1").await.unwrap(), "c2");

        relay.handle_message(&msg("3", "c2", "!lock")).await;

        // A message in c1 must be deferred, not forwarded.
        let deferred = msg("10", "c1", "hold this");
        relay.handle_message(&deferred).await;
        assert!(platform.texts_sent_to("c2").is_empty());
        assert!(platform.effects().contains(&Effect::MarkerAdded {
            channel: "c1".into(),
            message: "10".into(),
            marker: Marker::Pending,
        }));

        relay.handle_message(&msg("4", "c2", "!unlock")).await;

        // Pull from c2 flushes the deferred message.
        platform.set_history("c1", vec![marked(deferred, Marker::Pending)]);
        relay.handle_message(&msg("5", "c2", "!pull")).await;
        assert_eq!(platform.texts_sent_to("c2"), vec!["hold this".to_string()]);
        let effects = platform.effects();
        assert!(effects.contains(&Effect::MarkerRemoved {
            channel: "c1".into(),
            message: "10".into(),
            marker: Marker::Pending,
        }));
        assert!(effects.contains(&Effect::MarkerAdded {
            channel: "c1".into(),
            message: "10".into(),
            marker: Marker::Delivered,
        }));
    }
}
