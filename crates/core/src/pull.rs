//! The backfill engine: flush messages deferred by a lock.
//!
//! Locking defers delivery instead of dropping it; `pull` is the flush.
//! The pending marker doubles as the queue-membership test, so pulling
//! twice never double-sends.

use tracing::{error, info, warn};

use crate::{
    platform::{Marker, PlatformMessage},
    service::Relay,
};

/// How far back a pull looks in the source channel.
pub(crate) const PULL_WINDOW: u8 = 50;

impl Relay {
    /// Handle `pull` issued in the destination channel.
    pub async fn handle_pull(&self, command: &PlatformMessage) {
        let destination = &command.channel_id;
        let source = match self.store.paired_channel(destination).await {
            Ok(source) => source,
            Err(err) => {
                error!(channel_id = %destination, error = %err, "pull aborted, no paired channel");
                return;
            },
        };
        let fetched = match self
            .platform
            .recent_messages(&source, PULL_WINDOW, None)
            .await
        {
            Ok(fetched) => fetched,
            Err(err) => {
                error!(channel_id = %source, error = %err, "pull aborted, failed to fetch history");
                return;
            },
        };
        // Newest-first fetch order, deferred messages replayed oldest-first.
        let deferred: Vec<&PlatformMessage> = fetched
            .iter()
            .filter(|m| {
                !m.author_is_bot
                    && !m.content.starts_with(&self.prefix)
                    && m.has_marker(Marker::Pending)
            })
            .rev()
            .collect();
        info!(
            from = %source,
            to = %destination,
            count = deferred.len(),
            "replaying deferred messages"
        );
        for message in deferred {
            match self.deliver(message, destination).await {
                Ok(()) => {
                    self.unmark(message, Marker::Pending).await;
                    self.mark(message, Marker::Delivered).await;
                },
                Err(err) => {
                    warn!(
                        message_id = %message.id,
                        error = %err,
                        "failed to replay deferred message, continuing"
                    );
                    self.mark(message, Marker::Failed).await;
                },
            }
        }
        // The pull command itself is cleanup, regardless of outcomes.
        if let Err(err) = self.platform.delete_message(destination, &command.id).await {
            warn!(channel_id = %destination, message_id = %command.id, error = %err, "failed to delete pull command");
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use {
        crate::{
            pending::PendingBinds,
            platform::{ChatPlatform, Marker},
            service::Relay,
            testsupport::{Effect, RecordingPlatform, bot_msg, marked, msg},
        },
        relay_store::{ConnectionStore, InMemoryStore},
    };

    fn fixture() -> (Relay, Arc<RecordingPlatform>, Arc<InMemoryStore>) {
        let platform = Arc::new(RecordingPlatform::new());
        let store = Arc::new(InMemoryStore::new());
        let relay = Relay::new(
            Arc::clone(&store) as Arc<dyn ConnectionStore>,
            Arc::new(PendingBinds::new()),
            Arc::clone(&platform) as Arc<dyn ChatPlatform>,
            "!",
        );
        (relay, platform, store)
    }

    #[tokio::test]
    async fn test_pull_replays_deferred_messages_oldest_first() {
        let (relay, platform, store) = fixture();
        store.create_connection("src", "dst").await.unwrap();
        // Newest first, as the platform returns them.
        platform.set_history(
            "src",
            vec![
                marked(msg("3", "src", "third"), Marker::Pending),
                bot_msg("b1", "src", "from the bot"),
                msg("2", "src", "delivered already"),
                marked(msg("1", "src", "first"), Marker::Pending),
                marked(msg("0", "src", "!pull"), Marker::Pending),
            ],
        );
        relay.handle_pull(&msg("cmd", "dst", "!pull")).await;
        assert_eq!(
            platform.texts_sent_to("dst"),
            vec!["first".to_string(), "third".to_string()]
        );
        let effects = platform.effects();
        for id in ["1", "3"] {
            assert!(effects.contains(&Effect::MarkerRemoved {
                channel: "src".into(),
                message: id.into(),
                marker: Marker::Pending,
            }));
            assert!(effects.contains(&Effect::MarkerAdded {
                channel: "src".into(),
                message: id.into(),
                marker: Marker::Delivered,
            }));
        }
        assert!(effects.contains(&Effect::Deleted {
            channel: "dst".into(),
            message: "cmd".into(),
        }));
    }

    #[tokio::test]
    async fn test_pull_in_unpaired_channel_is_a_noop() {
        let (relay, platform, _) = fixture();
        relay.handle_pull(&msg("cmd", "dst", "!pull")).await;
        assert!(platform.effects().is_empty());
    }

    #[tokio::test]
    async fn test_second_pull_does_not_double_send() {
        let (relay, platform, store) = fixture();
        store.create_connection("src", "dst").await.unwrap();
        platform.set_history("src", vec![marked(msg("1", "src", "once"), Marker::Pending)]);
        relay.handle_pull(&msg("cmd1", "dst", "!pull")).await;
        // After reconciliation the message no longer carries the pending
        // marker.
        platform.set_history("src", vec![marked(msg("1", "src", "once"), Marker::Delivered)]);
        relay.handle_pull(&msg("cmd2", "dst", "!pull")).await;
        assert_eq!(platform.texts_sent_to("dst"), vec!["once".to_string()]);
    }

    #[tokio::test]
    async fn test_pull_continues_past_failures() {
        let (relay, platform, store) = fixture();
        store.create_connection("src", "dst").await.unwrap();
        platform.fail_text("dst");
        platform.set_history(
            "src",
            vec![
                marked(msg("2", "src", "b"), Marker::Pending),
                marked(msg("1", "src", "a"), Marker::Pending),
            ],
        );
        relay.handle_pull(&msg("cmd", "dst", "!pull")).await;
        let effects = platform.effects();
        for id in ["1", "2"] {
            assert!(effects.contains(&Effect::MarkerAdded {
                channel: "src".into(),
                message: id.into(),
                marker: Marker::Failed,
            }));
        }
        // Cleanup still happens.
        assert!(effects.contains(&Effect::Deleted {
            channel: "dst".into(),
            message: "cmd".into(),
        }));
    }
}
