//! Pairing negotiation: two one-sided bind requests become a connection.
//!
//! A connection exists only once both channels have named each other
//! within the pending-request TTL. The store's uniqueness constraint is
//! the sole guard against racing completions.

use tracing::{info, warn};

use crate::{pending::BIND_REQUEST_TTL, service::Relay};

impl Relay {
    /// Handle `bind <to>` issued in channel `from`.
    pub async fn handle_bind(&self, from: &str, to: &str) {
        if from == to {
            self.notify(from, "You can't bind a channel to itself", "")
                .await;
            return;
        }
        // A live reciprocal request means both parties have agreed.
        if self.pending.take(to, from) {
            match self.store.create_connection(from, to).await {
                Ok(()) => {
                    info!(from, to, "connection established");
                    for (channel, other) in [(from, to), (to, from)] {
                        self.notify(
                            channel,
                            &format!("Connection successfully established with {other}"),
                            "",
                        )
                        .await;
                    }
                },
                Err(err) => {
                    warn!(from, to, error = %err, "failed to create connection");
                    self.notify(
                        from,
                        "Failed to establish connection",
                        &format!("```{err}```"),
                    )
                    .await;
                },
            }
            return;
        }
        // First side of the handshake: invite the target to reciprocate.
        let instructions = format!(
            "You have {} seconds to reply `{}bind {from}`",
            BIND_REQUEST_TTL.as_secs(),
            self.prefix
        );
        if let Err(err) = self
            .platform
            .send_notice(to, &format!("Binding request from {from}"), &instructions)
            .await
        {
            warn!(from, to, error = %err, "failed to deliver binding request");
            self.notify(from, "Failed to send binding request", &format!("```{err}```"))
                .await;
            return;
        }
        self.pending.insert(from, to);
        info!(from, to, "binding request recorded");
        self.notify(from, "Binding request sent", "").await;
    }

    /// Handle `unbind` issued in `channel_id`.
    pub async fn handle_unbind(&self, channel_id: &str) {
        match self.store.delete_connection_by_channel(channel_id).await {
            Ok(()) => {
                info!(channel_id, "channel unbound");
                self.notify(channel_id, "Channel unbound successfully", "")
                    .await;
            },
            Err(err) => {
                warn!(channel_id, error = %err, "failed to unbind channel");
                self.notify(channel_id, "Failed to unbind channel", &format!("```{err}```"))
                    .await;
            },
        }
    }
}
