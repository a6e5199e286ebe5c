//! Bulk message cleanup: `clear` and `clearother`.

use tracing::{debug, error, info, warn};

use crate::{
    platform::{PlatformError, PlatformMessage},
    service::Relay,
};

/// Messages fetched (and deleted) per batch.
pub(crate) const CLEAR_BATCH: u8 = 99;

impl Relay {
    /// Delete recent messages. With `other` unset this clears everything
    /// older than the command (plus the command itself) in the issuing
    /// channel; with `other` set it clears the paired channel instead.
    /// Failures are logged, never surfaced to the user.
    pub async fn handle_clear(&self, command: &PlatformMessage, other: bool) {
        let (channel, cursor) = if other {
            match self.store.paired_channel(&command.channel_id).await {
                Ok(paired) => (paired, None),
                Err(err) => {
                    error!(channel_id = %command.channel_id, error = %err, "clearother aborted, no paired channel");
                    return;
                },
            }
        } else {
            (command.channel_id.clone(), Some(command.id.clone()))
        };
        let mut include_command = !other;
        loop {
            let messages = match self
                .platform
                .recent_messages(&channel, CLEAR_BATCH, cursor.as_deref())
                .await
            {
                Ok(messages) => messages,
                Err(err) => {
                    error!(channel_id = %channel, error = %err, "failed to fetch messages to clear");
                    return;
                },
            };
            if messages.is_empty() {
                return;
            }
            let full_batch = messages.len() == CLEAR_BATCH as usize;
            let mut ids = Vec::with_capacity(messages.len() + 1);
            if include_command {
                ids.push(command.id.clone());
                include_command = false;
            }
            ids.extend(messages.into_iter().map(|m| m.id));
            info!(channel_id = %channel, count = ids.len(), "deleting messages");
            match self.platform.delete_messages(&channel, &ids).await {
                Ok(()) => {},
                Err(PlatformError::BulkDeleteUnsupported) => {
                    // Platform won't take the batch (age limit). One at a
                    // time instead, stopping at the first failure.
                    debug!(channel_id = %channel, "bulk delete rejected, deleting one at a time");
                    for id in &ids {
                        if let Err(err) = self.platform.delete_message(&channel, id).await {
                            warn!(channel_id = %channel, message_id = %id, error = %err, "failed to delete message");
                            return;
                        }
                    }
                },
                Err(err) => {
                    warn!(channel_id = %channel, error = %err, "failed to delete messages");
                    return;
                },
            }
            // A full batch means there is probably more backlog.
            if !full_batch {
                return;
            }
        }
    }
}
