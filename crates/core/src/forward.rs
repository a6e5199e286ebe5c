//! The forwarding engine: relay a plain message to the paired channel.

use tracing::{debug, error, warn};

use crate::{
    platform::{Marker, PlatformError, PlatformMessage},
    service::Relay,
};

/// Outgoing body: text, then attachment URLs, space-separated. No leading
/// separator when there is no text, no trailing run without attachments.
pub(crate) fn compose(content: &str, attachment_urls: &[String]) -> String {
    if attachment_urls.is_empty() {
        return content.to_string();
    }
    let urls = attachment_urls.join(" ");
    if content.is_empty() {
        urls
    } else {
        format!("{content} {urls}")
    }
}

impl Relay {
    /// Decide whether and where to relay an inbound plain message.
    /// At-most-once: a send failure is marked and dropped, never retried.
    pub async fn forward_inbound(&self, message: &PlatformMessage) {
        if message.author_is_bot {
            return;
        }
        let destination = match self.store.paired_channel(&message.channel_id).await {
            Ok(destination) => destination,
            Err(err) if err.is_not_found() => return,
            Err(err) => {
                error!(channel_id = %message.channel_id, error = %err, "failed to resolve paired channel");
                return;
            },
        };
        if self.store.is_locked(&destination).await {
            debug!(
                from = %message.channel_id,
                to = %destination,
                message_id = %message.id,
                "destination is locked, deferring"
            );
            self.mark(message, Marker::Pending).await;
            return;
        }
        match self.deliver(message, &destination).await {
            Ok(()) => self.mark(message, Marker::Delivered).await,
            Err(err) => {
                warn!(
                    from = %message.channel_id,
                    to = %destination,
                    message_id = %message.id,
                    error = %err,
                    "failed to forward message"
                );
                self.mark(message, Marker::Failed).await;
            },
        }
    }

    /// Compose and send one message to `destination`.
    pub(crate) async fn deliver(
        &self,
        message: &PlatformMessage,
        destination: &str,
    ) -> Result<(), PlatformError> {
        debug!(
            from = %message.channel_id,
            to = %destination,
            message_id = %message.id,
            "forwarding message"
        );
        self.platform
            .send_text(destination, &compose(&message.content, &message.attachment_urls))
            .await
    }
}
