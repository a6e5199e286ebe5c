//! Recording platform double and message builders for core tests.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;

use crate::platform::{ChatPlatform, Marker, PlatformError, PlatformMessage, PlatformResult};

/// A visible effect emitted through the platform interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Text {
        channel: String,
        body: String,
    },
    Notice {
        channel: String,
        title: String,
        body: String,
    },
    MarkerAdded {
        channel: String,
        message: String,
        marker: Marker,
    },
    MarkerRemoved {
        channel: String,
        message: String,
        marker: Marker,
    },
    Deleted {
        channel: String,
        message: String,
    },
    BulkDeleted {
        channel: String,
        ids: Vec<String>,
    },
}

/// Test platform that records every effect and serves canned history.
#[derive(Default)]
pub struct RecordingPlatform {
    effects: Mutex<Vec<Effect>>,
    history: Mutex<HashMap<String, Vec<PlatformMessage>>>,
    fail_text_to: Mutex<HashSet<String>>,
    fail_notice_to: Mutex<HashSet<String>>,
    bulk_delete_unsupported: AtomicBool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.effects.lock().unwrap().clone()
    }

    pub fn texts_sent_to(&self, channel: &str) -> Vec<String> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Text { channel: c, body } if c == channel => Some(body),
                _ => None,
            })
            .collect()
    }

    /// Seed a channel's history, newest first (the platform fetch order).
    pub fn set_history(&self, channel: &str, messages: Vec<PlatformMessage>) {
        self.history
            .lock()
            .unwrap()
            .insert(channel.to_string(), messages);
    }

    pub fn fail_text(&self, channel: &str) {
        self.fail_text_to.lock().unwrap().insert(channel.to_string());
    }

    pub fn fail_notice(&self, channel: &str) {
        self.fail_notice_to
            .lock()
            .unwrap()
            .insert(channel.to_string());
    }

    pub fn reject_bulk_delete(&self) {
        self.bulk_delete_unsupported.store(true, Ordering::SeqCst);
    }

    fn record(&self, effect: Effect) {
        self.effects.lock().unwrap().push(effect);
    }

    fn remove_from_history(&self, channel: &str, ids: &[String]) {
        if let Some(messages) = self.history.lock().unwrap().get_mut(channel) {
            messages.retain(|m| !ids.contains(&m.id));
        }
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    async fn send_text(&self, channel_id: &str, text: &str) -> PlatformResult<()> {
        if self.fail_text_to.lock().unwrap().contains(channel_id) {
            return Err(PlatformError::message("send rejected by test double"));
        }
        self.record(Effect::Text {
            channel: channel_id.to_string(),
            body: text.to_string(),
        });
        Ok(())
    }

    async fn send_notice(&self, channel_id: &str, title: &str, body: &str) -> PlatformResult<()> {
        if self.fail_notice_to.lock().unwrap().contains(channel_id) {
            return Err(PlatformError::message("notice rejected by test double"));
        }
        self.record(Effect::Notice {
            channel: channel_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    async fn add_marker(
        &self,
        channel_id: &str,
        message_id: &str,
        marker: Marker,
    ) -> PlatformResult<()> {
        self.record(Effect::MarkerAdded {
            channel: channel_id.to_string(),
            message: message_id.to_string(),
            marker,
        });
        Ok(())
    }

    async fn remove_marker(
        &self,
        channel_id: &str,
        message_id: &str,
        marker: Marker,
    ) -> PlatformResult<()> {
        self.record(Effect::MarkerRemoved {
            channel: channel_id.to_string(),
            message: message_id.to_string(),
            marker,
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> PlatformResult<()> {
        self.remove_from_history(channel_id, std::slice::from_ref(&message_id.to_string()));
        self.record(Effect::Deleted {
            channel: channel_id.to_string(),
            message: message_id.to_string(),
        });
        Ok(())
    }

    async fn delete_messages(
        &self,
        channel_id: &str,
        message_ids: &[String],
    ) -> PlatformResult<()> {
        if self.bulk_delete_unsupported.load(Ordering::SeqCst) {
            return Err(PlatformError::BulkDeleteUnsupported);
        }
        self.remove_from_history(channel_id, message_ids);
        self.record(Effect::BulkDeleted {
            channel: channel_id.to_string(),
            ids: message_ids.to_vec(),
        });
        Ok(())
    }

    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
        before: Option<&str>,
    ) -> PlatformResult<Vec<PlatformMessage>> {
        let history = self.history.lock().unwrap();
        let messages = history.get(channel_id).cloned().unwrap_or_default();
        let mut window: Vec<PlatformMessage> = match before {
            Some(cursor) => match messages.iter().position(|m| m.id == cursor) {
                Some(index) => messages[index + 1..].to_vec(),
                None => messages,
            },
            None => messages,
        };
        window.truncate(limit as usize);
        Ok(window)
    }
}

/// Build a plain user message.
pub fn msg(id: &str, channel: &str, content: &str) -> PlatformMessage {
    PlatformMessage {
        id: id.to_string(),
        channel_id: channel.to_string(),
        author_is_bot: false,
        content: content.to_string(),
        attachment_urls: Vec::new(),
        markers: Vec::new(),
    }
}

pub fn bot_msg(id: &str, channel: &str, content: &str) -> PlatformMessage {
    PlatformMessage {
        author_is_bot: true,
        ..msg(id, channel, content)
    }
}

pub fn marked(message: PlatformMessage, marker: Marker) -> PlatformMessage {
    let mut message = message;
    message.markers.push(marker);
    message
}
