//! In-memory store for tests and ephemeral runs.

use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;

use crate::{
    Error, Result,
    store::{ChannelRetention, ConnectionStore},
};

#[derive(Default)]
struct State {
    connections: Vec<(String, String)>,
    locked: HashSet<String>,
}

/// In-memory `ConnectionStore` backed by plain collections. No persistence.
pub struct InMemoryStore {
    state: Mutex<State>,
    retention: ChannelRetention,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_retention(ChannelRetention::Keep)
    }

    pub fn with_retention(retention: ChannelRetention) -> Self {
        Self {
            state: Mutex::new(State::default()),
            retention,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectionStore for InMemoryStore {
    async fn create_connection(&self, a: &str, b: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for id in [a, b] {
            if state
                .connections
                .iter()
                .any(|(first, second)| first == id || second == id)
            {
                return Err(Error::already_connected(id));
            }
        }
        state.connections.push((a.to_string(), b.to_string()));
        Ok(())
    }

    async fn paired_channel(&self, channel_id: &str) -> Result<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for (first, second) in &state.connections {
            if first == channel_id {
                return Ok(second.clone());
            }
            if second == channel_id {
                return Ok(first.clone());
            }
        }
        Err(Error::NotFound)
    }

    async fn delete_connection_by_channel(&self, channel_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(index) = state
            .connections
            .iter()
            .position(|(first, second)| first == channel_id || second == channel_id)
        else {
            return Err(Error::NotFound);
        };
        let (first, second) = state.connections.remove(index);
        if self.retention == ChannelRetention::Delete {
            // Dropping the channel rows also drops their lock flags.
            state.locked.remove(first.as_str());
            state.locked.remove(second.as_str());
        }
        Ok(())
    }

    async fn set_locked(&self, channel_id: &str, locked: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if locked {
            state.locked.insert(channel_id.to_string());
        } else {
            state.locked.remove(channel_id);
        }
        Ok(())
    }

    async fn is_locked(&self, channel_id: &str) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.locked.contains(channel_id)
    }
}
