//! Transient cache of one-sided bind requests awaiting reciprocation.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use {dashmap::DashMap, tokio::task::JoinHandle, tracing::debug};

/// How long a bind request waits for its reciprocal before expiring.
pub const BIND_REQUEST_TTL: Duration = Duration::from_secs(60);

/// Upper bound on outstanding requests across all channel pairs.
pub const MAX_PENDING_REQUESTS: usize = 1000;

/// TTL-expiring store of pending bind requests, keyed by the ordered pair
/// `from-to`. An absent entry means "no outstanding request" whether it
/// expired, was consumed, or never existed. Safe for concurrent use.
pub struct PendingBinds {
    entries: DashMap<String, Instant>,
    ttl: Duration,
    capacity: usize,
}

impl PendingBinds {
    pub fn new() -> Self {
        Self::with_settings(BIND_REQUEST_TTL, MAX_PENDING_REQUESTS)
    }

    pub fn with_settings(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity,
        }
    }

    fn key(from: &str, to: &str) -> String {
        format!("{from}-{to}")
    }

    /// Record a request from `from` to `to`, refreshing any prior one for
    /// the same pair. At capacity, the entry closest to expiry is evicted.
    pub fn insert(&self, from: &str, to: &str) {
        let key = Self::key(from, to);
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_earliest();
        }
        self.entries.insert(key, Instant::now() + self.ttl);
    }

    /// Consume the request from `from` to `to` if one is still live.
    pub fn take(&self, from: &str, to: &str) -> bool {
        match self.entries.remove(&Self::key(from, to)) {
            Some((_, deadline)) => deadline > Instant::now(),
            None => false,
        }
    }

    /// Whether a live request from `from` to `to` exists.
    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.entries
            .get(&Self::key(from, to))
            .is_some_and(|entry| *entry.value() > Instant::now())
    }

    /// Purge expired entries. The janitor calls this on a fixed cadence;
    /// expiry is silent by design.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, deadline| *deadline > now);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_earliest(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| *entry.value())
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            debug!(key, "pending-bind cache full, evicting earliest entry");
            self.entries.remove(&key);
        }
    }

    /// Spawn the background sweep task.
    pub fn spawn_janitor(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tick.tick().await;
                self.sweep();
            }
        })
    }
}

impl Default for PendingBinds {
    fn default() -> Self {
        Self::new()
    }
}
