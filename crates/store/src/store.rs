//! Persistence trait for channel connections and lock flags.

use async_trait::async_trait;

use crate::Result;

/// What happens to channel rows when their connection is unbound.
///
/// `Keep` preserves the lock flag across re-binds; `Delete` frees the
/// identifiers entirely (the connection row goes away either way).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelRetention {
    #[default]
    Keep,
    Delete,
}

/// Durable record of channels, their pairwise connections, and lock flags.
///
/// Uniqueness is the store's job: no channel id may participate in two
/// simultaneous connections, and racing writers are resolved by the store
/// rejecting the loser, not by application-level locking.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Create a connection between `a` and `b`, lazily creating channel
    /// rows. Fails with [`crate::Error::AlreadyConnected`] when either
    /// side is already part of a connection.
    async fn create_connection(&self, a: &str, b: &str) -> Result<()>;

    /// The other channel in `channel_id`'s connection, or
    /// [`crate::Error::NotFound`].
    async fn paired_channel(&self, channel_id: &str) -> Result<String>;

    /// Remove `channel_id`'s connection (and, under
    /// [`ChannelRetention::Delete`], both channel rows). Fails with
    /// [`crate::Error::NotFound`] when there is no connection.
    async fn delete_connection_by_channel(&self, channel_id: &str) -> Result<()>;

    /// Upsert the lock flag on a channel row. Idempotent.
    async fn set_locked(&self, channel_id: &str, locked: bool) -> Result<()>;

    /// Current lock flag. Absent rows and read failures both report
    /// unlocked; a failed read is logged, never propagated.
    async fn is_locked(&self, channel_id: &str) -> bool;
}
