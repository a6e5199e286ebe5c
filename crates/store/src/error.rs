use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The channel has no connection. Expected for most channels; callers
    /// usually swallow this.
    #[error("channel has no connection")]
    NotFound,

    /// The channel already participates in a connection, or the pair
    /// already exists.
    #[error("channel is already connected: {channel_id}")]
    AlreadyConnected { channel_id: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl Error {
    #[must_use]
    pub fn already_connected(channel_id: impl Into<String>) -> Self {
        Self::AlreadyConnected {
            channel_id: channel_id.into(),
        }
    }

    /// Whether this error is the non-fatal "no connection" case.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Whether this error is a uniqueness/constraint rejection.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::AlreadyConnected { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
