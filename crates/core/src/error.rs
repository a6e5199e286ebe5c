use thiserror::Error;

use crate::platform::PlatformError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] relay_store::Error),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

pub type Result<T> = std::result::Result<T, Error>;
