//! Error types shared across the library

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoBurnError {
    /// The media library refused access. Recoverable by asking again.
    #[error("Permission to access the media library was denied")]
    PermissionDenied,

    #[error("Failed to fetch media page: {0}")]
    FetchFailed(String),

    #[error("Failed to move items to trash: {0}")]
    DeleteFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PhotoBurnError>;
