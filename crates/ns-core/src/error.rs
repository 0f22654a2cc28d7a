//! Error taxonomy shared by every dataset source and the navigator

use thiserror::Error;

/// Errors that can occur while browsing a dataset
#[derive(Error, Debug)]
pub enum DatasetError {
    /// The dataset root (local path or remote prefix) cannot be reached
    #[error("No such nuScenes dataset on: {0}")]
    DatasetNotFound(String),

    /// The navigator or an index was asked for something it cannot answer
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The remote store failed; carried unchanged from the transport
    #[error("Transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// A dataset file whose timestamp part is not a decimal integer
    #[error("Malformed {kind} filename: {filename}")]
    MalformedFilename {
        filename: String,
        kind: String,
    },

    /// A category or sensor name that is not part of the dataset layout
    #[error("Unknown {what}: {value}")]
    UnknownName {
        what: &'static str,
        value: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local cache snapshot could not be read or written
    #[error("Cache error: {0}")]
    Cache(String),
}

impl DatasetError {
    /// Wrap any transport-level failure
    pub fn transport<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DatasetError::Transport(error.into())
    }

    /// Whether this error means the dataset itself is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetError::DatasetNotFound(_))
    }
}

/// Result alias used across the dataset crates
pub type Result<T> = std::result::Result<T, DatasetError>;
