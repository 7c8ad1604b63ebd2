//! Error types of the navigation core

use thiserror::Error;

/// Failures reported by a message source collaborator.
///
/// A missing message is not a failure; sources report it as `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Message source unavailable: {0}")]
    Unavailable(String),

    #[error("Message source request cancelled")]
    Cancelled,

    #[error("Message source error: {0}")]
    Other(String),
}

/// Errors surfaced to callers of a navigation step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Failed to resolve {direction} message on '{topic}': {source}")]
    Source {
        topic: String,
        direction: crate::navigation::Direction,
        #[source]
        source: SourceError,
    },

    #[error("Failed to discover boundaries of '{topic}': {source}")]
    Discovery {
        topic: String,
        #[source]
        source: SourceError,
    },
}

/// Errors loading a session configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
