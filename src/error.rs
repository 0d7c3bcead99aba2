//! Error types for the chat relay
//!
//! Defines application-level errors, input validation errors and
//! configuration errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::validation::MAX_MESSAGE_LENGTH;

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and
/// recoverable errors (sent privately back to the client).
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Rejected input; nothing was changed
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Inbound message rejected before touching shared state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Sender cannot be empty")]
    EmptySender,

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Message exceeds maximum length of {max}")]
    ContentTooLong { max: usize },
}

impl ValidationError {
    pub(crate) fn too_long() -> Self {
        ValidationError::ContentTooLong {
            max: MAX_MESSAGE_LENGTH,
        }
    }
}

/// Invalid runtime configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
}
