//! Basic type definitions for the chat relay
//!
//! - `SessionId`: UUID-based identifier for one client connection
//! - `MessageType`: kind of a chat message
//! - `Topic`: named broadcast channel

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique session identifier (newtype pattern)
///
/// Wraps a UUID v4. One per WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a chat message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    #[default]
    Chat,
    Join,
    Leave,
    Typing,
}

/// Broadcast channel an outbound payload is published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// CHAT, JOIN and LEAVE messages
    Messages,
    /// User list snapshots and departed usernames
    Users,
    /// Ephemeral typing indicators
    Typing,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Topic::Messages => "messages",
            Topic::Users => "users",
            Topic::Typing => "typing",
        };
        f.write_str(name)
    }
}
