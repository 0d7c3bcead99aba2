//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum
//! for type-safe serialization/deserialization, plus the payload types the
//! engine publishes on each topic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::{MessageType, Topic};

/// Default number of messages returned by a recent-history query
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// A chat message as stored in history and broadcast to clients
///
/// Immutable once built. `content` is already sanitized for CHAT messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// History sequence number, set when the message is appended
    pub id: Option<u64>,
    pub sender: String,
    /// None for typing indicators
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// None for typing indicators
    pub timestamp: Option<DateTime<Utc>>,
    pub color: Option<String>,
}

impl ChatMessage {
    /// System message announcing a join or leave
    pub fn system(kind: MessageType, sender: &str, content: String, color: &str) -> Self {
        Self {
            id: None,
            sender: sender.to_string(),
            content: Some(content),
            kind,
            timestamp: Some(Utc::now()),
            color: Some(color.to_string()),
        }
    }

    /// Ephemeral typing indicator carrying only the sender
    pub fn typing(sender: String) -> Self {
        Self {
            id: None,
            sender,
            content: None,
            kind: MessageType::Typing,
            timestamp: None,
            color: None,
        }
    }
}

/// A user currently present in the chat
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub color: String,
    pub online: bool,
}

/// Payload published on a topic
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// A CHAT, JOIN, LEAVE or TYPING message
    Message(ChatMessage),
    /// Full user list snapshot
    Users(Vec<User>),
    /// Username of a user who left
    Username(String),
}

/// One outbound broadcast produced by the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Broadcast {
    pub topic: Topic,
    pub payload: Payload,
}

impl Broadcast {
    pub fn message(topic: Topic, message: ChatMessage) -> Self {
        Self {
            topic,
            payload: Payload::Message(message),
        }
    }
}

/// Client → Server message
///
/// All messages from client to server. Uses tagged enum with snake_case naming.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Post a chat message
    SendMessage {
        sender: String,
        content: String,
        #[serde(default)]
        message_type: Option<MessageType>,
    },
    /// Announce presence and bind the session to `sender`
    AddUser { sender: String },
    /// Typing indicator
    Typing { sender: String },
    /// Ask for recent history
    RecentMessages {
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Ask for the current user list
    ActiveUsers,
}

/// Server → Client message
///
/// All messages from server to client. Uses tagged enum with snake_case naming.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection successful, session ID issued
    Connected { session_id: String },
    /// Payload published on a topic
    Broadcast { topic: Topic, payload: Payload },
    /// Reply to a recent-history query
    RecentMessages { messages: Vec<ChatMessage> },
    /// Reply to an active-users query
    ActiveUsers { users: Vec<User> },
    /// Error occurred (sent to the originating session only)
    Error { code: ErrorCode, message: String },
}

impl From<Broadcast> for ServerMessage {
    fn from(broadcast: Broadcast) -> Self {
        ServerMessage::Broadcast {
            topic: broadcast.topic,
            payload: broadcast.payload,
        }
    }
}

/// Error codes for ServerMessage::Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Sender or content rejected
    ValidationFailed,
    /// Frame could not be decoded
    InvalidMessage,
    /// Anything else
    InternalError,
}

/// Convert AppError to ServerMessage for client notification
impl From<AppError> for ServerMessage {
    fn from(err: AppError) -> Self {
        let (code, message) = match &err {
            AppError::Validation(e) => (ErrorCode::ValidationFailed, e.to_string()),
            AppError::Json(e) => (ErrorCode::InvalidMessage, format!("Invalid message format: {}", e)),
            _ => (ErrorCode::InternalError, "Internal error".to_string()),
        };
        ServerMessage::Error { code, message }
    }
}
