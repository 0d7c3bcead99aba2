//! Chat engine
//!
//! The single entry point for inbound chat events. Each handler validates,
//! mutates the shared state and returns the broadcasts to publish; sending
//! them is left to the caller so the engine runs without a transport.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::color::ColorAllocator;
use crate::error::ValidationError;
use crate::history::{HistoryBuffer, MAX_HISTORY_SIZE};
use crate::message::{Broadcast, ChatMessage, Payload, User};
use crate::presence::PresenceRegistry;
use crate::types::{MessageType, Topic};
use crate::validation;

/// Inbound event, already decoded from the transport
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Client posted a message; `kind` defaults to CHAT
    Send {
        sender: String,
        content: String,
        kind: Option<MessageType>,
    },
    /// Client announced itself
    Join { username: String },
    /// Session ended; `username` is whatever the session was bound to
    Leave { username: Option<String> },
    /// Client is typing
    Typing { sender: String },
}

/// Shared chat-room state: colors, presence and history
#[derive(Debug)]
pub struct ChatEngine {
    colors: Arc<ColorAllocator>,
    presence: PresenceRegistry,
    history: HistoryBuffer,
}

impl ChatEngine {
    /// Create an engine whose history keeps at most `history_capacity` messages
    pub fn new(history_capacity: usize) -> Self {
        let colors = Arc::new(ColorAllocator::new());
        Self {
            presence: PresenceRegistry::new(Arc::clone(&colors)),
            colors,
            history: HistoryBuffer::new(history_capacity),
        }
    }

    /// Dispatch one event to its handler
    pub fn handle(&self, event: ChatEvent) -> Result<Vec<Broadcast>, ValidationError> {
        match event {
            ChatEvent::Send {
                sender,
                content,
                kind,
            } => {
                let message = self.process_message(&sender, &content, kind)?;
                Ok(vec![Broadcast::message(Topic::Messages, message)])
            }
            ChatEvent::Join { username } => self.join(&username),
            ChatEvent::Leave { username } => Ok(self.leave(username.as_deref())),
            ChatEvent::Typing { sender } => Ok(vec![self.typing(sender)]),
        }
    }

    /// Validate, sanitize, color and store a message
    ///
    /// On error nothing is stored.
    pub fn process_message(
        &self,
        sender: &str,
        content: &str,
        kind: Option<MessageType>,
    ) -> Result<ChatMessage, ValidationError> {
        if let Err(e) = validation::validate(sender, content) {
            warn!("Validation error from '{}': {}", sender, e);
            return Err(e);
        }
        let sender = sender.trim();

        let message = ChatMessage {
            id: None,
            sender: sender.to_string(),
            content: Some(validation::sanitize(content)),
            kind: kind.unwrap_or_default(),
            timestamp: None,
            color: Some(self.colors.color_for(sender).to_string()),
        };
        let message = self.history.append(message);

        info!(
            "Message {} processed from {}",
            message.id.unwrap_or_default(),
            message.sender
        );
        debug!("History size: {}", self.history.len());
        Ok(message)
    }

    /// Register a new session as `username` and announce it
    ///
    /// Returns the JOIN message for "messages" followed by the user list for "users".
    pub fn join(&self, username: &str) -> Result<Vec<Broadcast>, ValidationError> {
        self.announce_join(username, true)
    }

    /// Re-announce `username` for a session that already joined under it
    pub fn rejoin(&self, username: &str) -> Result<Vec<Broadcast>, ValidationError> {
        self.announce_join(username, false)
    }

    fn announce_join(
        &self,
        username: &str,
        new_session: bool,
    ) -> Result<Vec<Broadcast>, ValidationError> {
        validation::validate_sender(username)?;
        let username = username.trim();

        let user = if new_session {
            self.presence.add_user(username)
        } else {
            self.presence.refresh(username)
        };
        info!("User joined: {}", username);
        debug!(
            "Users online: {}, colors assigned: {}",
            self.presence.len(),
            self.colors.assigned_count()
        );

        let message = ChatMessage::system(
            MessageType::Join,
            username,
            format!("{} joined the chat!", username),
            &user.color,
        );
        Ok(vec![
            Broadcast::message(Topic::Messages, message),
            Broadcast {
                topic: Topic::Users,
                payload: Payload::Users(self.presence.list_users()),
            },
        ])
    }

    /// Release the username bound to a closing session and announce it
    ///
    /// The user stays online while other sessions still hold the name.
    /// A session that never joined produces nothing.
    pub fn leave(&self, username: Option<&str>) -> Vec<Broadcast> {
        let Some(username) = username else {
            debug!("Anonymous session closed, nothing to announce");
            return Vec::new();
        };

        if !self.presence.release(username) {
            debug!("'{}' is still held by another session or already gone", username);
        }
        info!("User left: {}", username);
        debug!("Users online: {}", self.presence.len());

        let message = ChatMessage::system(
            MessageType::Leave,
            username,
            format!("{} left the chat", username),
            self.colors.color_for(username),
        );
        vec![
            Broadcast::message(Topic::Messages, message),
            Broadcast {
                topic: Topic::Users,
                payload: Payload::Username(username.to_string()),
            },
        ]
    }

    /// Typing indicator; never stored
    pub fn typing(&self, sender: String) -> Broadcast {
        Broadcast::message(Topic::Typing, ChatMessage::typing(sender.trim().to_string()))
    }

    /// Up to `limit` most recent messages, oldest first
    pub fn recent_messages(&self, limit: usize) -> Vec<ChatMessage> {
        self.history.recent(limit)
    }

    /// Snapshot of the online users
    pub fn active_users(&self) -> Vec<User> {
        self.presence.list_users()
    }
}

impl Default for ChatEngine {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PALETTE;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::thread;

    fn send(sender: &str, content: &str) -> ChatEvent {
        ChatEvent::Send {
            sender: sender.to_string(),
            content: content.to_string(),
            kind: None,
        }
    }

    fn only_message(broadcasts: &[Broadcast]) -> &ChatMessage {
        match &broadcasts[0].payload {
            Payload::Message(m) => m,
            other => panic!("expected message payload, got {:?}", other),
        }
    }

    #[test]
    fn test_process_valid_message() {
        let engine = ChatEngine::default();
        let before = Utc::now();
        let msg = engine.process_message("Ann", "<b>hi</b>", None).unwrap();
        let after = Utc::now();

        assert_eq!(msg.sender, "Ann");
        assert_eq!(msg.content.as_deref(), Some("&lt;b&gt;hi&lt;/b&gt;"));
        assert_eq!(msg.kind, MessageType::Chat);
        assert_eq!(msg.color.as_deref(), Some(PALETTE[0]));
        assert_eq!(msg.id, Some(1));

        let ts = msg.timestamp.unwrap();
        assert!(before <= ts && ts <= after);
        assert_eq!(engine.recent_messages(50), vec![msg]);
    }

    #[test]
    fn test_explicit_type_is_kept() {
        let engine = ChatEngine::default();
        let msg = engine
            .process_message("Ann", "hi", Some(MessageType::Join))
            .unwrap();
        assert_eq!(msg.kind, MessageType::Join);
    }

    #[test]
    fn test_empty_sender_rejected_without_mutation() {
        let engine = ChatEngine::default();
        let result = engine.handle(send("", "hi"));

        assert_eq!(result, Err(ValidationError::EmptySender));
        assert!(engine.recent_messages(50).is_empty());
    }

    #[test]
    fn test_too_long_rejected() {
        let engine = ChatEngine::default();
        let err = engine.handle(send("Ann", &"a".repeat(501))).unwrap_err();

        assert!(err.to_string().contains("500"));
        assert!(engine.recent_messages(50).is_empty());
    }

    #[test]
    fn test_chat_broadcasts_on_messages_topic() {
        let engine = ChatEngine::default();
        let out = engine.handle(send("Ann", "hello")).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].topic, Topic::Messages);
        assert_eq!(only_message(&out).content.as_deref(), Some("hello"));
    }

    #[test]
    fn test_join_broadcasts_message_then_users() {
        let engine = ChatEngine::default();
        let out = engine
            .handle(ChatEvent::Join {
                username: "Bob".to_string(),
            })
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].topic, Topic::Messages);
        let join = only_message(&out);
        assert_eq!(join.kind, MessageType::Join);
        assert_eq!(join.content.as_deref(), Some("Bob joined the chat!"));
        assert!(join.timestamp.is_some());

        assert_eq!(out[1].topic, Topic::Users);
        match &out[1].payload {
            Payload::Users(users) => {
                assert_eq!(users.len(), 1);
                assert_eq!(users[0].username, "Bob");
            }
            other => panic!("expected user list, got {:?}", other),
        }
        // system messages are not part of history
        assert!(engine.recent_messages(50).is_empty());
    }

    #[test]
    fn test_join_blank_username_rejected() {
        let engine = ChatEngine::default();
        assert_eq!(engine.join("  "), Err(ValidationError::EmptySender));
        assert!(engine.active_users().is_empty());
    }

    #[test]
    fn test_leave_broadcasts_message_then_username() {
        let engine = ChatEngine::default();
        engine.join("Bob").unwrap();
        let out = engine.leave(Some("Bob"));

        assert_eq!(out.len(), 2);
        let leave = only_message(&out);
        assert_eq!(leave.kind, MessageType::Leave);
        assert_eq!(leave.content.as_deref(), Some("Bob left the chat"));
        assert_eq!(out[1].topic, Topic::Users);
        assert_eq!(out[1].payload, Payload::Username("Bob".to_string()));
        assert!(engine.active_users().is_empty());
    }

    #[test]
    fn test_leave_without_username_is_silent() {
        let engine = ChatEngine::default();
        let out = engine.handle(ChatEvent::Leave { username: None }).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_redundant_leave_is_not_an_error() {
        let engine = ChatEngine::default();
        engine.join("Bob").unwrap();
        engine.leave(Some("Bob"));
        let out = engine.leave(Some("Bob"));
        assert_eq!(out.len(), 2);
        assert!(engine.active_users().is_empty());
    }

    #[test]
    fn test_join_join_leave_leaves_carol() {
        let engine = ChatEngine::default();
        engine.join("Bob").unwrap();
        engine.join("Carol").unwrap();
        engine.leave(Some("Bob"));

        let users = engine.active_users();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "Carol");
    }

    #[test]
    fn test_typing_is_not_stored() {
        let engine = ChatEngine::default();
        let out = engine
            .handle(ChatEvent::Typing {
                sender: "Ann".to_string(),
            })
            .unwrap();

        assert_eq!(out[0].topic, Topic::Typing);
        let typing = only_message(&out);
        assert_eq!(typing.kind, MessageType::Typing);
        assert!(typing.content.is_none());
        assert!(engine.recent_messages(50).is_empty());
    }

    #[test]
    fn test_rejoin_keeps_color() {
        let engine = ChatEngine::default();
        engine.join("Ann").unwrap();
        engine.join("Bob").unwrap();
        let before = engine.process_message("Ann", "hi", None).unwrap().color;
        engine.leave(Some("Ann"));
        engine.join("Ann").unwrap();
        let after = engine.process_message("Ann", "back", None).unwrap().color;

        assert_eq!(before, after);
    }

    #[test]
    fn test_chat_color_matches_presence_color() {
        let engine = ChatEngine::default();
        engine.join("Ann").unwrap();
        let msg = engine.process_message("Ann", "hi", None).unwrap();
        assert_eq!(msg.color.as_deref(), Some(engine.active_users()[0].color.as_str()));
    }

    #[test]
    fn test_padded_sender_matches_joined_user() {
        let engine = ChatEngine::default();
        engine.join("Ann ").unwrap();
        let msg = engine.process_message("Ann ", "hi", None).unwrap();
        let typing = engine.typing(" Ann".to_string());

        let users = engine.active_users();
        assert_eq!(users[0].username, "Ann");
        assert_eq!(msg.sender, "Ann");
        assert_eq!(msg.color.as_deref(), Some(users[0].color.as_str()));
        match typing.payload {
            Payload::Message(m) => assert_eq!(m.sender, "Ann"),
            other => panic!("expected message payload, got {:?}", other),
        }
        assert_eq!(engine.colors.assigned_count(), 1);
    }

    #[test]
    fn test_shared_username_survives_one_leave() {
        let engine = ChatEngine::default();
        engine.join("Ann").unwrap();
        engine.join("Ann").unwrap();

        let out = engine.leave(Some("Ann"));
        assert_eq!(out.len(), 2);
        assert_eq!(engine.active_users().len(), 1);

        engine.leave(Some("Ann"));
        assert!(engine.active_users().is_empty());
    }

    #[test]
    fn test_rejoin_does_not_add_a_holder() {
        let engine = ChatEngine::default();
        engine.join("Ann").unwrap();
        engine.rejoin("Ann").unwrap();

        engine.leave(Some("Ann"));
        assert!(engine.active_users().is_empty());
    }

    #[test]
    fn test_recent_messages() {
        let engine = ChatEngine::default();
        for i in 0..10 {
            engine
                .process_message(&format!("User{}", i), &format!("Message {}", i), None)
                .unwrap();
        }

        assert_eq!(engine.recent_messages(20).len(), 10);
        let last_five = engine.recent_messages(5);
        assert_eq!(last_five.len(), 5);
        assert_eq!(last_five[0].content.as_deref(), Some("Message 5"));
    }

    #[test]
    fn test_concurrent_joins_get_distinct_colors() {
        let engine = ChatEngine::default();
        thread::scope(|s| {
            for i in 0..PALETTE.len() {
                let engine = &engine;
                s.spawn(move || engine.join(&format!("user{}", i)).unwrap());
            }
        });

        let users = engine.active_users();
        let colors: HashSet<&str> = users.iter().map(|u| u.color.as_str()).collect();
        assert_eq!(users.len(), PALETTE.len());
        assert_eq!(colors.len(), PALETTE.len());
    }
}
