//! Session lifecycle
//!
//! Maps one connection's decoded frames and its disconnect onto engine
//! calls, and remembers which username the connection joined as.

use tracing::{debug, warn};

use crate::engine::{ChatEngine, ChatEvent};
use crate::error::AppError;
use crate::message::{Broadcast, ClientMessage, ServerMessage, DEFAULT_RECENT_LIMIT};
use crate::types::SessionId;
use crate::validation;

/// What to do after handling one inbound frame
#[derive(Debug, Default)]
pub struct Dispatch {
    /// Publish to every session
    pub broadcasts: Vec<Broadcast>,
    /// Send to the originating session only
    pub reply: Option<ServerMessage>,
}

impl Dispatch {
    fn broadcast(broadcasts: Vec<Broadcast>) -> Self {
        Self {
            broadcasts,
            reply: None,
        }
    }

    fn reply(msg: ServerMessage) -> Self {
        Self {
            broadcasts: Vec::new(),
            reply: Some(msg),
        }
    }
}

/// State of a single client connection
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    /// Bound on JOIN, None before
    username: Option<String>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self { id, username: None }
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Handle one decoded client frame
    pub fn on_message(&mut self, engine: &ChatEngine, msg: ClientMessage) -> Dispatch {
        match msg {
            ClientMessage::SendMessage {
                sender,
                content,
                message_type,
            } => dispatch(
                engine,
                ChatEvent::Send {
                    sender,
                    content,
                    kind: message_type,
                },
            ),
            ClientMessage::AddUser { sender } => self.join(engine, sender),
            ClientMessage::Typing { sender } => dispatch(engine, ChatEvent::Typing { sender }),
            ClientMessage::RecentMessages { limit } => {
                let messages = engine.recent_messages(limit.unwrap_or(DEFAULT_RECENT_LIMIT));
                Dispatch::reply(ServerMessage::RecentMessages { messages })
            }
            ClientMessage::ActiveUsers => Dispatch::reply(ServerMessage::ActiveUsers {
                users: engine.active_users(),
            }),
        }
    }

    /// The connection closed; announce the bound user leaving, if any
    pub fn on_disconnect(self, engine: &ChatEngine) -> Vec<Broadcast> {
        debug!("Session {} closing", self.id);
        engine
            .handle(ChatEvent::Leave {
                username: self.username,
            })
            .unwrap_or_default()
    }

    fn join(&mut self, engine: &ChatEngine, sender: String) -> Dispatch {
        if let Err(e) = validation::validate_sender(&sender) {
            warn!("Session {} rejected join: {}", self.id, e);
            return Dispatch::reply(AppError::from(e).into());
        }
        let username = sender.trim().to_string();

        // Leave under the old name first so the user list sent with the JOIN is current
        let rejoining = self.username.as_deref() == Some(username.as_str());
        let mut broadcasts = match self.username.take() {
            Some(previous) if !rejoining => {
                debug!("Session {} renamed '{}' -> '{}'", self.id, previous, username);
                engine.leave(Some(&previous))
            }
            _ => Vec::new(),
        };

        let mut outcome = if rejoining {
            match engine.rejoin(&username) {
                Ok(joined) => Dispatch::broadcast(joined),
                Err(e) => Dispatch::reply(AppError::from(e).into()),
            }
        } else {
            dispatch(engine, ChatEvent::Join { username: sender })
        };
        if outcome.reply.is_none() {
            self.username = Some(username);
        }
        broadcasts.append(&mut outcome.broadcasts);
        outcome.broadcasts = broadcasts;
        outcome
    }
}

/// Run an event through the engine; validation failures go back privately
fn dispatch(engine: &ChatEngine, event: ChatEvent) -> Dispatch {
    match engine.handle(event) {
        Ok(broadcasts) => Dispatch::broadcast(broadcasts),
        Err(e) => Dispatch::reply(AppError::from(e).into()),
    }
}
