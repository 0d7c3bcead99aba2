//! Multi-user WebSocket Chat Relay Library
//!
//! Clients connect, announce themselves, post short text messages and
//! receive a live broadcast of every message and presence change, plus a
//! bounded recent-history replay on request.
//!
//! # Features
//! - Presence registry with stable per-user colors
//! - Input validation and markup escaping
//! - Bounded recent-message history
//! - Topic broadcasts: `messages`, `users`, `typing`
//! - Private error and query replies
//!
//! # Architecture
//! - `ChatEngine` owns the shared state behind per-structure locks and turns
//!   each inbound event into a list of broadcasts without touching the network
//! - `BroadcastHub` fans those broadcasts out to every session
//! - Each connection runs a `handler` task with a `Session` that remembers the
//!   username it joined as, so disconnects can be announced
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use chat_relay::{ChatServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default();
//!     let listener = TcpListener::bind(&config.addr).await.unwrap();
//!     ChatServer::new(&config).run(listener).await;
//! }
//! ```

pub mod broadcast;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod history;
pub mod message;
pub mod presence;
pub mod server;
pub mod session;
pub mod types;
pub mod validation;

// Re-export main types for convenience
pub use broadcast::BroadcastHub;
pub use color::{ColorAllocator, PALETTE};
pub use config::Config;
pub use engine::{ChatEngine, ChatEvent};
pub use error::{AppError, ConfigError, ValidationError};
pub use handler::handle_connection;
pub use history::HistoryBuffer;
pub use message::{Broadcast, ChatMessage, ClientMessage, ErrorCode, Payload, ServerMessage, User};
pub use presence::PresenceRegistry;
pub use server::ChatServer;
pub use session::{Dispatch, Session};
pub use types::{MessageType, SessionId, Topic};
