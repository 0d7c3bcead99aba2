//! Chat server
//!
//! Owns the shared engine and broadcast hub and runs the accept loop,
//! spawning one handler task per connection.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::broadcast::BroadcastHub;
use crate::config::Config;
use crate::engine::ChatEngine;
use crate::handler::handle_connection;

/// Everything a connection handler needs, shared across tasks
#[derive(Debug, Clone)]
pub struct ChatServer {
    engine: Arc<ChatEngine>,
    hub: BroadcastHub,
}

impl ChatServer {
    pub fn new(config: &Config) -> Self {
        Self {
            engine: Arc::new(ChatEngine::new(config.history_capacity)),
            hub: BroadcastHub::new(config.broadcast_capacity),
        }
    }

    /// Accept connections until the listener fails permanently
    ///
    /// Individual accept errors are logged and skipped.
    pub async fn run(self, listener: TcpListener) {
        if let Ok(addr) = listener.local_addr() {
            info!("Chat relay listening on {}", addr);
        }

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let engine = Arc::clone(&self.engine);
                    let hub = self.hub.clone();

                    // Spawn handler task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, engine, hub).await {
                            error!("Connection handler error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}
