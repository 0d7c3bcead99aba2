//! Chat relay - Entry Point
//!
//! Loads configuration, binds the listener and runs the accept loop.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_relay::{ChatServer, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_relay=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        "History capacity {}, broadcast capacity {}",
        config.history_capacity, config.broadcast_capacity
    );

    let listener = TcpListener::bind(&config.addr).await?;
    ChatServer::new(&config).run(listener).await;

    Ok(())
}
