//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake, frame
//! parsing, and bidirectional communication with the engine and the
//! broadcast hub.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::broadcast::BroadcastHub;
use crate::engine::ChatEngine;
use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::session::{Dispatch, Session};
use crate::types::SessionId;

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, then reads frames in this task while a
/// spawned write task forwards private replies and topic broadcasts. When
/// either side ends, the session's user (if any) is announced as leaving.
pub async fn handle_connection(
    stream: TcpStream,
    engine: Arc<ChatEngine>,
    hub: BroadcastHub,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    debug!("New TCP connection from {}", peer_addr);

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let mut session = Session::new(SessionId::new());
    let session_id = session.id;
    info!("Session {} connected from {}", session_id, peer_addr);

    // Subscribe before announcing the session so no broadcast is missed
    let mut topic_rx = hub.subscribe();

    let connected_msg = ServerMessage::Connected {
        session_id: session_id.to_string(),
    };
    let json = serde_json::to_string(&connected_msg)?;
    ws_sender.send(Message::Text(json.into())).await?;

    // Private replies to this session only
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(32);

    // Write task (private replies + topic broadcasts -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                reply = reply_rx.recv() => match reply {
                    Some(msg) => msg,
                    None => break,
                },
                published = topic_rx.recv() => match published {
                    Ok(broadcast) => ServerMessage::from(broadcast),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Session {} lagged, dropped {} broadcasts", session_id, skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };

            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    // Continue - don't break on serialization errors
                }
            }
        }
        debug!("Write task ended for {}", session_id);

        // Send close frame when done
        let _ = ws_sender.close().await;
    });

    // Read loop (WebSocket -> engine), stops early if the writer dies
    let mut writer_done = false;
    loop {
        let frame = tokio::select! {
            frame = ws_receiver.next() => frame,
            _ = &mut write_task => {
                writer_done = true;
                debug!("Write task completed for {}", session_id);
                break;
            }
        };

        let Some(frame) = frame else {
            break;
        };

        match frame {
            Ok(Message::Text(text)) => {
                let dispatch = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => session.on_message(&engine, client_msg),
                    Err(e) => {
                        warn!("Invalid JSON from {}: {}", session_id, e);
                        Dispatch {
                            broadcasts: Vec::new(),
                            reply: Some(AppError::from(e).into()),
                        }
                    }
                };

                hub.publish(dispatch.broadcasts);
                if let Some(reply) = dispatch.reply {
                    if reply_tx.send(reply).await.is_err() {
                        debug!("Reply channel closed for {}", session_id);
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                debug!("Session {} sent close frame", session_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                // Pong is handled automatically by tungstenite
                debug!("Ping from {}", session_id);
            }
            Ok(Message::Pong(_)) => {
                debug!("Pong from {}", session_id);
            }
            Ok(_) => {
                // Binary or other message types - ignore
            }
            Err(e) => {
                error!("WebSocket error for {}: {}", session_id, e);
                break;
            }
        }
    }

    // Announce the departure to everyone else
    hub.publish(session.on_disconnect(&engine));

    // Closing the reply channel stops the writer
    drop(reply_tx);
    if !writer_done {
        let _ = write_task.await;
    }

    info!("Session {} disconnected", session_id);

    Ok(())
}
