//! Topic broadcast sink
//!
//! Fans engine output out to every connected session. Delivery is best
//! effort: a subscriber that falls more than `capacity` frames behind loses
//! the oldest ones instead of stalling publishers.

use tokio::sync::broadcast;
use tracing::debug;

use crate::message::Broadcast;

/// Cloneable handle to the shared broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    sender: broadcast::Sender<Broadcast>,
}

impl BroadcastHub {
    /// Create a hub keeping up to `capacity` undelivered frames per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive every broadcast published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.sender.subscribe()
    }

    /// Publish broadcasts in order; returns how many sessions were listening
    pub fn publish(&self, broadcasts: Vec<Broadcast>) -> usize {
        let mut receivers = 0;
        for broadcast in broadcasts {
            debug!("Publishing on '{}'", broadcast.topic);
            // No subscribers is fine: nobody to tell
            receivers = self.sender.send(broadcast).unwrap_or(0);
        }
        receivers
    }
}
