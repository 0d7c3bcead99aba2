//! Bounded message history
//!
//! Keeps the most recent accepted messages in arrival order and evicts from
//! the head once the capacity is exceeded.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use crate::message::ChatMessage;

/// Default number of messages kept
pub const MAX_HISTORY_SIZE: usize = 100;

#[derive(Debug)]
struct Inner {
    messages: VecDeque<ChatMessage>,
    next_id: u64,
}

/// FIFO ring of recent messages
#[derive(Debug)]
pub struct HistoryBuffer {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` messages (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                messages: VecDeque::with_capacity(capacity),
                next_id: 1,
            }),
            capacity,
        }
    }

    /// Stamp `message` with the next sequence id and the current time, push
    /// it on the tail and return the stored copy
    ///
    /// Both stamps are taken under the lock, so id order and time order agree.
    pub fn append(&self, mut message: ChatMessage) -> ChatMessage {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        message.id = Some(inner.next_id);
        message.timestamp = Some(Utc::now());
        inner.next_id += 1;
        inner.messages.push_back(message.clone());
        while inner.messages.len() > self.capacity {
            inner.messages.pop_front();
        }
        message
    }

    /// Up to `limit` most recent messages, oldest first
    pub fn recent(&self, limit: usize) -> Vec<ChatMessage> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let skip = inner.messages.len().saturating_sub(limit);
        inner.messages.iter().skip(skip).cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .messages
            .len()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(MAX_HISTORY_SIZE)
    }
}
