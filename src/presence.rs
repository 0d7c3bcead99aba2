//! Presence registry
//!
//! Tracks the usernames with a live session and the color each one was given.
//! Several sessions may hold the same username; the entry stays until the
//! last of them releases it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::color::ColorAllocator;
use crate::message::User;

#[derive(Debug)]
struct Entry {
    user: User,
    /// Live sessions bound to this username
    sessions: usize,
}

/// Set of online users keyed by username
#[derive(Debug)]
pub struct PresenceRegistry {
    users: RwLock<HashMap<String, Entry>>,
    colors: Arc<ColorAllocator>,
}

impl PresenceRegistry {
    pub fn new(colors: Arc<ColorAllocator>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            colors,
        }
    }

    /// Register one more session as `username`, refreshing the entry
    pub fn add_user(&self, username: &str) -> User {
        self.upsert(username, 1)
    }

    /// Refresh `username` for a session that already holds it
    ///
    /// Recreates the entry with a single holder if it went missing.
    pub fn refresh(&self, username: &str) -> User {
        self.upsert(username, 0)
    }

    fn upsert(&self, username: &str, new_sessions: usize) -> User {
        let user = User {
            username: username.to_string(),
            color: self.colors.color_for(username).to_string(),
            online: true,
        };
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let entry = users.entry(username.to_string()).or_insert(Entry {
            user: user.clone(),
            sessions: 0,
        });
        entry.user = user.clone();
        entry.sessions = (entry.sessions + new_sessions).max(1);
        user
    }

    /// Drop one session's hold on `username`
    ///
    /// Returns true when that was the last holder and the user went offline.
    /// Releasing an absent username is a no-op.
    pub fn release(&self, username: &str) -> bool {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = users.get_mut(username) else {
            return false;
        };
        entry.sessions = entry.sessions.saturating_sub(1);
        if entry.sessions == 0 {
            users.remove(username);
            true
        } else {
            false
        }
    }

    /// Snapshot of the online users, in no particular order
    pub fn list_users(&self) -> Vec<User> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|entry| entry.user.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
