//! Per-user color assignment
//!
//! Colors are handed out round-robin from a fixed palette in order of first
//! appearance. A username keeps its color for the lifetime of the process,
//! including across leave and re-join; slots are never reclaimed, so once
//! more than `PALETTE.len()` users have been seen colors repeat.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Fixed, ordered set of assignable color tokens
pub const PALETTE: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8",
    "#F7DC6F", "#BB8FCE", "#85C1E2", "#F8B739", "#52B788",
];

/// Deterministic username -> color mapping
///
/// The whole map sits behind one mutex so the lookup, the slot computation and
/// the insert happen as a single step.
#[derive(Debug, Default)]
pub struct ColorAllocator {
    assigned: Mutex<HashMap<String, &'static str>>,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Color for `username`, assigning the next palette slot on first sight
    pub fn color_for(&self, username: &str) -> &'static str {
        let mut assigned = self.assigned.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&color) = assigned.get(username) {
            return color;
        }
        let color = PALETTE[assigned.len() % PALETTE.len()];
        assigned.insert(username.to_string(), color);
        color
    }

    /// Number of usernames that have ever been assigned a color
    pub(crate) fn assigned_count(&self) -> usize {
        self.assigned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
