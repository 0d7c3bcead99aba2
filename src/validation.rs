//! Input validation and markup sanitization
//!
//! Validation runs on the raw input; sanitization only on input that passed.

use crate::error::ValidationError;

/// Maximum content length in characters, measured before sanitization
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Reject blank senders, blank content and over-long content
pub fn validate(sender: &str, content: &str) -> Result<(), ValidationError> {
    validate_sender(sender)?;
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::too_long());
    }
    Ok(())
}

/// Reject an empty or all-whitespace sender
pub fn validate_sender(sender: &str) -> Result<(), ValidationError> {
    if sender.trim().is_empty() {
        return Err(ValidationError::EmptySender);
    }
    Ok(())
}

/// Trim and escape `& < > " '` to their HTML entities
///
/// `&` is escaped first so entities produced by later escapes are left alone.
pub fn sanitize(content: &str) -> String {
    content
        .trim()
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
