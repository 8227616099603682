//! Message length validation
//!
//! Every free-text field that travels in a datagram (chat lines, private
//! lines, away messages, topics, file names) is limited by its UTF-8 encoded
//! size, not its character count.

/// Maximum encoded size of a free-text field, in bytes
pub const MAX_MESSAGE_BYTES: usize = 450;

/// Validation error for message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Message is empty or whitespace only
    Empty,
    /// Message exceeds the maximum encoded size
    TooLong,
}

/// Validate a chat or private message
///
/// Checks:
/// - Not empty or whitespace only
/// - UTF-8 encoded size does not exceed 450 bytes
///
/// # Errors
///
/// Returns a `MessageError` variant describing the validation failure.
pub fn validate_message(message: &str) -> Result<(), MessageError> {
    if message.trim().is_empty() {
        return Err(MessageError::Empty);
    }
    validate_message_length(message)
}

/// Validate only the encoded size of a text field that may be empty
///
/// # Errors
///
/// Returns `MessageError::TooLong` if the UTF-8 encoded size exceeds 450 bytes.
pub fn validate_message_length(message: &str) -> Result<(), MessageError> {
    if message.len() > MAX_MESSAGE_BYTES {
        return Err(MessageError::TooLong);
    }
    Ok(())
}
