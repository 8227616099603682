//! Input validation functions
//!
//! Validators shared by every component that accepts text from the user or
//! from the network. Peers run the same checks on incoming nicks that they
//! run on their own.

mod message;
mod nickname;

pub use message::{MAX_MESSAGE_BYTES, MessageError, validate_message, validate_message_length};
pub use nickname::{MAX_NICKNAME_LENGTH, NicknameError, validate_nickname};
