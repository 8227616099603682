//! Session errors
//!
//! Every precondition failure is an expected error: it is reported to the
//! user and never causes a network side effect.

use lanchat_common::validators::{MAX_MESSAGE_BYTES, MAX_NICKNAME_LENGTH, NicknameError};

use crate::i18n::{t, t_args};
use crate::network::SendError;
use crate::transfers::{InvalidTransition, RegisterError, TransferError, TransferId};

/// A session operation that could not be carried out
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("not connected")]
    NotConnected,
    #[error("away")]
    Away,
    #[error("empty message")]
    EmptyMessage,
    #[error("message too long")]
    MessageTooLong,
    #[error("away message too long")]
    AwayMessageTooLong,
    #[error("topic too long")]
    TopicTooLong,
    #[error("file name too long")]
    FileNameTooLong,
    #[error("nick change while away")]
    NickWhileAway,
    #[error("invalid nick: {0:?}")]
    InvalidNick(NicknameError),
    #[error("nick {0} in use")]
    NickInUse(String),
    #[error("target is self")]
    SendToSelf,
    #[error("unknown user {0}")]
    UnknownPeer(u32),
    #[error("{0} has no private chat port")]
    NoPrivateChatPort(String),
    #[error("{0} is away")]
    PeerAway(String),
    #[error("{0} is offline")]
    PeerOffline(String),
    #[error("private chat disabled")]
    PrivateChatDisabled,
    #[error("file {0} not found")]
    FileNotFound(String),
    #[error("no transfer {0}")]
    NoSuchTransfer(TransferId),
    #[error(transparent)]
    InvalidState(#[from] InvalidTransition),
    #[error(transparent)]
    Register(#[from] RegisterError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

impl SessionError {
    /// Localized message shown to the user
    pub fn to_user_message(&self) -> String {
        let max_bytes = MAX_MESSAGE_BYTES.to_string();
        match self {
            SessionError::NotConnected => t("err-not-connected"),
            SessionError::Away => t("err-away"),
            SessionError::EmptyMessage => t("err-empty-message"),
            SessionError::MessageTooLong => t_args("err-message-too-long", &[("max", &max_bytes)]),
            SessionError::AwayMessageTooLong => {
                t_args("err-away-message-too-long", &[("max", &max_bytes)])
            }
            SessionError::TopicTooLong => t_args("err-topic-too-long", &[("max", &max_bytes)]),
            SessionError::FileNameTooLong => {
                t_args("err-file-name-too-long", &[("max", &max_bytes)])
            }
            SessionError::NickWhileAway => t("err-nick-while-away"),
            SessionError::InvalidNick(NicknameError::Empty) => t("err-nick-empty"),
            SessionError::InvalidNick(NicknameError::TooLong) => t_args(
                "err-nick-too-long",
                &[("max", &MAX_NICKNAME_LENGTH.to_string())],
            ),
            SessionError::InvalidNick(NicknameError::InvalidCharacters) => t("err-nick-invalid"),
            SessionError::NickInUse(nick) => t_args("err-nick-in-use", &[("nick", nick)]),
            SessionError::SendToSelf => t("err-self-target"),
            SessionError::UnknownPeer(code) => {
                t_args("err-unknown-user", &[("nick", &code.to_string())])
            }
            SessionError::NoPrivateChatPort(nick) => {
                t_args("err-private-no-port", &[("nick", nick)])
            }
            SessionError::PeerAway(nick) => t_args("err-user-away", &[("nick", nick)]),
            SessionError::PeerOffline(nick) => t_args("err-user-offline", &[("nick", nick)]),
            SessionError::PrivateChatDisabled => t("err-private-disabled"),
            SessionError::FileNotFound(path) => t_args("err-file-not-found", &[("file", path)]),
            SessionError::NoSuchTransfer(id) => {
                t_args("err-no-such-transfer", &[("id", &id.to_string())])
            }
            SessionError::InvalidState(transition) => t_args(
                "err-transfer-state",
                &[("state", &transition.from.to_string())],
            ),
            SessionError::Register(RegisterError::Duplicate { id }) => {
                t_args("err-transfer-duplicate", &[("id", &id.to_string())])
            }
            SessionError::Send(e) => t_args("err-send-failed", &[("error", &e.to_string())]),
            SessionError::Transfer(e) => t(e.to_i18n_key()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_translated() {
        assert_eq!(
            SessionError::NotConnected.to_user_message(),
            "You can not do that without being connected"
        );
        assert_eq!(
            SessionError::MessageTooLong.to_user_message(),
            "You can not send a message with more than 450 bytes"
        );
        assert_eq!(SessionError::SendToSelf.to_user_message(), "No point in doing that!");
    }

    #[test]
    fn test_every_variant_has_a_key() {
        let errors = [
            SessionError::Away,
            SessionError::EmptyMessage,
            SessionError::AwayMessageTooLong,
            SessionError::TopicTooLong,
            SessionError::FileNameTooLong,
            SessionError::NickWhileAway,
            SessionError::InvalidNick(NicknameError::Empty),
            SessionError::InvalidNick(NicknameError::TooLong),
            SessionError::InvalidNick(NicknameError::InvalidCharacters),
            SessionError::NickInUse("Tina".to_string()),
            SessionError::UnknownPeer(1),
            SessionError::NoPrivateChatPort("Tina".to_string()),
            SessionError::PeerAway("Tina".to_string()),
            SessionError::PeerOffline("Tina".to_string()),
            SessionError::PrivateChatDisabled,
            SessionError::FileNotFound("a.txt".to_string()),
            SessionError::NoSuchTransfer(TransferId::from(3)),
            SessionError::Send(SendError::NetworkDown),
            SessionError::Transfer(TransferError::Timeout),
        ];
        for error in errors {
            let message = error.to_user_message();
            assert!(!message.starts_with("err-"), "Missing translation: {}", message);
            assert!(!message.starts_with("transfer-"), "Missing translation: {}", message);
        }
    }
}
