//! Text codec for protocol messages
//!
//! Header: `<code>!<TYPE>#<nick>:`, followed by a type-specific payload made
//! of delimited fields (`(..)`, `[..]`, `{..}`, `<..>`) and a free-text tail.
//! Fields are located by searching for their delimiters in order, so free text
//! at the end may contain any delimiter characters.

use std::str::FromStr;

use thiserror::Error;

use crate::protocol::{ClientInfo, FileRef, Message, MessageKind, MessageType, TopicPayload};

/// Errors produced while decoding a datagram
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The `<code>!<TYPE>#<nick>:` header is incomplete
    #[error("malformed message header")]
    MalformedHeader,
    /// The sender code is not a number
    #[error("invalid sender code: {0}")]
    InvalidCode(String),
    /// The type tag is not known
    #[error("unknown message type: {0}")]
    UnknownType(String),
    /// A delimited payload field is missing
    #[error("{message_type} payload is missing its '{open}' field")]
    MissingField {
        message_type: MessageType,
        open: char,
    },
    /// A numeric payload field does not parse
    #[error("{message_type} payload has an invalid number: {value}")]
    InvalidNumber {
        message_type: MessageType,
        value: String,
    },
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a message into its wire text
pub fn encode(message: &Message) -> String {
    let mut out = format!(
        "{}!{}#{}:",
        message.code,
        message.message_type().as_str(),
        message.nick
    );

    match &message.kind {
        MessageKind::Chat { color, text } => {
            out.push_str(&format!("[{color}]{text}"));
        }
        MessageKind::Exposing { away_message } => out.push_str(away_message),
        MessageKind::NickCrash { nick } => out.push_str(nick),
        MessageKind::Away { message } => out.push_str(message),
        MessageKind::Topic(topic) => {
            out.push_str(&format!(
                "({})[{}]{}",
                topic.author, topic.time_ms, topic.text
            ));
        }
        MessageKind::FileOffer { file, size } => {
            out.push_str(&format!(
                "({})[{}]{{{}}}{}",
                file.target, size, file.hash, file.name
            ));
        }
        MessageKind::FileAccept { file, port } => {
            out.push_str(&format!(
                "({})[{}]{{{}}}{}",
                file.target, port, file.hash, file.name
            ));
        }
        MessageKind::FileAbort { file } => {
            out.push_str(&format!("({}){{{}}}{}", file.target, file.hash, file.name));
        }
        MessageKind::Client(info) => {
            out.push_str(&format!(
                "({})[{}]{{{}}}<{}>/{}\\",
                info.client, info.uptime_ms, info.operating_system, info.private_port, info.tcp_port
            ));
        }
        MessageKind::PrivateMessage {
            target,
            color,
            text,
        } => {
            out.push_str(&format!("({target})[{color}]{text}"));
        }
        MessageKind::Logon
        | MessageKind::Logoff
        | MessageKind::Expose
        | MessageKind::Back
        | MessageKind::Writing
        | MessageKind::StoppedWriting
        | MessageKind::GetTopic
        | MessageKind::Nick
        | MessageKind::Idle => {}
    }

    out
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode wire text into a message
///
/// # Errors
///
/// Returns a `CodecError` describing the first malformed part. Callers are
/// expected to log and drop such datagrams.
pub fn decode(text: &str) -> Result<Message, CodecError> {
    let bang = text.find('!').ok_or(CodecError::MalformedHeader)?;
    let hash = text[bang..]
        .find('#')
        .map(|i| bang + i)
        .ok_or(CodecError::MalformedHeader)?;
    let colon = text[hash..]
        .find(':')
        .map(|i| hash + i)
        .ok_or(CodecError::MalformedHeader)?;

    let code_str = &text[..bang];
    let code = code_str
        .parse::<u32>()
        .map_err(|_| CodecError::InvalidCode(code_str.to_string()))?;
    let tag = &text[bang + 1..hash];
    let message_type =
        MessageType::from_wire(tag).ok_or_else(|| CodecError::UnknownType(tag.to_string()))?;
    let nick = &text[hash + 1..colon];
    let payload = &text[colon + 1..];

    let kind = decode_payload(message_type, payload)?;

    Ok(Message::new(code, nick, kind))
}

fn decode_payload(message_type: MessageType, payload: &str) -> Result<MessageKind, CodecError> {
    let mut fields = Fields::new(message_type, payload);

    let kind = match message_type {
        MessageType::Chat => {
            let color = fields.number('[', ']')?;
            MessageKind::Chat {
                color,
                text: fields.rest().to_string(),
            }
        }
        MessageType::Logon => MessageKind::Logon,
        MessageType::Logoff => MessageKind::Logoff,
        MessageType::Exposing => MessageKind::Exposing {
            away_message: payload.to_string(),
        },
        MessageType::Expose => MessageKind::Expose,
        MessageType::NickCrash => MessageKind::NickCrash {
            nick: payload.to_string(),
        },
        MessageType::Away => MessageKind::Away {
            message: payload.to_string(),
        },
        MessageType::Back => MessageKind::Back,
        MessageType::Writing => MessageKind::Writing,
        MessageType::StoppedWriting => MessageKind::StoppedWriting,
        MessageType::GetTopic => MessageKind::GetTopic,
        MessageType::Topic => {
            let author = fields.field('(', ')')?.to_string();
            let time_ms = fields.number('[', ']')?;
            MessageKind::Topic(TopicPayload {
                author,
                time_ms,
                text: fields.rest().to_string(),
            })
        }
        MessageType::Nick => MessageKind::Nick,
        MessageType::Idle => MessageKind::Idle,
        MessageType::FileOffer => {
            let target = fields.number('(', ')')?;
            let size = fields.number('[', ']')?;
            let hash = fields.number('{', '}')?;
            MessageKind::FileOffer {
                file: FileRef {
                    target,
                    hash,
                    name: fields.rest().to_string(),
                },
                size,
            }
        }
        MessageType::FileAccept => {
            let target = fields.number('(', ')')?;
            let port = fields.number('[', ']')?;
            let hash = fields.number('{', '}')?;
            MessageKind::FileAccept {
                file: FileRef {
                    target,
                    hash,
                    name: fields.rest().to_string(),
                },
                port,
            }
        }
        MessageType::FileAbort => {
            let target = fields.number('(', ')')?;
            let hash = fields.number('{', '}')?;
            MessageKind::FileAbort {
                file: FileRef {
                    target,
                    hash,
                    name: fields.rest().to_string(),
                },
            }
        }
        MessageType::Client => {
            let client = fields.field('(', ')')?.to_string();
            let uptime_ms = fields.number('[', ']')?;
            let operating_system = fields.field('{', '}')?.to_string();
            // Older peers send garbage or nothing for the ports
            let private_port = fields.lenient_number('<', '>');
            let tcp_port = fields.lenient_number('/', '\\');
            MessageKind::Client(ClientInfo {
                client,
                uptime_ms,
                operating_system,
                private_port,
                tcp_port,
            })
        }
        MessageType::PrivateMessage => {
            let target = fields.number('(', ')')?;
            let color = fields.number('[', ']')?;
            MessageKind::PrivateMessage {
                target,
                color,
                text: fields.rest().to_string(),
            }
        }
    };

    Ok(kind)
}

/// Sequential reader over delimited payload fields
struct Fields<'a> {
    message_type: MessageType,
    rest: &'a str,
}

impl<'a> Fields<'a> {
    fn new(message_type: MessageType, payload: &'a str) -> Self {
        Self {
            message_type,
            rest: payload,
        }
    }

    /// Take the text between the next `open` and the following `close`
    fn field(&mut self, open: char, close: char) -> Result<&'a str, CodecError> {
        let missing = CodecError::MissingField {
            message_type: self.message_type,
            open,
        };
        let start = self.rest.find(open).ok_or_else(|| missing.clone())? + open.len_utf8();
        let end = self.rest[start..].find(close).ok_or(missing)? + start;
        let value = &self.rest[start..end];
        self.rest = &self.rest[end + close.len_utf8()..];
        Ok(value)
    }

    fn number<T: FromStr>(&mut self, open: char, close: char) -> Result<T, CodecError> {
        let value = self.field(open, close)?;
        value.parse().map_err(|_| CodecError::InvalidNumber {
            message_type: self.message_type,
            value: value.to_string(),
        })
    }

    fn lenient_number<T: FromStr + Default>(&mut self, open: char, close: char) -> T {
        self.number(open, close).unwrap_or_default()
    }

    fn rest(&self) -> &'a str {
        self.rest
    }
}
