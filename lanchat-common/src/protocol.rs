//! Protocol definitions for LanChat
//!
//! Every message is a single UTF-8 datagram of the form
//! `<code>!<TYPE>#<nick>:<payload>`. The header identifies the sender by its
//! numeric user code and current nick; the payload layout depends on the type.
//! See [`crate::codec`] for the text encoding.
//!
//! Delivery is best effort. Peers never acknowledge messages; lost state is
//! repaired by periodic re-announcement (liveness beacons, expose requests).

use std::fmt;

/// Wire name of every message type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Chat,
    Logon,
    Logoff,
    Exposing,
    Expose,
    NickCrash,
    Away,
    Back,
    Writing,
    StoppedWriting,
    GetTopic,
    Topic,
    Nick,
    Idle,
    FileOffer,
    FileAccept,
    FileAbort,
    Client,
    PrivateMessage,
}

impl MessageType {
    /// All message types, in wire-name order
    pub const ALL: &'static [MessageType] = &[
        MessageType::Chat,
        MessageType::Logon,
        MessageType::Logoff,
        MessageType::Exposing,
        MessageType::Expose,
        MessageType::NickCrash,
        MessageType::Away,
        MessageType::Back,
        MessageType::Writing,
        MessageType::StoppedWriting,
        MessageType::GetTopic,
        MessageType::Topic,
        MessageType::Nick,
        MessageType::Idle,
        MessageType::FileOffer,
        MessageType::FileAccept,
        MessageType::FileAbort,
        MessageType::Client,
        MessageType::PrivateMessage,
    ];

    /// The type tag used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Chat => "MSG",
            MessageType::Logon => "LOGON",
            MessageType::Logoff => "LOGOFF",
            MessageType::Exposing => "EXPOSING",
            MessageType::Expose => "EXPOSE",
            MessageType::NickCrash => "NICKCRASH",
            MessageType::Away => "AWAY",
            MessageType::Back => "BACK",
            MessageType::Writing => "WRITING",
            MessageType::StoppedWriting => "STOPPEDWRITING",
            MessageType::GetTopic => "GETTOPIC",
            MessageType::Topic => "TOPIC",
            MessageType::Nick => "NICK",
            MessageType::Idle => "IDLE",
            MessageType::FileOffer => "SENDFILE",
            MessageType::FileAccept => "SENDFILEACCEPT",
            MessageType::FileAbort => "SENDFILEABORT",
            MessageType::Client => "CLIENT",
            MessageType::PrivateMessage => "PRIVMSG",
        }
    }

    /// Look up a type by its wire tag
    pub fn from_wire(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client details announced after logon and in reply to expose requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// Client name and version (e.g. "LanChat v0.3.0")
    pub client: String,
    /// Milliseconds since the sender logged on
    pub uptime_ms: i64,
    /// Operating system name
    pub operating_system: String,
    /// UDP port for private messages (0 when private chat is unavailable)
    pub private_port: u16,
    /// TCP chat port (0, kept for compatibility with older peers)
    pub tcp_port: u16,
}

/// Topic carried by a topic-change message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPayload {
    /// Nick of the peer who set the topic
    pub author: String,
    /// When the topic was set, in milliseconds since the Unix epoch
    pub time_ms: i64,
    /// Topic text, empty when the topic was removed
    pub text: String,
}

/// File identity shared by offer, accept and abort messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    /// Code of the peer the message is meant for
    pub target: u32,
    /// Identity hash of the file (see [`crate::hash::file_hash`])
    pub hash: u32,
    /// File name without directories
    pub name: String,
}

/// Typed payload of a protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Main chat line with the sender's color
    Chat { color: i32, text: String },
    /// Sender joined the chat
    Logon,
    /// Sender left the chat
    Logoff,
    /// Identification reply, carrying the away message (empty when present)
    Exposing { away_message: String },
    /// Request for every peer to identify itself
    Expose,
    /// The named nick is already taken by the sender
    NickCrash { nick: String },
    /// Sender went away
    Away { message: String },
    /// Sender came back
    Back,
    /// Sender started typing
    Writing,
    /// Sender stopped typing
    StoppedWriting,
    /// Request for the current topic
    GetTopic,
    /// Topic announcement or change
    Topic(TopicPayload),
    /// Sender changed nick; the new nick is the header nick
    Nick,
    /// Liveness beacon
    Idle,
    /// Offer to send a file
    FileOffer { file: FileRef, size: u64 },
    /// Acceptance of a file offer, with the TCP port to connect to
    FileAccept { file: FileRef, port: u16 },
    /// Rejection or cancellation of a file offer
    FileAbort { file: FileRef },
    /// Client details
    Client(ClientInfo),
    /// Private line, sent by unicast
    PrivateMessage { target: u32, color: i32, text: String },
}

impl MessageKind {
    /// Wire type of this payload
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageKind::Chat { .. } => MessageType::Chat,
            MessageKind::Logon => MessageType::Logon,
            MessageKind::Logoff => MessageType::Logoff,
            MessageKind::Exposing { .. } => MessageType::Exposing,
            MessageKind::Expose => MessageType::Expose,
            MessageKind::NickCrash { .. } => MessageType::NickCrash,
            MessageKind::Away { .. } => MessageType::Away,
            MessageKind::Back => MessageType::Back,
            MessageKind::Writing => MessageType::Writing,
            MessageKind::StoppedWriting => MessageType::StoppedWriting,
            MessageKind::GetTopic => MessageType::GetTopic,
            MessageKind::Topic(_) => MessageType::Topic,
            MessageKind::Nick => MessageType::Nick,
            MessageKind::Idle => MessageType::Idle,
            MessageKind::FileOffer { .. } => MessageType::FileOffer,
            MessageKind::FileAccept { .. } => MessageType::FileAccept,
            MessageKind::FileAbort { .. } => MessageType::FileAbort,
            MessageKind::Client(_) => MessageType::Client,
            MessageKind::PrivateMessage { .. } => MessageType::PrivateMessage,
        }
    }

    /// Code of the peer this message is addressed to, for targeted messages
    pub fn target(&self) -> Option<u32> {
        match self {
            MessageKind::FileOffer { file, .. }
            | MessageKind::FileAccept { file, .. }
            | MessageKind::FileAbort { file } => Some(file.target),
            MessageKind::PrivateMessage { target, .. } => Some(*target),
            _ => None,
        }
    }
}

/// A complete protocol message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// User code of the sender
    pub code: u32,
    /// Nick of the sender (the new nick for nick-change messages)
    pub nick: String,
    /// Typed payload
    pub kind: MessageKind,
}

impl Message {
    /// Create a message from the given sender
    pub fn new(code: u32, nick: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            code,
            nick: nick.into(),
            kind,
        }
    }

    /// Wire type of this message
    pub fn message_type(&self) -> MessageType {
        self.kind.message_type()
    }
}
