//! The shared chat topic

use lanchat_common::protocol::TopicPayload;

/// Topic of the main chat; empty text means no topic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topic {
    pub text: String,
    /// Nick of whoever set it
    pub author: String,
    /// When it was set (millis since epoch)
    pub time_ms: i64,
}

impl Topic {
    pub fn new(text: impl Into<String>, author: impl Into<String>, time_ms: i64) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            time_ms,
        }
    }

    /// Whether a topic is set
    pub fn is_set(&self) -> bool {
        !self.text.is_empty()
    }

    /// Back to "no topic"
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Wire payload for this topic
    pub fn to_payload(&self) -> TopicPayload {
        TopicPayload {
            author: self.author.clone(),
            time_ms: self.time_ms,
            text: self.text.clone(),
        }
    }
}

impl From<TopicPayload> for Topic {
    fn from(payload: TopicPayload) -> Self {
        Self {
            text: payload.text,
            author: payload.author,
            time_ms: payload.time_ms,
        }
    }
}
