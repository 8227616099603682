//! Chat lines and the topic

use lanchat_common::protocol::TopicPayload;
use tracing::{debug, warn};

use super::MessageResponder;
use crate::clock::format_timestamp;
use crate::i18n::t_args;
use crate::notices::Notice;
use crate::session::Topic;

impl MessageResponder {
    pub(super) async fn on_chat(&self, code: u32, color: i32, text: &str) {
        let state = self.session.read().await;
        match state.peers.get(code) {
            Some(peer) if !peer.away => {
                self.session.notifier().emit(Notice::Chat {
                    nick: peer.nick.clone(),
                    color,
                    text: text.to_string(),
                });
            }
            Some(peer) => warn!("{} is away, ignoring message", peer.nick),
            None => warn!("Unknown user {}, ignoring message", code),
        }
    }

    pub(super) async fn on_private_message(&self, code: u32, color: i32, text: &str) {
        if self.session.settings().get().no_private_chat {
            debug!("Private chat disabled, dropping private message from {}", code);
            return;
        }

        let mut state = self.session.write().await;
        let nick = match state.peers.get(code) {
            Some(peer) if !peer.away => peer.nick.clone(),
            Some(peer) => {
                warn!("{} is away, ignoring private message", peer.nick);
                return;
            }
            None => {
                warn!("Unknown user {}, ignoring private message", code);
                return;
            }
        };

        if let Err(e) = state.peers.open_private_chat(code) {
            warn!("Failed to open private chat: {}", e);
            return;
        }
        debug!("Private message from {} (color {})", nick, color);

        self.session.notifier().emit(Notice::Private {
            peer: nick,
            outgoing: false,
            text: text.to_string(),
        });
    }

    /// Apply an announced topic if it is newer than ours
    ///
    /// Before the logon is confirmed the topic is shown as the current one;
    /// afterwards as a change. A removal is only applied once confirmed.
    pub(super) async fn on_topic(&self, payload: TopicPayload) {
        if payload.author.is_empty() || payload.time_ms <= 0 {
            debug!("Ignoring topic without author or time");
            return;
        }

        let mut state = self.session.write().await;
        let confirmed = state.session.is_logon_completed();
        let current = state.session.topic();
        if payload.text == current.text || payload.time_ms <= current.time_ms {
            return;
        }

        let notifier = self.session.notifier();
        if payload.text.is_empty() {
            if !confirmed {
                return;
            }
            notifier.system(t_args("topic-removed", &[("nick", &payload.author)]));
            state.session.topic = Topic::new("", "", payload.time_ms);
            return;
        }

        if confirmed {
            notifier.system(t_args(
                "topic-changed",
                &[("nick", &payload.author), ("topic", &payload.text)],
            ));
        } else {
            notifier.system(t_args(
                "topic-is",
                &[
                    ("topic", &payload.text),
                    ("nick", &payload.author),
                    ("time", &format_timestamp(payload.time_ms)),
                ],
            ));
        }
        state.session.topic = Topic::from(payload);
    }
}
