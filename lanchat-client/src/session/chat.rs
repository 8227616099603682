//! Main chat, private chat and topic

use std::net::SocketAddr;

use lanchat_common::protocol::MessageKind;
use lanchat_common::validators::{MessageError, validate_message, validate_message_length};

use super::{ChatState, SessionController, Topic};
use crate::clock::now_millis;
use crate::errors::SessionError;
use crate::i18n::{t, t_args};
use crate::notices::Notice;

/// Shared checks for chat and private lines: connected, present, sane text
fn check_line(controller: &SessionController, state: &ChatState, text: &str) -> Result<(), SessionError> {
    if !controller.connected_in(state) {
        return Err(SessionError::NotConnected);
    }
    if state.peers.me().away {
        return Err(SessionError::Away);
    }
    validate_message(text).map_err(|e| match e {
        MessageError::Empty => SessionError::EmptyMessage,
        MessageError::TooLong => SessionError::MessageTooLong,
    })
}

impl SessionController {
    /// Send a line to the main chat
    pub async fn send_chat_message(&self, text: &str) -> Result<(), SessionError> {
        let state = self.state.read().await;
        check_line(self, &state, text)?;

        let color = self.settings.get().own_color;
        self.broadcast_in(
            &state,
            MessageKind::Chat {
                color,
                text: text.to_string(),
            },
        )?;

        self.notifier.emit(Notice::Chat {
            nick: state.peers.me().nick.clone(),
            color,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Send a private line to the peer with `code`
    ///
    /// The line goes by unicast to the peer's private chat port and opens a
    /// private conversation with it.
    pub async fn send_private_message(&self, code: u32, text: &str) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        check_line(self, &state, text)?;

        if code == state.peers.me().code() {
            return Err(SessionError::SendToSelf);
        }
        let peer = state
            .peers
            .get(code)
            .ok_or(SessionError::UnknownPeer(code))?;

        let Some(ip) = peer.ip_address.filter(|_| peer.has_private_port()) else {
            return Err(SessionError::NoPrivateChatPort(peer.nick.clone()));
        };
        if peer.away {
            return Err(SessionError::PeerAway(peer.nick.clone()));
        }
        if !peer.online {
            return Err(SessionError::PeerOffline(peer.nick.clone()));
        }

        let settings = self.settings.get();
        if settings.no_private_chat {
            return Err(SessionError::PrivateChatDisabled);
        }

        let address = SocketAddr::new(ip, peer.private_port);
        let nick = peer.nick.clone();
        let message = state.message(MessageKind::PrivateMessage {
            target: code,
            color: settings.own_color,
            text: text.to_string(),
        });
        self.messenger.send_to(address, message)?;

        state
            .peers
            .open_private_chat(code)
            .map_err(|_| SessionError::UnknownPeer(code))?;

        self.notifier.emit(Notice::Private {
            peer: nick,
            outgoing: true,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Set or remove (empty text) the topic
    ///
    /// The new topic is stamped with the local clock and the own nick.
    pub async fn change_topic(&self, text: &str) -> Result<(), SessionError> {
        let mut state = self.state.write().await;

        if !state.session.logged_on {
            return Err(SessionError::NotConnected);
        }
        if state.peers.me().away {
            return Err(SessionError::Away);
        }
        if validate_message_length(text).is_err() {
            return Err(SessionError::TopicTooLong);
        }

        let topic = Topic::new(text, state.peers.me().nick.clone(), now_millis());
        self.broadcast_in(&state, MessageKind::Topic(topic.to_payload()))?;

        if topic.is_set() {
            self.notifier.system(t_args(
                "session-you-changed-topic",
                &[("topic", &topic.text)],
            ));
        } else {
            self.notifier.system(t("session-you-removed-topic"));
        }
        state.session.topic = topic;
        Ok(())
    }
}
