//! Away state, nick, typing and liveness

use lanchat_common::protocol::MessageKind;
use lanchat_common::validators::{validate_message_length, validate_nickname};
use tracing::warn;

use super::SessionController;
use crate::constants::PEER_TIMEOUT;
use crate::errors::SessionError;
use crate::i18n::{t, t_args};
use crate::notices::Notice;
use crate::peers::{Peer, PeerError};

impl SessionController {
    /// Change the away state of a peer
    ///
    /// For the local user the away or back message is broadcast first.
    pub async fn change_away_status(
        &self,
        code: u32,
        away: bool,
        message: &str,
    ) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let is_me = code == state.peers.me().code();

        if is_me && !state.session.logged_on {
            return Err(SessionError::NotConnected);
        }
        if validate_message_length(message).is_err() {
            return Err(SessionError::AwayMessageTooLong);
        }
        if !state.peers.contains(code) {
            return Err(SessionError::UnknownPeer(code));
        }

        if is_me {
            let kind = if away {
                MessageKind::Away {
                    message: message.to_string(),
                }
            } else {
                MessageKind::Back
            };
            self.broadcast_in(&state, kind)?;
        }

        state
            .peers
            .set_away(code, away, message)
            .map_err(|_| SessionError::UnknownPeer(code))?;

        if is_me {
            if away {
                self.notifier
                    .system(t_args("session-you-away", &[("message", message)]));
            } else {
                self.notifier.system(t("session-you-back"));
            }
        }

        Ok(())
    }

    /// Change the local user's nick, announce it and persist it
    ///
    /// A failed save is reported but does not undo the change.
    pub async fn change_my_nick(&self, new_nick: &str) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let me = state.peers.me();
        let code = me.code();

        if me.away {
            return Err(SessionError::NickWhileAway);
        }
        validate_nickname(new_nick).map_err(SessionError::InvalidNick)?;
        if state.peers.is_nick_taken_by_other(new_nick, code) {
            return Err(SessionError::NickInUse(new_nick.to_string()));
        }

        let mut message = state.message(MessageKind::Nick);
        message.nick = new_nick.to_string();
        self.messenger.broadcast(message)?;

        state.peers.set_nick(code, new_nick).map_err(|e| match e {
            PeerError::NickInUse(nick) => SessionError::NickInUse(nick),
            _ => SessionError::UnknownPeer(code),
        })?;

        self.notifier
            .system(t_args("session-you-nick", &[("nick", new_nick)]));

        if let Err(e) = self.settings.update_nick(new_nick) {
            warn!("Failed to save nick: {}", e);
            self.notifier
                .error(t_args("err-settings-save", &[("error", &e.to_string())]));
        }

        Ok(())
    }

    /// Another peer already owns the own nick: fall back to the own code
    ///
    /// Nothing is broadcast; peers already know us by code.
    pub async fn apply_nick_crash(&self) {
        let mut state = self.state.write().await;
        let code = state.peers.me().code();
        let fallback = code.to_string();

        if let Err(e) = state.peers.set_nick(code, &fallback) {
            warn!("Failed to reset own nick after nick crash: {}", e);
            return;
        }
        drop(state);

        self.notifier
            .system(t_args("session-nick-crash", &[("nick", &fallback)]));
        if let Err(e) = self.settings.update_nick(&fallback) {
            warn!("Failed to save nick: {}", e);
            self.notifier
                .error(t_args("err-settings-save", &[("error", &e.to_string())]));
        }
    }

    /// Update a typing flag; for the local user it is also broadcast
    ///
    /// While not connected the local flag still changes, only the
    /// broadcast is skipped.
    pub async fn change_writing(&self, code: u32, writing: bool) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        let is_me = code == state.peers.me().code();

        if is_me {
            if self.connected_in(&state) {
                let kind = if writing {
                    MessageKind::Writing
                } else {
                    MessageKind::StoppedWriting
                };
                self.broadcast_in(&state, kind)?;
            }
            state.session.own_writing = writing;
        }

        state
            .peers
            .set_writing(code, writing)
            .map_err(|_| SessionError::UnknownPeer(code))
    }

    /// Announce a typing change only when the local flag actually changes
    pub async fn update_me_writing(&self, writing: bool) -> Result<(), SessionError> {
        let (code, current) = {
            let state = self.state.read().await;
            (state.peers.me().code(), state.session.own_writing)
        };
        if current == writing {
            return Ok(());
        }
        self.change_writing(code, writing).await
    }

    /// Broadcast a liveness beacon when connected
    pub async fn send_idle_message(&self) {
        let state = self.state.read().await;
        if self.connected_in(&state) {
            self.announce_in(&state, MessageKind::Idle);
        }
    }

    /// Remove every peer silent for longer than the peer timeout
    ///
    /// Each removed peer has all its transfers cancelled, is reported as
    /// timed out, and any private conversation with it is closed. Returns the
    /// removed peers.
    pub async fn remove_timed_out_peers(&self, now: i64) -> Vec<Peer> {
        let mut state = self.state.write().await;
        let removed = state
            .peers
            .remove_timed_out(now, PEER_TIMEOUT.as_millis() as i64);

        for peer in &removed {
            let cancelled = self.transfers.cancel_for_peer(peer.code());
            warn!(
                "{} timed out, cancelled {} transfer(s)",
                peer.nick,
                cancelled.len()
            );

            let text = t_args("session-peer-timed-out", &[("nick", &peer.nick)]);
            if peer.private_chat.is_some() {
                self.notifier.emit(Notice::PrivateSystem {
                    peer: peer.nick.clone(),
                    text: text.clone(),
                });
            }
            self.notifier.system(text);
        }

        state.session.peers_timed_out = !removed.is_empty();
        removed
    }

    /// Ask everyone to identify again if the last sweep lost peers
    ///
    /// A peer may have been dropped only because its beacons got lost.
    pub async fn update_after_timeout(&self) {
        let state = self.state.read().await;
        if state.session.peers_timed_out {
            self.announce_in(&state, MessageKind::Expose);
        }
    }
}
