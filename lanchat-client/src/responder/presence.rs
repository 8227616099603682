//! Peers joining, leaving and changing state

use std::net::IpAddr;

use lanchat_common::protocol::{ClientInfo, MessageKind};
use lanchat_common::validators::validate_nickname;
use tracing::{debug, warn};

use super::{MessageResponder, admissible_nick};
use crate::clock::now_millis;
use crate::i18n::t_args;
use crate::notices::Notice;
use crate::peers::Peer;
use crate::session::ChatState;

impl MessageResponder {
    pub(super) async fn on_logon(&self, code: u32, nick: &str, source: IpAddr) {
        let Some(nick) = self.add_newcomer(code, nick, source, None).await else {
            return;
        };
        self.session.notifier().system(t_args(
            "peer-logged-on",
            &[("nick", &nick), ("address", &source.to_string())],
        ));
    }

    pub(super) async fn on_exposing(
        &self,
        code: u32,
        nick: &str,
        away_message: &str,
        source: IpAddr,
    ) {
        let mut state = self.session.write().await;

        if !state.peers.contains(code) {
            let confirmed = state.session.is_logon_completed();
            drop(state);

            let Some(nick) = self
                .add_newcomer(code, nick, source, Some(away_message))
                .await
            else {
                return;
            };
            // Before the logon is confirmed, everyone answering our expose is expected
            if confirmed {
                self.session.notifier().system(t_args(
                    "peer-showed-up",
                    &[("nick", &nick), ("address", &source.to_string())],
                ));
            }
            return;
        }

        // Beacons may have been lost; reconcile what the peer says about itself
        let Some((nick_differs, away_differs)) = state
            .peers
            .get(code)
            .map(|peer| (peer.nick != nick, peer.away_message != away_message))
        else {
            return;
        };
        if nick_differs {
            self.apply_nick_change(&mut state, code, nick);
        }
        if away_differs {
            self.apply_away_change(&mut state, code, !away_message.is_empty(), away_message);
        }
    }

    /// Add a peer that just appeared, returning the nick it was recorded with
    async fn add_newcomer(
        &self,
        code: u32,
        nick: &str,
        source: IpAddr,
        away_message: Option<&str>,
    ) -> Option<String> {
        let mut state = self.session.write().await;
        let (nick, crash) = admissible_nick(&state, code, nick);

        if crash {
            warn!("{} logged on with our nick, sending nick crash", code);
            let crash = state.message(MessageKind::NickCrash {
                nick: state.peers.me().nick.clone(),
            });
            if let Err(e) = self.session.messenger().broadcast(crash) {
                warn!("Failed to send nick crash: {}", e);
            }
        } else if nick == code.to_string() {
            warn!("{} announced an unusable nick, using its code", code);
        }

        let now = now_millis();
        let mut peer = Peer::new(code, nick.clone(), now);
        peer.ip_address = Some(source);
        if let Some(message) = away_message {
            peer.away = !message.is_empty();
            peer.away_message = message.to_string();
        }

        if let Err(e) = state.peers.add(peer) {
            warn!("Could not add peer {}: {}", code, e);
            return None;
        }
        drop(state);

        self.stop_waiting(code);
        Some(nick)
    }

    pub(super) async fn on_logoff(&self, code: u32) {
        let mut state = self.session.write().await;
        let peer = match state.peers.remove(code) {
            Ok(peer) => peer,
            Err(e) => {
                warn!("Ignoring logoff: {}", e);
                return;
            }
        };
        drop(state);

        let cancelled = self.session.transfers().cancel_for_peer(code);
        debug!("{} logged off, cancelled {} transfer(s)", peer.nick, cancelled.len());

        let text = t_args("peer-logged-off", &[("nick", &peer.nick)]);
        if peer.private_chat.is_some() {
            self.session.notifier().emit(Notice::PrivateSystem {
                peer: peer.nick.clone(),
                text: text.clone(),
            });
        }
        self.session.notifier().system(text);
    }

    pub(super) async fn on_away_changed(&self, code: u32, away: bool, message: &str) {
        let mut state = self.session.write().await;
        self.apply_away_change(&mut state, code, away, message);
    }

    fn apply_away_change(&self, state: &mut ChatState, code: u32, away: bool, message: &str) {
        if let Err(e) = state.peers.set_away(code, away, message) {
            warn!("Ignoring away change: {}", e);
            return;
        }
        let Some(peer) = state.peers.get(code) else {
            return;
        };

        let text = if away {
            t_args(
                "peer-went-away",
                &[("nick", &peer.nick), ("message", message)],
            )
        } else {
            t_args("peer-came-back", &[("nick", &peer.nick)])
        };
        if peer.private_chat.is_some() {
            self.session.notifier().emit(Notice::PrivateSystem {
                peer: peer.nick.clone(),
                text: text.clone(),
            });
        }
        self.session.notifier().system(text);
    }

    pub(super) async fn on_nick_changed(&self, code: u32, new_nick: &str) {
        let mut state = self.session.write().await;
        self.apply_nick_change(&mut state, code, new_nick);
    }

    fn apply_nick_change(&self, state: &mut ChatState, code: u32, new_nick: &str) {
        if validate_nickname(new_nick).is_err() {
            warn!("{} tried an invalid nick '{}'", state.nick_of(code), new_nick);
            return;
        }
        let old_nick = match state.peers.set_nick(code, new_nick) {
            Ok(old) => old,
            Err(e) => {
                warn!("Ignoring nick change to '{}': {}", new_nick, e);
                return;
            }
        };

        let text = t_args(
            "peer-changed-nick",
            &[("old", &old_nick), ("nick", new_nick)],
        );
        let private = state
            .peers
            .get(code)
            .is_some_and(|peer| peer.private_chat.is_some());
        if private {
            self.session.notifier().emit(Notice::PrivateSystem {
                peer: new_nick.to_string(),
                text: text.clone(),
            });
        }
        self.session.notifier().system(text);
    }

    pub(super) async fn on_nick_crash(&self, nick: &str) {
        let own_nick = self.session.read().await.peers.me().nick.clone();
        if own_nick == nick {
            self.session.apply_nick_crash().await;
        }
    }

    pub(super) async fn on_writing_changed(&self, code: u32, writing: bool) {
        let mut state = self.session.write().await;
        if let Err(e) = state.peers.set_writing(code, writing) {
            debug!("Ignoring writing change: {}", e);
        }
    }

    pub(super) async fn on_idle(&self, code: u32, source: IpAddr) {
        let mut state = self.session.write().await;
        if let Err(e) = state.peers.touch(code, now_millis()) {
            warn!("Ignoring idle: {}", e);
            return;
        }

        if let Ok(Some(old)) = state.peers.set_ip_address(code, source) {
            self.session.notifier().system(t_args(
                "peer-changed-ip",
                &[
                    ("nick", &state.nick_of(code)),
                    ("old", &old.to_string()),
                    ("new", &source.to_string()),
                ],
            ));
        }
    }

    pub(super) async fn on_own_idle(&self, source: IpAddr) {
        let mut state = self.session.write().await;
        let me = state.peers.me().code();
        if let Err(e) = state.peers.touch(me, now_millis()) {
            warn!("Failed to touch self: {}", e);
        }

        if let Ok(Some(old)) = state.peers.set_ip_address(me, source) {
            self.session.notifier().system(t_args(
                "session-changed-ip",
                &[("old", &old.to_string()), ("new", &source.to_string())],
            ));
        }
    }

    pub(super) async fn on_client_info(&self, code: u32, info: &ClientInfo) {
        let mut state = self.session.write().await;
        let now = now_millis();
        if let Err(e) = state
            .peers
            .update(code, |peer| peer.apply_client_info(info, now))
        {
            warn!("Ignoring client info: {}", e);
        }
    }
}
