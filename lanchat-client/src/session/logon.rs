//! Logon, logoff and link recovery

use std::net::IpAddr;
use std::sync::Arc;

use lanchat_common::protocol::MessageKind;
use tracing::{debug, info, warn};

use super::{ChatState, SessionController};
use crate::clock::now_millis;
use crate::constants::LOGON_CONFIRM_DELAY;
use crate::i18n::{t, t_args};
use crate::notices::Notice;

impl SessionController {
    /// Start a fresh logon
    ///
    /// Sends logon, client info, expose and get-topic, in that order, and
    /// schedules the one-shot confirmation.
    pub async fn log_on(self: &Arc<Self>) {
        let mut state = self.state.write().await;
        if state.session.logged_on {
            debug!("Already logged on");
            return;
        }

        state.session.logging_on = true;
        let now = now_millis();
        let me = state.peers.me().code();
        if let Err(e) = state.peers.update(me, |peer| {
            peer.logon_time = now;
            peer.last_idle = now;
        }) {
            warn!("Failed to reset own logon time: {}", e);
        }

        self.schedule_confirmation();

        for kind in [
            MessageKind::Logon,
            self.client_info_in(&state),
            MessageKind::Expose,
            MessageKind::GetTopic,
        ] {
            self.announce_in(&state, kind);
        }
    }

    /// Mark the session confirmed after a short delay, if the link is still up
    fn schedule_confirmation(self: &Arc<Self>) {
        let session = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(LOGON_CONFIRM_DELAY).await;
            if session.messenger.is_network_up() {
                session.state.write().await.session.logon_completed = true;
                debug!("Logon confirmed");
            }
        });

        let mut slot = self.confirm_task.lock().expect("confirm task lock poisoned");
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    /// Own logon message came back from the network
    pub async fn me_logged_on(&self, address: IpAddr) {
        let mut state = self.state.write().await;
        if !state.session.logging_on && !state.session.logged_on {
            debug!("Ignoring own logon echo after logging off");
            return;
        }
        let me = state.peers.me().code();

        state.session.logging_on = false;
        state.session.logged_on = true;
        if let Err(e) = state.peers.set_ip_address(me, address) {
            warn!("Failed to record own address: {}", e);
        }
        if let Err(e) = state.peers.touch(me, now_millis()) {
            warn!("Failed to touch self: {}", e);
        }

        info!("Logged on from {}", address);
        self.notifier
            .system(t_args("session-logged-on", &[("address", &address.to_string())]));
    }

    /// Log off, optionally forgetting every peer
    ///
    /// The logoff message is always sent and the topic reset.
    pub async fn log_off(&self, remove_peers: bool) {
        let mut state = self.state.write().await;

        self.announce_in(&state, MessageKind::Logoff);

        if let Some(task) = self
            .confirm_task
            .lock()
            .expect("confirm task lock poisoned")
            .take()
        {
            task.abort();
        }

        state.session.logging_on = false;
        state.session.logged_on = false;
        state.session.logon_completed = false;
        state.session.own_writing = false;
        state.session.topic.reset();

        if remove_peers {
            self.remove_all_peers(&mut state);
        }
        state.peers.reset_me();

        self.notifier.system(t("session-logged-off"));
    }

    fn remove_all_peers(&self, state: &mut ChatState) {
        for peer in state.peers.clear_others() {
            self.transfers.cancel_for_peer(peer.code());
            if peer.private_chat.is_some() {
                self.notifier.emit(Notice::PrivateSystem {
                    peer: peer.nick.clone(),
                    text: t("session-logged-off"),
                });
            }
        }
    }

    /// The link is usable
    ///
    /// Starts a logon when not logged on. After a loss it re-announces
    /// instead: current topic, exposing, get-topic, expose and a liveness
    /// beacon. `silent` suppresses the "connected again" notice.
    pub async fn network_came_up(self: &Arc<Self>, silent: bool) {
        if !self.is_logged_on().await {
            self.log_on().await;
            return;
        }

        let state = self.state.read().await;
        if !silent {
            self.notifier.system(t("session-connected-again"));
        }

        for kind in [
            MessageKind::Topic(state.session.topic.to_payload()),
            self.exposing_in(&state),
            MessageKind::GetTopic,
            MessageKind::Expose,
            MessageKind::Idle,
        ] {
            self.announce_in(&state, kind);
        }
    }

    /// The link stopped working
    pub async fn network_went_down(&self, silent: bool) {
        if self.is_logged_on().await {
            if !silent {
                self.notifier.system(t("session-lost-contact"));
            }
        } else {
            self.notifier.system(t("session-logged-off"));
        }
    }
}
