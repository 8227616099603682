//! Session controller
//!
//! Owns the peer set, the topic and the connection state, and sends every
//! outbound protocol message through the injected [`Messenger`].
//!
//! All state lives behind one `RwLock`. Operations take the write lock,
//! check their preconditions, send, and only then change local state, so a
//! failed check or a failed send leaves everything untouched.

mod chat;
mod files;
mod logon;
mod presence;
mod state;
mod topic;

pub use state::{SessionPhase, SessionState};
pub use topic::Topic;

use std::sync::{Arc, Mutex};

use lanchat_common::APP_NAME;
use lanchat_common::protocol::{ClientInfo, Message, MessageKind};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::clock::now_millis;
use crate::config::SettingsStore;
use crate::errors::SessionError;
use crate::network::{Messenger, SendError};
use crate::notices::Notifier;
use crate::peers::{Peer, PeerList};
use crate::transfers::TransferRegistry;

/// Everything the session guards with its lock
#[derive(Debug, Clone)]
pub struct ChatState {
    pub peers: PeerList,
    pub session: SessionState,
}

impl ChatState {
    /// Build a message from the local user
    pub(crate) fn message(&self, kind: MessageKind) -> Message {
        let me = self.peers.me();
        Message::new(me.code(), me.nick.clone(), kind)
    }

    /// Nick of a peer, or its code when unknown
    pub fn nick_of(&self, code: u32) -> String {
        self.peers
            .get(code)
            .map(|peer| peer.nick.clone())
            .unwrap_or_else(|| code.to_string())
    }
}

/// Session and presence state machine
pub struct SessionController {
    state: RwLock<ChatState>,
    messenger: Arc<dyn Messenger>,
    transfers: Arc<TransferRegistry>,
    notifier: Arc<Notifier>,
    settings: Arc<SettingsStore>,
    confirm_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Create a controller for the local user `me`
    pub fn new(
        me: Peer,
        messenger: Arc<dyn Messenger>,
        transfers: Arc<TransferRegistry>,
        notifier: Arc<Notifier>,
        settings: Arc<SettingsStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(ChatState {
                peers: PeerList::new(me),
                session: SessionState::default(),
            }),
            messenger,
            transfers,
            notifier,
            settings,
            confirm_task: Mutex::new(None),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Shared read access to the chat state
    pub async fn read(&self) -> RwLockReadGuard<'_, ChatState> {
        self.state.read().await
    }

    /// Exclusive access for the inbound message handler
    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, ChatState> {
        self.state.write().await
    }

    pub fn transfers(&self) -> &Arc<TransferRegistry> {
        &self.transfers
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub(crate) fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.session.phase()
    }

    pub async fn is_logged_on(&self) -> bool {
        self.state.read().await.session.logged_on
    }

    /// Logged on and the link is up
    pub async fn is_connected(&self) -> bool {
        self.messenger.is_network_up() && self.is_logged_on().await
    }

    pub async fn topic(&self) -> Topic {
        self.state.read().await.session.topic.clone()
    }

    pub async fn me(&self) -> Peer {
        self.state.read().await.peers.me().clone()
    }

    pub async fn peer(&self, code: u32) -> Option<Peer> {
        self.state.read().await.peers.get(code).cloned()
    }

    pub async fn peer_by_nick(&self, nick: &str) -> Option<Peer> {
        self.state.read().await.peers.by_nick(nick).cloned()
    }

    // =========================================================================
    // Sending
    // =========================================================================

    fn connected_in(&self, state: &ChatState) -> bool {
        self.messenger.is_network_up() && state.session.logged_on
    }

    fn broadcast_in(&self, state: &ChatState, kind: MessageKind) -> Result<(), SendError> {
        self.messenger.broadcast(state.message(kind))
    }

    /// Broadcast, logging instead of failing (for announcements nobody waits on)
    fn announce_in(&self, state: &ChatState, kind: MessageKind) {
        let message_type = kind.message_type();
        if let Err(e) = self.broadcast_in(state, kind) {
            warn!("Failed to send {}: {}", message_type, e);
        }
    }

    fn client_info_in(&self, state: &ChatState) -> MessageKind {
        let me = state.peers.me();
        let private_port = if self.settings.get().no_private_chat {
            0
        } else {
            me.private_port
        };

        MessageKind::Client(ClientInfo {
            client: format!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION")),
            uptime_ms: now_millis() - me.logon_time,
            operating_system: std::env::consts::OS.to_string(),
            private_port,
            tcp_port: 0,
        })
    }

    fn exposing_in(&self, state: &ChatState) -> MessageKind {
        let me = state.peers.me();
        let away_message = if me.away {
            me.away_message.clone()
        } else {
            String::new()
        };
        MessageKind::Exposing { away_message }
    }

    /// Identify this client (reply to an expose request)
    pub async fn send_exposing(&self) {
        let state = self.state.read().await;
        self.announce_in(&state, self.exposing_in(&state));
    }

    /// Announce client details
    pub async fn send_client_info(&self) {
        let state = self.state.read().await;
        self.announce_in(&state, self.client_info_in(&state));
    }

    /// Ask every peer to identify itself
    pub async fn send_expose(&self) {
        let state = self.state.read().await;
        self.announce_in(&state, MessageKind::Expose);
    }

    /// Ask for the current topic
    pub async fn send_get_topic(&self) {
        let state = self.state.read().await;
        self.announce_in(&state, MessageKind::GetTopic);
    }

    /// Answer a topic request with the current topic
    pub async fn send_topic_requested(&self) {
        let state = self.state.read().await;
        self.announce_in(&state, MessageKind::Topic(state.session.topic.to_payload()));
    }

    /// Tell a newcomer that `nick` is already taken by us
    pub async fn send_nick_crash(&self, nick: &str) {
        let state = self.state.read().await;
        self.announce_in(
            &state,
            MessageKind::NickCrash {
                nick: nick.to_string(),
            },
        );
    }

    /// Report an expected failure to the user
    pub fn report(&self, error: &SessionError) {
        self.notifier.error(error.to_user_message());
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.confirm_task.lock()
            && let Some(task) = slot.take()
        {
            task.abort();
        }
    }
}
