//! Inbound message handling
//!
//! The responder consumes [`NetworkEvent`]s and applies every decoded message
//! to the session: peers joining and leaving, presence changes, chat lines,
//! the topic and file offers. Handlers that only reply call the session's
//! send methods; handlers that change state take the session's write lock
//! once and do all their work under it.

mod chat;
mod files;
mod presence;

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use lanchat_common::protocol::{Message, MessageKind, MessageType};
use lanchat_common::validators::validate_nickname;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::network::NetworkEvent;
use crate::session::{ChatState, SessionController};

/// Applies inbound protocol messages to a session
pub struct MessageResponder {
    session: Arc<SessionController>,
    /// Unknown senders already asked to identify themselves
    waiting: Mutex<HashSet<u32>>,
}

impl MessageResponder {
    pub fn new(session: Arc<SessionController>) -> Self {
        Self {
            session,
            waiting: Mutex::new(HashSet::new()),
        }
    }

    /// Handle events until the network service goes away
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<NetworkEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!("Network event stream closed");
    }

    /// Handle one network event
    pub async fn handle_event(&self, event: NetworkEvent) {
        match event {
            NetworkEvent::Message { message, source } => {
                self.handle_message(message, source).await;
            }
            NetworkEvent::LinkUp => self.session.network_came_up(false).await,
            NetworkEvent::LinkDown => self.session.network_went_down(false).await,
        }
    }

    /// Handle one decoded message received from `source`
    pub async fn handle_message(&self, message: Message, source: IpAddr) {
        trace!("{} from {} ({})", message.message_type(), message.code, source);

        let (me, logged_on) = {
            let state = self.session.read().await;
            (state.peers.me().code(), state.session.is_logged_on())
        };

        if message.code == me {
            self.handle_own_message(&message, source, logged_on).await;
            return;
        }
        if !logged_on {
            trace!("Not logged on, dropping {}", message.message_type());
            return;
        }
        if let Some(target) = message.kind.target()
            && target != me
        {
            trace!("{} meant for {}", message.message_type(), target);
            return;
        }
        if self.needs_identification(&message).await {
            return;
        }

        let code = message.code;
        match message.kind {
            MessageKind::Logon => self.on_logon(code, &message.nick, source).await,
            MessageKind::Logoff => self.on_logoff(code).await,
            MessageKind::Exposing { away_message } => {
                self.on_exposing(code, &message.nick, &away_message, source)
                    .await
            }
            MessageKind::Expose => {
                self.session.send_exposing().await;
                self.session.send_client_info().await;
            }
            MessageKind::NickCrash { nick } => self.on_nick_crash(&nick).await,
            MessageKind::Away { message } => self.on_away_changed(code, true, &message).await,
            MessageKind::Back => self.on_away_changed(code, false, "").await,
            MessageKind::Writing => self.on_writing_changed(code, true).await,
            MessageKind::StoppedWriting => self.on_writing_changed(code, false).await,
            MessageKind::GetTopic => self.session.send_topic_requested().await,
            MessageKind::Topic(payload) => self.on_topic(payload).await,
            MessageKind::Nick => self.on_nick_changed(code, &message.nick).await,
            MessageKind::Idle => self.on_idle(code, source).await,
            MessageKind::Chat { color, text } => self.on_chat(code, color, &text).await,
            MessageKind::PrivateMessage { color, text, .. } => {
                self.on_private_message(code, color, &text).await
            }
            MessageKind::Client(info) => self.on_client_info(code, &info).await,
            MessageKind::FileOffer { file, size } => self.on_file_offer(code, file, size).await,
            MessageKind::FileAccept { file, port } => self.on_file_accept(code, file, port).await,
            MessageKind::FileAbort { file } => self.on_file_abort(code, file).await,
        }
    }

    /// Own messages are echoes: only logon and idle matter
    async fn handle_own_message(&self, message: &Message, source: IpAddr, logged_on: bool) {
        match message.kind {
            MessageKind::Logon => self.session.me_logged_on(source).await,
            MessageKind::Idle if logged_on => self.on_own_idle(source).await,
            _ => {}
        }
    }

    /// Ask an unknown sender to identify itself, once
    ///
    /// Returns true when the message must be dropped because its sender is
    /// not known yet. Happens after a peer came back from a timeout.
    async fn needs_identification(&self, message: &Message) -> bool {
        let identifies = matches!(
            message.message_type(),
            MessageType::Logon
                | MessageType::Logoff
                | MessageType::Exposing
                | MessageType::Expose
                | MessageType::GetTopic
                | MessageType::Topic
                | MessageType::NickCrash
        );
        if identifies || self.session.read().await.peers.contains(message.code) {
            return false;
        }

        let first_time = self
            .waiting
            .lock()
            .expect("waiting list lock poisoned")
            .insert(message.code);
        if first_time {
            debug!("Unknown sender {}, asking everyone to identify", message.code);
            self.session.send_expose().await;
        }
        true
    }

    fn stop_waiting(&self, code: u32) {
        self.waiting
            .lock()
            .expect("waiting list lock poisoned")
            .remove(&code);
    }
}

/// Nick to record for a newcomer
///
/// A nick equal to our own (ignoring case) is a crash: the newcomer is told
/// and recorded by its code. Nicks in use by others or invalid are replaced by
/// the code silently. Returns the nick and whether it was a crash.
fn admissible_nick(state: &ChatState, code: u32, nick: &str) -> (String, bool) {
    if state.peers.me().has_nick(nick.trim()) {
        (code.to_string(), true)
    } else if state.peers.is_nick_in_use(nick) || validate_nickname(nick).is_err() {
        (code.to_string(), false)
    } else {
        (nick.to_string(), false)
    }
}
