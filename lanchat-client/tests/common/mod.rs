//! Shared helpers for the client integration tests
//!
//! Sessions built here talk to a [`RecordingMessenger`] instead of the
//! network and report to a [`RecordingListener`] instead of the terminal.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lanchat_client::config::{Settings, SettingsStore};
use lanchat_client::network::{Messenger, SendError};
use lanchat_client::notices::{Notice, NoticeListener, Notifier};
use lanchat_client::peers::Peer;
use lanchat_client::responder::MessageResponder;
use lanchat_client::session::{SessionController, SessionPhase};
use lanchat_client::transfers::TransferRegistry;
use lanchat_common::protocol::{ClientInfo, Message, MessageKind, MessageType};
use tempfile::TempDir;

/// Code of the local user in every test session
pub const ME: u32 = 11111111;

/// Nick of the local user
pub const MY_NICK: &str = "Me";

/// Address the local user logs on from
pub const MY_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 10));

/// A second user
pub const TINA: u32 = 22222222;

/// A third user
pub const PETER: u32 = 33333333;

/// Private chat port the test peers announce
pub const PEER_PRIVATE_PORT: u16 = 40657;

/// Address of a test peer, derived from its code
pub fn peer_ip(code: u32) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(192, 168, 1, (code % 200) as u8 + 20))
}

// ============================================================================
// Recording messenger
// ============================================================================

/// One message handed to the messenger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Broadcast(Message),
    Unicast(SocketAddr, Message),
}

impl Sent {
    pub fn message(&self) -> &Message {
        match self {
            Sent::Broadcast(message) | Sent::Unicast(_, message) => message,
        }
    }
}

/// Messenger that records instead of sending
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    up: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            up: AtomicBool::new(true),
        }
    }

    /// Simulate the link going down or coming back
    pub fn set_up(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    /// Types of everything sent so far, in order
    pub fn types(&self) -> Vec<MessageType> {
        self.sent()
            .iter()
            .map(|sent| sent.message().message_type())
            .collect()
    }

    pub fn broadcasts(&self) -> Vec<Message> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Broadcast(message) => Some(message),
                Sent::Unicast(..) => None,
            })
            .collect()
    }

    pub fn unicasts(&self) -> Vec<(SocketAddr, Message)> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Unicast(address, message) => Some((address, message)),
                Sent::Broadcast(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Messenger for RecordingMessenger {
    fn broadcast(&self, message: Message) -> Result<(), SendError> {
        if !self.is_network_up() {
            return Err(SendError::NetworkDown);
        }
        self.sent.lock().unwrap().push(Sent::Broadcast(message));
        Ok(())
    }

    fn send_to(&self, address: SocketAddr, message: Message) -> Result<(), SendError> {
        if !self.is_network_up() {
            return Err(SendError::NetworkDown);
        }
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Unicast(address, message));
        Ok(())
    }

    fn is_network_up(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Recording listener
// ============================================================================

/// Listener that keeps every notice
#[derive(Default)]
pub struct RecordingListener {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingListener {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn systems(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::System(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl NoticeListener for RecordingListener {
    fn on_notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

// ============================================================================
// Test session
// ============================================================================

/// A session wired to recorders, with its own settings and download dirs
pub struct TestSession {
    pub session: Arc<SessionController>,
    pub responder: MessageResponder,
    pub messenger: Arc<RecordingMessenger>,
    pub listener: Arc<RecordingListener>,
    pub dir: TempDir,
}

impl TestSession {
    /// Directory received files are written to
    pub fn download_dir(&self) -> PathBuf {
        self.dir.path().join("downloads")
    }

    /// Path of the settings file
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.json")
    }

    /// Deliver a message from `code` as if it came from the network
    pub async fn receive(&self, code: u32, nick: &str, kind: MessageKind) {
        let source = if code == ME { MY_IP } else { peer_ip(code) };
        self.responder
            .handle_message(Message::new(code, nick, kind), source)
            .await;
    }

    /// Make a peer known by letting it log on and announce its client info
    pub async fn add_peer(&self, code: u32, nick: &str) {
        self.receive(code, nick, MessageKind::Logon).await;
        self.receive(
            code,
            nick,
            MessageKind::Client(ClientInfo {
                client: "LanChat v0.3.0".to_string(),
                uptime_ms: 1000,
                operating_system: "linux".to_string(),
                private_port: PEER_PRIVATE_PORT,
                tcp_port: 0,
            }),
        )
        .await;
    }

    /// Forget everything recorded so far
    pub fn clear(&self) {
        self.messenger.clear();
        self.listener.clear();
    }

    /// Wait for the logon confirmation delay to pass
    pub async fn wait_for_confirmation(&self) {
        for _ in 0..40 {
            if self.session.phase().await == (SessionPhase::Connected { confirmed: true }) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("Logon was never confirmed");
    }
}

/// Build a session that has not logged on yet
pub fn new_session() -> TestSession {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let settings = Settings {
        nick: MY_NICK.to_string(),
        download_dir: Some(dir.path().join("downloads")),
        ..Settings::default()
    };
    std::fs::create_dir_all(dir.path().join("downloads")).unwrap();
    let settings = Arc::new(SettingsStore::new(
        settings,
        Some(dir.path().join("config.json")),
    ));

    let messenger = Arc::new(RecordingMessenger::new());
    let listener = Arc::new(RecordingListener::default());
    let notifier = Arc::new(Notifier::new());
    notifier.register(listener.clone());

    let mut me = Peer::new_self(ME, MY_NICK, lanchat_client::clock::now_millis());
    me.private_port = 40656;

    let session = SessionController::new(
        me,
        messenger.clone(),
        Arc::new(TransferRegistry::new()),
        notifier,
        settings,
    );
    let responder = MessageResponder::new(Arc::clone(&session));

    TestSession {
        session,
        responder,
        messenger,
        listener,
        dir,
    }
}

/// Build a session that is logged on, with the recorders cleared
pub async fn logged_on_session() -> TestSession {
    let test = new_session();
    test.session.log_on().await;
    test.receive(ME, MY_NICK, MessageKind::Logon).await;
    test.clear();
    test
}
