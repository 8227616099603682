//! User-visible notices
//!
//! Components report everything the user should see (system messages,
//! validation failures, chat lines) through a [`Notifier`] injected at
//! construction. Front ends register a [`NoticeListener`] to receive them and
//! unregister it when they go away.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Something the user should see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Informational system message in the main chat
    System(String),
    /// A failed user action
    Error(String),
    /// A failure the client cannot recover from on its own
    Critical(String),
    /// A main chat line
    Chat {
        nick: String,
        color: i32,
        text: String,
    },
    /// A private chat line, incoming or outgoing
    Private {
        peer: String,
        outgoing: bool,
        text: String,
    },
    /// A system message shown in a private conversation
    PrivateSystem { peer: String, text: String },
}

/// Receiver of notices
pub trait NoticeListener: Send + Sync {
    /// Called for every notice, in emission order
    fn on_notice(&self, notice: &Notice);
}

/// Handle returned by [`Notifier::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Fan-out of notices to registered listeners
pub struct Notifier {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn NoticeListener>)>>,
    next_id: AtomicU64,
}

impl Notifier {
    /// Create a notifier with no listeners
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener
    pub fn register(&self, listener: Arc<dyn NoticeListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .expect("notifier lock poisoned")
            .push((id, listener));
        id
    }

    /// Unregister a listener, returns false if it was not registered
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().expect("notifier lock poisoned");
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().expect("notifier lock poisoned").len()
    }

    /// Deliver a notice to every listener
    pub fn emit(&self, notice: Notice) {
        // Listeners run outside the lock so they may register or unregister
        let listeners: Vec<Arc<dyn NoticeListener>> = self
            .listeners
            .lock()
            .expect("notifier lock poisoned")
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener.on_notice(&notice);
        }
    }

    /// Emit a system message
    pub fn system(&self, text: impl Into<String>) {
        self.emit(Notice::System(text.into()));
    }

    /// Emit an error message
    pub fn error(&self, text: impl Into<String>) {
        self.emit(Notice::Error(text.into()));
    }

    /// Emit a critical error message
    pub fn critical(&self, text: impl Into<String>) {
        self.emit(Notice::Critical(text.into()));
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
