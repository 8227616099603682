//! Connection state of the local session

use super::topic::Topic;

/// Where the session is in the logon sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Not logged on
    Disconnected,
    /// Logon sent, own logon not seen on the network yet
    Connecting,
    /// Logged on; `confirmed` once the logon settled
    Connected { confirmed: bool },
}

/// Flags and topic owned by the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// A logon sequence was sent and is waiting for its echo
    pub(crate) logging_on: bool,
    /// Own logon was seen on the network
    pub(crate) logged_on: bool,
    /// The confirmation delay passed with the link up
    pub(crate) logon_completed: bool,
    /// Own typing flag as last announced
    pub(crate) own_writing: bool,
    /// The last liveness sweep removed at least one peer
    pub(crate) peers_timed_out: bool,
    pub(crate) topic: Topic,
}

impl SessionState {
    /// Current phase derived from the flags
    pub fn phase(&self) -> SessionPhase {
        if self.logged_on {
            SessionPhase::Connected {
                confirmed: self.logon_completed,
            }
        } else if self.logging_on {
            SessionPhase::Connecting
        } else {
            SessionPhase::Disconnected
        }
    }

    pub fn is_logged_on(&self) -> bool {
        self.logged_on
    }

    /// Whether the logon settled (used to tell startup noise from live changes)
    pub fn is_logon_completed(&self) -> bool {
        self.logon_completed
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}
