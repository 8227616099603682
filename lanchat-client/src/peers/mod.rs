//! The set of known peers
//!
//! The local user is always present exactly once. Codes never change after a
//! peer is added, and nicks stay unique (ignoring case) across the whole set.
//! The list itself is not synchronized; the session owns it behind its lock.

mod mutations;
mod peer;
mod queries;

use std::collections::HashMap;

pub use peer::{Peer, PrivateChat};

/// Errors from changing the peer set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PeerError {
    /// Another peer already has this code
    #[error("user code {0} is already in use")]
    CodeInUse(u32),
    /// Another peer already has this nick
    #[error("nick {0} is already in use")]
    NickInUse(String),
    /// No peer has this code
    #[error("unknown user code {0}")]
    UnknownPeer(u32),
    /// The operation is not allowed on the local user
    #[error("operation not allowed on yourself")]
    SelfPeer,
}

/// All peers known to this client, including the local user
#[derive(Debug, Clone)]
pub struct PeerList {
    me: Peer,
    others: HashMap<u32, Peer>,
}

impl PeerList {
    /// Create a list containing only the local user
    pub fn new(mut me: Peer) -> Self {
        me.is_self = true;
        Self {
            me,
            others: HashMap::new(),
        }
    }
}
