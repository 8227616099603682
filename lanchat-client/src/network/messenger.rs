//! Outbound messaging seam
//!
//! The session controller talks to the network only through [`Messenger`],
//! so tests can record traffic instead of sending it.

use std::net::SocketAddr;

use lanchat_common::protocol::Message;

/// Error returned when a message cannot be queued for sending
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The link is down or the sender task is gone
    #[error("network is down")]
    NetworkDown,
    /// The encoded message does not fit in one datagram
    #[error("message is too large ({0} bytes)")]
    TooLarge(usize),
}

/// Fire-and-forget message delivery
///
/// Calls never block on the network and nothing is acknowledged.
pub trait Messenger: Send + Sync {
    /// Send to every peer on the main chat
    fn broadcast(&self, message: Message) -> Result<(), SendError>;

    /// Send to a single peer's private chat port
    fn send_to(&self, address: SocketAddr, message: Message) -> Result<(), SendError>;

    /// Whether the link is currently usable
    fn is_network_up(&self) -> bool;
}
