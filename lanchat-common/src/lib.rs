//! LanChat Common Library
//!
//! Shared types, wire protocol, and validators for the LanChat serverless
//! LAN chat.

pub mod code;
pub mod codec;
pub mod hash;
pub mod protocol;
pub mod validators;

use std::net::Ipv4Addr;

/// Client name announced in client-info messages
pub const APP_NAME: &str = "LanChat";

/// UDP port for the multicast main chat
pub const DEFAULT_CHAT_PORT: u16 = 40556;

/// UDP port for unicast private messages
pub const DEFAULT_PRIVATE_CHAT_PORT: u16 = 40656;

/// First TCP port a file receiver tries to listen on
pub const DEFAULT_TRANSFER_PORT: u16 = 40756;

/// Number of consecutive ports a file receiver tries before giving up
pub const TRANSFER_PORT_ATTEMPTS: u16 = 50;

/// Multicast group every peer joins for the main chat
pub const MULTICAST_ADDRESS: Ipv4Addr = Ipv4Addr::new(224, 168, 5, 200);

/// Largest datagram read from or written to the network
pub const MAX_PACKET_SIZE: usize = 512;

pub use validators::{MAX_MESSAGE_BYTES, MAX_NICKNAME_LENGTH};
