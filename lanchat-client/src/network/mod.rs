//! Network layer: messaging seam, sockets and the UDP service

mod messenger;
mod service;
mod socket;

pub use messenger::{Messenger, SendError};
pub use service::{NetworkConfig, NetworkError, NetworkEvent, NetworkService};
