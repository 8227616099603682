//! UDP network service
//!
//! One socket joins the multicast group for the main chat, a second one
//! receives private messages. Outbound messages go through an unbounded
//! channel to a sender task; inbound datagrams are decoded and forwarded as
//! [`NetworkEvent`]s. A watcher probes the link periodically and reports
//! when it goes down or comes back.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use lanchat_common::codec;
use lanchat_common::protocol::Message;
use lanchat_common::{
    DEFAULT_CHAT_PORT, DEFAULT_PRIVATE_CHAT_PORT, MAX_PACKET_SIZE, MULTICAST_ADDRESS,
};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::messenger::{Messenger, SendError};
use super::socket;
use crate::constants::NETWORK_CHECK_INTERVAL;

/// Where and how to bind
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub chat_port: u16,
    pub private_port: u16,
    pub multicast_group: Ipv4Addr,
    /// Bind the private chat socket at all
    pub private_chat: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chat_port: DEFAULT_CHAT_PORT,
            private_port: DEFAULT_PRIVATE_CHAT_PORT,
            multicast_group: MULTICAST_ADDRESS,
            private_chat: true,
        }
    }
}

/// Something the network observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A decoded message and the address it came from
    Message { message: Message, source: IpAddr },
    /// The link works again after being down
    LinkUp,
    /// The link stopped working
    LinkDown,
}

/// Fatal errors while acquiring network resources
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("failed to bind chat port {port}: {source}")]
    ChatBind { port: u16, source: std::io::Error },
    #[error("failed to bind private chat port: {0}")]
    PrivateBind(std::io::Error),
}

/// A queued outbound datagram
#[derive(Debug)]
enum Outbound {
    Broadcast(String),
    Unicast(SocketAddr, String),
}

/// Running network service
pub struct NetworkService {
    outbound: mpsc::UnboundedSender<Outbound>,
    link_up: Arc<AtomicBool>,
    private_port: u16,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NetworkService {
    /// Bind the sockets and spawn the network tasks
    ///
    /// Must be called from within a tokio runtime. Returns the service and
    /// the stream of inbound events.
    pub fn start(
        config: NetworkConfig,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<NetworkEvent>), NetworkError> {
        let chat_socket = socket::bind_multicast(config.chat_port, config.multicast_group)
            .map_err(|source| NetworkError::ChatBind {
                port: config.chat_port,
                source,
            })?;
        let chat_socket = Arc::new(chat_socket);

        let (private_socket, private_port) = if config.private_chat {
            let (socket, port) =
                socket::bind_private(config.private_port).map_err(NetworkError::PrivateBind)?;
            (Some(Arc::new(socket)), port)
        } else {
            (None, 0)
        };

        info!(
            "Listening on {}:{} (private chat port {})",
            config.multicast_group, config.chat_port, private_port
        );

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let link_up = Arc::new(AtomicBool::new(true));
        let group = SocketAddr::from((config.multicast_group, config.chat_port));

        let mut tasks = vec![
            tokio::spawn(receive_loop(Arc::clone(&chat_socket), events_tx.clone())),
            tokio::spawn(send_loop(
                outbound_rx,
                Arc::clone(&chat_socket),
                private_socket.clone(),
                group,
                Arc::clone(&link_up),
                events_tx.clone(),
            )),
            tokio::spawn(link_watcher(group, Arc::clone(&link_up), events_tx.clone())),
        ];
        if let Some(private_socket) = private_socket {
            tasks.push(tokio::spawn(receive_loop(private_socket, events_tx)));
        }

        let service = Arc::new(Self {
            outbound: outbound_tx,
            link_up,
            private_port,
            tasks: Mutex::new(tasks),
        });

        Ok((service, events_rx))
    }

    /// Port private messages are received on (0 when private chat is off)
    pub fn private_port(&self) -> u16 {
        self.private_port
    }

    /// Stop every network task
    pub fn shutdown(&self) {
        self.link_up.store(false, Ordering::SeqCst);
        for task in self.tasks.lock().expect("network task lock poisoned").drain(..) {
            task.abort();
        }
    }

    fn queue(&self, message: &Message, target: Option<SocketAddr>) -> Result<(), SendError> {
        if !self.is_network_up() {
            return Err(SendError::NetworkDown);
        }

        let datagram = encode_datagram(message)?;
        trace!("Queueing {:?}: {}", target, datagram);

        let outbound = match target {
            Some(address) => Outbound::Unicast(address, datagram),
            None => Outbound::Broadcast(datagram),
        };

        self.outbound.send(outbound).map_err(|_| {
            self.link_up.store(false, Ordering::SeqCst);
            SendError::NetworkDown
        })
    }
}

impl Messenger for NetworkService {
    fn broadcast(&self, message: Message) -> Result<(), SendError> {
        self.queue(&message, None)
    }

    fn send_to(&self, address: SocketAddr, message: Message) -> Result<(), SendError> {
        self.queue(&message, Some(address))
    }

    fn is_network_up(&self) -> bool {
        self.link_up.load(Ordering::SeqCst)
    }
}

impl Drop for NetworkService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Encode a message, refusing anything that does not fit in one datagram
fn encode_datagram(message: &Message) -> Result<String, SendError> {
    let datagram = codec::encode(message);
    if datagram.len() > MAX_PACKET_SIZE {
        return Err(SendError::TooLarge(datagram.len()));
    }
    Ok(datagram)
}

/// Flip the link state, reporting only real changes
fn set_link(link_up: &AtomicBool, up: bool, events: &mpsc::UnboundedSender<NetworkEvent>) {
    if link_up.swap(up, Ordering::SeqCst) != up {
        let event = if up {
            info!("Network link is up");
            NetworkEvent::LinkUp
        } else {
            warn!("Network link is down");
            NetworkEvent::LinkDown
        };
        let _ = events.send(event);
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, events: mpsc::UnboundedSender<NetworkEvent>) {
    let mut buffer = vec![0u8; MAX_PACKET_SIZE];

    loop {
        let (len, from) = match socket.recv_from(&mut buffer).await {
            Ok(received) => received,
            Err(e) => {
                warn!("Receive failed: {}", e);
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                continue;
            }
        };

        let Ok(text) = std::str::from_utf8(&buffer[..len]) else {
            warn!("Dropped non-UTF-8 datagram from {}", from);
            continue;
        };

        match codec::decode(text) {
            Ok(message) => {
                trace!("Received from {}: {}", from, text);
                let event = NetworkEvent::Message {
                    message,
                    source: from.ip(),
                };
                if events.send(event).is_err() {
                    debug!("Event receiver gone, stopping receive loop");
                    return;
                }
            }
            Err(e) => warn!("Dropped datagram from {}: {}", from, e),
        }
    }
}

async fn send_loop(
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    chat_socket: Arc<UdpSocket>,
    private_socket: Option<Arc<UdpSocket>>,
    group: SocketAddr,
    link_up: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<NetworkEvent>,
) {
    while let Some(item) = outbound.recv().await {
        let result = match &item {
            Outbound::Broadcast(datagram) => chat_socket.send_to(datagram.as_bytes(), group).await,
            Outbound::Unicast(address, datagram) => {
                let socket = private_socket.as_ref().unwrap_or(&chat_socket);
                socket.send_to(datagram.as_bytes(), address).await
            }
        };

        if let Err(e) = result {
            warn!("Send failed: {}", e);
            set_link(&link_up, false, &events);
        }
    }
}

async fn link_watcher(
    group: SocketAddr,
    link_up: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<NetworkEvent>,
) {
    let IpAddr::V4(group_ip) = group.ip() else {
        return;
    };

    loop {
        tokio::time::sleep(NETWORK_CHECK_INTERVAL).await;

        let routable = socket::probe_route(group_ip, group.port()).await;
        set_link(&link_up, routable, &events);

        if events.is_closed() {
            return;
        }
    }
}
