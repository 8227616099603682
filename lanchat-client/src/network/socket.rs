//! Socket construction
//!
//! Sockets are configured with `socket2` (address reuse, multicast
//! membership) and then handed to tokio.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

/// Multicast datagrams stay on the local network segment
const MULTICAST_TTL: u32 = 1;

/// Bind the main chat socket and join the multicast group
///
/// Loopback stays enabled so the client sees its own logon and liveness
/// messages, which is how it learns its own address.
pub fn bind_multicast(port: u16, group: Ipv4Addr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;
    socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
    socket.set_multicast_loop_v4(true)?;
    socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
    socket.set_nonblocking(true)?;

    UdpSocket::from_std(socket.into())
}

/// Bind the private chat socket, falling back to an ephemeral port
///
/// Returns the socket and the port actually bound.
pub fn bind_private(port: u16) -> io::Result<(UdpSocket, u16)> {
    let socket = match bind_unicast(port) {
        Ok(socket) => socket,
        Err(e) if port != 0 => {
            tracing::warn!("Private chat port {} unavailable ({}), using a random port", port, e);
            bind_unicast(0)?
        }
        Err(e) => return Err(e),
    };

    let bound = socket.local_addr()?.port();
    Ok((socket, bound))
}

fn bind_unicast(port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;
    socket.set_nonblocking(true)?;

    UdpSocket::from_std(socket.into())
}

/// Check whether the multicast group is routable right now
///
/// Connecting a UDP socket sends nothing but fails without a usable route.
pub async fn probe_route(group: Ipv4Addr, port: u16) -> bool {
    let Ok(socket) = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await else {
        return false;
    };
    socket.connect((group, port)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_private_socket_falls_back_when_busy() {
        let (first, port) = bind_private(0).unwrap();
        assert_ne!(port, 0);

        let (_second, fallback) = bind_private(port).unwrap();
        assert_ne!(fallback, port);
        drop(first);
    }

    #[tokio::test]
    async fn test_private_socket_round_trip() {
        let (receiver, port) = bind_private(0).unwrap();
        let (sender, _) = bind_private(0).unwrap();

        sender
            .send_to(b"hello", (Ipv4Addr::LOCALHOST, port))
            .await
            .unwrap();

        let mut buf = [0u8; 16];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"hello");
    }
}
