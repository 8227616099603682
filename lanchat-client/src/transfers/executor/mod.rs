//! Transfer executor - moves file data over TCP
//!
//! The receiver listens on the first free port starting at the default
//! transfer port and announces it in a file-accept message. The sender then
//! connects and streams the file. Both loops race every read and write against
//! the transfer's cancellation signal, so a cancel from another task stops
//! them promptly.

mod file_utils;
mod streaming;

pub use file_utils::{remove_partial, unique_destination};

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tracing::debug;

use super::{Transfer, TransferError};

// =============================================================================
// Constants
// =============================================================================

/// Buffer size for file and socket I/O
pub const BUFFER_SIZE: usize = 8 * 1024;

/// Bound on every single read or write
pub const IO_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a receiver waits for the sender to connect
pub const ACCEPT_TIMEOUT: Duration = Duration::from_secs(15);

/// Grace period before the sender connects, so the receiver is listening
const CONNECT_DELAY: Duration = Duration::from_millis(200);

/// Connection attempts before a sender gives up
const CONNECT_ATTEMPTS: u32 = 10;

/// Pause between connection attempts
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

// =============================================================================
// Receiving
// =============================================================================

/// Listen on the first free port in `first_port .. first_port + attempts`
///
/// Returns the listener and the port actually bound.
pub async fn bind_receiver(first_port: u16, attempts: u16) -> Result<(TcpListener, u16), TransferError> {
    for offset in 0..attempts {
        let Some(port) = first_port.checked_add(offset) else {
            break;
        };

        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                let port = listener
                    .local_addr()
                    .map(|addr| addr.port())
                    .unwrap_or(port);
                return Ok((listener, port));
            }
            Err(e) => debug!("Transfer port {} unavailable: {}", port, e),
        }
    }

    Err(TransferError::NoFreePort)
}

/// Wait for the sender and write the stream to the transfer's destination
///
/// On success the transfer is Completed. On failure the partial file is
/// removed; the caller decides how to report it.
pub async fn receive_file(listener: TcpListener, transfer: &Transfer) -> Result<u64, TransferError> {
    let destination = transfer
        .destination()
        .ok_or_else(|| TransferError::Io("not an incoming transfer".to_string()))?;

    let (mut socket, remote) = tokio::select! {
        biased;
        _ = transfer.cancelled() => return Err(TransferError::Cancelled),
        result = timeout(ACCEPT_TIMEOUT, listener.accept()) => match result {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => return Err(TransferError::Io(e.to_string())),
            Err(_) => return Err(TransferError::Timeout),
        },
    };
    drop(listener);
    debug!("Receiving {} from {}", transfer.file_name(), remote);

    transfer.start_streaming()?;

    let mut file = File::create(&destination)
        .await
        .map_err(|e| TransferError::Io(e.to_string()))?;

    let result = streaming::stream(&mut socket, &mut file, transfer).await;
    drop(file);

    match result {
        Ok(received) => {
            transfer.complete()?;
            Ok(received)
        }
        Err(e) => {
            remove_partial(&destination).await;
            Err(e)
        }
    }
}

// =============================================================================
// Sending
// =============================================================================

/// Connect to the receiver and stream the transfer's source file
///
/// On success the transfer is Completed.
pub async fn send_file(address: SocketAddr, transfer: &Transfer) -> Result<u64, TransferError> {
    let source = transfer
        .source()
        .ok_or_else(|| TransferError::Io("not an outgoing transfer".to_string()))?;

    let mut file = File::open(&source)
        .await
        .map_err(|e| TransferError::Io(e.to_string()))?;

    tokio::select! {
        biased;
        _ = transfer.cancelled() => return Err(TransferError::Cancelled),
        _ = sleep(CONNECT_DELAY) => {}
    }

    let mut socket = connect_with_retries(address, transfer).await?;
    debug!("Sending {} to {}", transfer.file_name(), address);

    transfer.start_streaming()?;

    let sent = streaming::stream(&mut file, &mut socket, transfer).await?;

    // The receiver counts bytes, a failed shutdown does not lose data
    if let Err(e) = socket.shutdown().await {
        debug!("Shutdown after sending {} failed: {}", transfer.file_name(), e);
    }

    transfer.complete()?;
    Ok(sent)
}

async fn connect_with_retries(address: SocketAddr, transfer: &Transfer) -> Result<TcpStream, TransferError> {
    for attempt in 1..=CONNECT_ATTEMPTS {
        let result = tokio::select! {
            biased;
            _ = transfer.cancelled() => return Err(TransferError::Cancelled),
            result = timeout(IO_TIMEOUT, TcpStream::connect(address)) => result,
        };

        match result {
            Ok(Ok(socket)) => return Ok(socket),
            Ok(Err(e)) => debug!("Connect attempt {} to {} failed: {}", attempt, address, e),
            Err(_) => debug!("Connect attempt {} to {} timed out", attempt, address),
        }

        tokio::select! {
            biased;
            _ = transfer.cancelled() => return Err(TransferError::Cancelled),
            _ = sleep(CONNECT_RETRY_DELAY) => {}
        }
    }

    Err(TransferError::ConnectionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfers::TransferState;
    use std::sync::Arc;
    use tempfile::TempDir;

    const PEER: u32 = 22222222;

    fn pair(dir: &TempDir, content: &[u8]) -> (Arc<Transfer>, Arc<Transfer>) {
        let source = dir.path().join("source.bin");
        std::fs::write(&source, content).unwrap();
        let size = content.len() as u64;

        let sender = Transfer::outgoing(PEER, source, "source.bin".to_string(), 99, size);
        let receiver = Transfer::incoming(
            PEER,
            dir.path().join("received.bin"),
            "source.bin".to_string(),
            99,
            size,
        );
        sender.accept().unwrap();
        receiver.accept().unwrap();
        (Arc::new(sender), Arc::new(receiver))
    }

    #[tokio::test]
    async fn test_bind_receiver_reports_bound_port() {
        let (listener, port) = bind_receiver(0, 1).await.unwrap();
        assert_ne!(port, 0);
        assert_eq!(listener.local_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_send_and_receive() {
        let dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        let (sender, receiver) = pair(&dir, &content);

        let (listener, port) = bind_receiver(0, 1).await.unwrap();
        let receive = {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move { receive_file(listener, &receiver).await })
        };

        let address = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        assert_eq!(send_file(address, &sender).await.unwrap(), 50_000);
        assert_eq!(receive.await.unwrap().unwrap(), 50_000);

        assert_eq!(sender.state(), TransferState::Completed);
        assert_eq!(receiver.state(), TransferState::Completed);
        assert_eq!(receiver.percent(), 100);
        assert_eq!(std::fs::read(dir.path().join("received.bin")).unwrap(), content);
    }

    #[tokio::test]
    async fn test_short_stream_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        let receiver = Arc::new(Transfer::incoming(
            PEER,
            dir.path().join("partial.bin"),
            "partial.bin".to_string(),
            1,
            1000,
        ));
        receiver.accept().unwrap();

        let (listener, port) = bind_receiver(0, 1).await.unwrap();
        let receive = {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move { receive_file(listener, &receiver).await })
        };

        let mut socket = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap();
        socket.write_all(&[1u8; 10]).await.unwrap();
        drop(socket);

        let result = receive.await.unwrap();
        assert_eq!(
            result,
            Err(TransferError::ShortStream {
                expected: 1000,
                received: 10
            })
        );
        assert!(!dir.path().join("partial.bin").exists());
    }

    #[tokio::test]
    async fn test_cancel_unblocks_waiting_receiver() {
        let dir = TempDir::new().unwrap();
        let receiver = Arc::new(Transfer::incoming(
            PEER,
            dir.path().join("never.bin"),
            "never.bin".to_string(),
            1,
            1000,
        ));
        receiver.accept().unwrap();

        let (listener, _) = bind_receiver(0, 1).await.unwrap();
        let receive = {
            let receiver = Arc::clone(&receiver);
            tokio::spawn(async move { receive_file(listener, &receiver).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        receiver.cancel().unwrap();

        let result = timeout(Duration::from_secs(2), receive)
            .await
            .expect("cancel should unblock the receiver")
            .unwrap();
        assert_eq!(result, Err(TransferError::Cancelled));
    }

    #[tokio::test]
    async fn test_sender_gives_up_without_receiver() {
        let dir = TempDir::new().unwrap();
        let (sender, _) = pair(&dir, b"hello");

        // Bind and drop to find a port nobody listens on
        let (listener, port) = bind_receiver(0, 1).await.unwrap();
        drop(listener);

        let address = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        assert_eq!(
            send_file(address, &sender).await,
            Err(TransferError::ConnectionFailed)
        );
        assert_eq!(sender.state(), TransferState::Accepted);
    }
}
