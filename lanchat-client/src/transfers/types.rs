//! Transfer types and the transfer state machine
//!
//! ```text
//! Offered --accept--> Accepted --stream--> InProgress --complete--> Completed
//! Offered --reject--> Rejected
//! Offered | Accepted | InProgress --cancel--> Cancelled
//! ```
//!
//! Completed, Rejected and Cancelled are terminal. A transfer never moves
//! back to an earlier state.

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use super::meter::ThroughputMeter;

/// Ids are derived from the file hash, keeping them short enough to type
const TRANSFER_ID_MODULUS: u32 = 100_000;

// =============================================================================
// Transfer Id
// =============================================================================

/// Transfer number shown to the user
///
/// Derived from the file identity, so both ends show the same number. It is
/// only unique per peer and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(u32);

impl TransferId {
    /// Derive the id from a file hash
    pub fn from_file_hash(hash: u32) -> Self {
        Self(hash % TRANSFER_ID_MODULUS)
    }
}

impl From<u32> for TransferId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Transfer Direction
// =============================================================================

/// Direction of a file transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    /// Local user sends a file to the peer
    Send,
    /// Peer sends a file to the local user
    Receive,
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => write!(f, "send"),
            Self::Receive => write!(f, "receive"),
        }
    }
}

/// Registry key: ids repeat across peers and directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferKey {
    pub peer: u32,
    pub id: TransferId,
    pub direction: TransferDirection,
}

// =============================================================================
// Transfer State
// =============================================================================

/// Lifecycle state of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Offer sent or received, waiting for an answer
    Offered,
    /// Receiver accepted, stream not established yet
    Accepted,
    /// Data is flowing
    InProgress,
    /// All bytes transferred
    Completed,
    /// Receiver declined the offer
    Rejected,
    /// Stopped by either side or by a failure
    Cancelled,
}

impl TransferState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferState::Completed | TransferState::Rejected | TransferState::Cancelled
        )
    }

    /// Accepted or streaming, so the destination file is claimed
    pub fn is_active(&self) -> bool {
        matches!(self, TransferState::Accepted | TransferState::InProgress)
    }

    /// Whether moving to `next` is allowed
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        use TransferState::*;

        matches!(
            (self, next),
            (Offered, Accepted)
                | (Offered, Rejected)
                | (Accepted, InProgress)
                | (InProgress, Completed)
                | (Offered | Accepted | InProgress, Cancelled)
        )
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Offered => "offered",
            TransferState::Accepted => "accepted",
            TransferState::InProgress => "in progress",
            TransferState::Completed => "completed",
            TransferState::Rejected => "rejected",
            TransferState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A state change that the state machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("transfer can not go from {from} to {to}")]
pub struct InvalidTransition {
    pub from: TransferState,
    pub to: TransferState,
}

// =============================================================================
// Transfer Error
// =============================================================================

/// Why a transfer stream failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// No free port to listen on
    #[error("no free transfer port")]
    NoFreePort,
    /// Could not connect to the receiver
    #[error("connection failed")]
    ConnectionFailed,
    /// The other side did not connect or stopped sending
    #[error("timed out")]
    Timeout,
    /// The stream ended before the declared size
    #[error("stream ended after {received} of {expected} bytes")]
    ShortStream { expected: u64, received: u64 },
    /// Local file error
    #[error("file error: {0}")]
    Io(String),
    /// The transfer was cancelled
    #[error("cancelled")]
    Cancelled,
    /// The peer address is not known
    #[error("peer address unknown")]
    NoPeerAddress,
    /// The state machine refused a step
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

impl TransferError {
    /// Get the i18n translation key for this error
    pub fn to_i18n_key(&self) -> &'static str {
        match self {
            TransferError::NoFreePort => "transfer-error-no-free-port",
            TransferError::ConnectionFailed => "transfer-error-connection",
            TransferError::Timeout => "transfer-error-timeout",
            TransferError::ShortStream { .. } => "transfer-error-short-stream",
            TransferError::Io(_) => "transfer-error-io",
            TransferError::Cancelled => "transfer-error-cancelled",
            TransferError::NoPeerAddress => "transfer-error-no-address",
            TransferError::Transition(_) => "transfer-error-state",
        }
    }
}

// =============================================================================
// Transfer
// =============================================================================

/// Mutable part of a transfer, guarded by one lock
#[derive(Debug)]
struct TransferInner {
    state: TransferState,
    /// Source file when sending, destination file when receiving
    path: PathBuf,
    meter: ThroughputMeter,
}

/// One file transfer with one peer in one direction
///
/// Shared between the registry and the task streaming the data. Progress
/// counters are atomics so the stream never blocks on readers.
#[derive(Debug)]
pub struct Transfer {
    id: TransferId,
    direction: TransferDirection,
    /// Code of the other peer
    peer: u32,
    /// File name as announced on the wire
    file_name: String,
    file_hash: u32,
    /// Declared size in bytes
    size: u64,
    transferred: AtomicU64,
    inner: Mutex<TransferInner>,
    cancel_tx: watch::Sender<bool>,
}

impl Transfer {
    fn new(
        direction: TransferDirection,
        peer: u32,
        file_name: String,
        file_hash: u32,
        size: u64,
        path: PathBuf,
    ) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            id: TransferId::from_file_hash(file_hash),
            direction,
            peer,
            file_name,
            file_hash,
            size,
            transferred: AtomicU64::new(0),
            inner: Mutex::new(TransferInner {
                state: TransferState::Offered,
                path,
                meter: ThroughputMeter::new(),
            }),
            cancel_tx,
        }
    }

    /// Create an outbound offer for a local file
    pub fn outgoing(
        peer: u32,
        source: PathBuf,
        file_name: String,
        file_hash: u32,
        size: u64,
    ) -> Self {
        Self::new(TransferDirection::Send, peer, file_name, file_hash, size, source)
    }

    /// Create an inbound offer that will be written to `destination`
    pub fn incoming(
        peer: u32,
        destination: PathBuf,
        file_name: String,
        file_hash: u32,
        size: u64,
    ) -> Self {
        Self::new(
            TransferDirection::Receive,
            peer,
            file_name,
            file_hash,
            size,
            destination,
        )
    }

    pub fn id(&self) -> TransferId {
        self.id
    }

    pub fn direction(&self) -> TransferDirection {
        self.direction
    }

    pub fn peer(&self) -> u32 {
        self.peer
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_hash(&self) -> u32 {
        self.file_hash
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Registry key of this transfer
    pub fn key(&self) -> TransferKey {
        TransferKey {
            peer: self.peer,
            id: self.id,
            direction: self.direction,
        }
    }

    /// Whether this transfer matches the file identity carried by a message
    pub fn matches_file(&self, hash: u32, name: &str) -> bool {
        self.file_hash == hash && self.file_name == name
    }

    pub fn state(&self) -> TransferState {
        self.inner.lock().expect("transfer lock poisoned").state
    }

    /// Source file, only for outbound transfers
    pub fn source(&self) -> Option<PathBuf> {
        match self.direction {
            TransferDirection::Send => Some(self.path()),
            TransferDirection::Receive => None,
        }
    }

    /// Destination file, only for inbound transfers
    pub fn destination(&self) -> Option<PathBuf> {
        match self.direction {
            TransferDirection::Receive => Some(self.path()),
            TransferDirection::Send => None,
        }
    }

    fn path(&self) -> PathBuf {
        self.inner
            .lock()
            .expect("transfer lock poisoned")
            .path
            .clone()
    }

    /// Replace the destination before streaming starts
    ///
    /// Returns false for outbound transfers or once data is flowing.
    pub fn set_destination(&self, destination: PathBuf) -> bool {
        if self.direction != TransferDirection::Receive {
            return false;
        }
        let mut inner = self.inner.lock().expect("transfer lock poisoned");
        if !matches!(inner.state, TransferState::Offered | TransferState::Accepted) {
            return false;
        }
        inner.path = destination;
        true
    }

    /// Move to `next`, returning the previous state
    pub fn transition(&self, next: TransferState) -> Result<TransferState, InvalidTransition> {
        let mut inner = self.inner.lock().expect("transfer lock poisoned");
        let from = inner.state;
        if !from.can_transition_to(next) {
            return Err(InvalidTransition { from, to: next });
        }
        inner.state = next;
        drop(inner);

        if next == TransferState::Cancelled {
            self.cancel_tx.send_replace(true);
        }
        Ok(from)
    }

    /// Offered -> Accepted
    pub fn accept(&self) -> Result<(), InvalidTransition> {
        self.transition(TransferState::Accepted).map(|_| ())
    }

    /// Offered -> Rejected
    pub fn reject(&self) -> Result<(), InvalidTransition> {
        self.transition(TransferState::Rejected).map(|_| ())
    }

    /// Accepted -> InProgress, once the stream is established
    pub fn start_streaming(&self) -> Result<(), InvalidTransition> {
        self.transition(TransferState::InProgress).map(|_| ())
    }

    /// InProgress -> Completed
    pub fn complete(&self) -> Result<(), InvalidTransition> {
        self.transition(TransferState::Completed).map(|_| ())
    }

    /// Any live state -> Cancelled, returning the state it was cancelled in
    ///
    /// Wakes every task waiting in [`Transfer::cancelled`].
    pub fn cancel(&self) -> Result<TransferState, InvalidTransition> {
        self.transition(TransferState::Cancelled)
    }

    /// Whether the transfer was cancelled
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Resolves once the transfer is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.cancel_tx.subscribe();
        // The sender lives as long as self, so this only ends on cancellation
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Record a streamed chunk and the milliseconds since the previous one
    pub fn record_progress(&self, bytes: u64, elapsed_ms: u64) {
        self.transferred.fetch_add(bytes, Ordering::Relaxed);
        self.inner
            .lock()
            .expect("transfer lock poisoned")
            .meter
            .update_counters(bytes, elapsed_ms);
    }

    /// Bytes transferred so far
    pub fn transferred(&self) -> u64 {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Progress in whole percent
    pub fn percent(&self) -> u64 {
        if self.size == 0 {
            return if self.state() == TransferState::Completed {
                100
            } else {
                0
            };
        }
        (self.transferred() * 100 / self.size).min(100)
    }

    /// Last measured speed in bytes per second
    pub fn speed(&self) -> u64 {
        self.inner
            .lock()
            .expect("transfer lock poisoned")
            .meter
            .bytes_per_sec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn incoming() -> Transfer {
        Transfer::incoming(
            22222222,
            PathBuf::from("/tmp/photo.jpg"),
            "photo.jpg".to_string(),
            1_234_567,
            2048,
        )
    }

    #[test]
    fn test_id_is_derived_from_hash() {
        let transfer = incoming();
        assert_eq!(transfer.id(), TransferId::from(34_567));
        assert_eq!(transfer.id().to_string(), "34567");
    }

    #[test]
    fn test_happy_path() {
        let transfer = incoming();
        transfer.accept().unwrap();
        transfer.start_streaming().unwrap();
        transfer.complete().unwrap();
        assert_eq!(transfer.state(), TransferState::Completed);
        assert!(transfer.state().is_terminal());
    }

    #[test]
    fn test_no_state_is_reentered() {
        let transfer = incoming();
        transfer.accept().unwrap();

        assert_eq!(
            transfer.accept(),
            Err(InvalidTransition {
                from: TransferState::Accepted,
                to: TransferState::Accepted
            })
        );
        assert!(transfer.reject().is_err());

        transfer.start_streaming().unwrap();
        assert!(transfer.start_streaming().is_err());
        assert!(transfer.accept().is_err());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let all = [
            TransferState::Offered,
            TransferState::Accepted,
            TransferState::InProgress,
            TransferState::Completed,
            TransferState::Rejected,
            TransferState::Cancelled,
        ];
        for from in all.iter().filter(|s| s.is_terminal()) {
            for to in all {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_only_accepted_and_streaming_are_active() {
        assert!(!TransferState::Offered.is_active());
        assert!(TransferState::Accepted.is_active());
        assert!(TransferState::InProgress.is_active());
        assert!(!TransferState::Completed.is_active());
        assert!(!TransferState::Rejected.is_active());
        assert!(!TransferState::Cancelled.is_active());
    }

    #[test]
    fn test_cancel_reports_previous_state() {
        let transfer = incoming();
        transfer.accept().unwrap();
        assert_eq!(transfer.cancel(), Ok(TransferState::Accepted));
        assert!(transfer.is_cancelled());
        assert!(transfer.cancel().is_err());
    }

    #[test]
    fn test_capabilities_follow_direction() {
        let transfer = incoming();
        assert!(transfer.source().is_none());
        assert_eq!(transfer.destination(), Some(PathBuf::from("/tmp/photo.jpg")));

        let outgoing = Transfer::outgoing(
            22222222,
            PathBuf::from("/home/me/photo.jpg"),
            "photo.jpg".to_string(),
            1,
            10,
        );
        assert!(outgoing.destination().is_none());
        assert!(!outgoing.set_destination(PathBuf::from("/elsewhere")));
    }

    #[test]
    fn test_destination_fixed_once_streaming() {
        let transfer = incoming();
        transfer.accept().unwrap();
        assert!(transfer.set_destination(PathBuf::from("/tmp/photo_1.jpg")));
        transfer.start_streaming().unwrap();
        assert!(!transfer.set_destination(PathBuf::from("/tmp/photo_2.jpg")));
        assert_eq!(transfer.destination(), Some(PathBuf::from("/tmp/photo_1.jpg")));
    }

    #[test]
    fn test_progress_and_speed() {
        let transfer = incoming();
        transfer.record_progress(1024, 500);
        assert_eq!(transfer.percent(), 50);
        assert_eq!(transfer.speed(), 0);

        transfer.record_progress(1024, 500);
        assert_eq!(transfer.percent(), 100);
        assert_eq!(transfer.speed(), 2048);
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let transfer = Arc::new(incoming());
        let waiter = {
            let transfer = Arc::clone(&transfer);
            tokio::spawn(async move { transfer.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        transfer.cancel().unwrap();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_after_the_fact() {
        let transfer = incoming();
        transfer.cancel().unwrap();
        tokio::time::timeout(Duration::from_secs(1), transfer.cancelled())
            .await
            .expect("already cancelled");
    }
}
