//! Registry of active file transfers
//!
//! Transfer ids repeat across peers and directions, so every lookup goes
//! through the peer code as well. The registry lock is never held while a
//! transfer streams; streaming tasks hold their own `Arc<Transfer>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::types::{Transfer, TransferDirection, TransferId, TransferKey};

/// Error returned when registering a transfer fails
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
    /// The same peer already has a transfer with this id in this direction
    #[error("transfer {id} already exists for this user")]
    Duplicate { id: TransferId },
}

/// Thread-safe registry of transfers keyed by (peer, id, direction)
pub struct TransferRegistry {
    transfers: Mutex<HashMap<TransferKey, Arc<Transfer>>>,
}

impl TransferRegistry {
    /// Create a new empty transfer registry
    pub fn new() -> Self {
        Self {
            transfers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new transfer
    ///
    /// A finished entry still holding the key (its streaming task has not
    /// cleaned up yet) is replaced.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::Duplicate` if a live transfer holds the key.
    pub fn register(&self, transfer: Transfer) -> Result<Arc<Transfer>, RegisterError> {
        let key = transfer.key();
        let mut transfers = self
            .transfers
            .lock()
            .expect("transfer registry lock poisoned");

        if let Some(existing) = transfers.get(&key)
            && !existing.state().is_terminal()
        {
            return Err(RegisterError::Duplicate { id: key.id });
        }

        let transfer = Arc::new(transfer);
        transfers.insert(key, Arc::clone(&transfer));
        Ok(transfer)
    }

    /// Unregister a transfer (called once it reached a terminal state)
    ///
    /// Only removes this exact transfer: a newer one that reused the key
    /// stays registered.
    pub fn unregister(&self, transfer: &Transfer) -> Option<Arc<Transfer>> {
        let mut transfers = self
            .transfers
            .lock()
            .expect("transfer registry lock poisoned");
        let key = transfer.key();

        match transfers.get(&key) {
            Some(current) if std::ptr::eq(Arc::as_ptr(current), transfer) => transfers.remove(&key),
            _ => None,
        }
    }

    /// Get a transfer by its full key
    pub fn get(&self, peer: u32, id: TransferId, direction: TransferDirection) -> Option<Arc<Transfer>> {
        self.transfers
            .lock()
            .expect("transfer registry lock poisoned")
            .get(&TransferKey {
                peer,
                id,
                direction,
            })
            .cloned()
    }

    /// Find a transfer with a peer by id, checking receives before sends
    pub fn find(&self, peer: u32, id: TransferId) -> Option<Arc<Transfer>> {
        self.get(peer, id, TransferDirection::Receive)
            .or_else(|| self.get(peer, id, TransferDirection::Send))
    }

    /// Find a transfer by the file identity carried in protocol messages
    pub fn find_by_file(
        &self,
        peer: u32,
        direction: TransferDirection,
        hash: u32,
        name: &str,
    ) -> Option<Arc<Transfer>> {
        self.transfers
            .lock()
            .expect("transfer registry lock poisoned")
            .values()
            .find(|t| t.peer() == peer && t.direction() == direction && t.matches_file(hash, name))
            .cloned()
    }

    /// All outbound transfers
    pub fn senders(&self) -> Vec<Arc<Transfer>> {
        self.filtered(|t| t.direction() == TransferDirection::Send)
    }

    /// All inbound transfers
    pub fn receivers(&self) -> Vec<Arc<Transfer>> {
        self.filtered(|t| t.direction() == TransferDirection::Receive)
    }

    fn filtered<F>(&self, predicate: F) -> Vec<Arc<Transfer>>
    where
        F: Fn(&Transfer) -> bool,
    {
        let mut found: Vec<Arc<Transfer>> = self
            .transfers
            .lock()
            .expect("transfer registry lock poisoned")
            .values()
            .filter(|t| predicate(t))
            .cloned()
            .collect();
        found.sort_by_key(|t| (t.peer(), t.id()));
        found
    }

    /// Cancel and remove every transfer with a peer, in both directions
    ///
    /// Runs under one lock, so each transfer is returned exactly once even
    /// when two callers race.
    pub fn cancel_for_peer(&self, peer: u32) -> Vec<Arc<Transfer>> {
        let removed: Vec<Arc<Transfer>> = {
            let mut transfers = self
                .transfers
                .lock()
                .expect("transfer registry lock poisoned");
            let keys: Vec<TransferKey> = transfers
                .keys()
                .filter(|key| key.peer == peer)
                .copied()
                .collect();
            keys.iter().filter_map(|key| transfers.remove(key)).collect()
        };

        for transfer in &removed {
            // Already terminal transfers only needed removing
            let _ = transfer.cancel();
        }

        removed
    }

    /// Get a snapshot of all transfers
    pub fn snapshot(&self) -> Vec<Arc<Transfer>> {
        self.filtered(|_| true)
    }

    /// Get the number of registered transfers
    pub fn active_count(&self) -> usize {
        self.transfers
            .lock()
            .expect("transfer registry lock poisoned")
            .len()
    }
}

impl Default for TransferRegistry {
    fn default() -> Self {
        Self::new()
    }
}
