//! File offers and the session side of transfers
//!
//! The registry owns every [`Transfer`]. This module validates the user's
//! request, sends the matching offer, accept or abort message, and hands
//! accepted transfers to the executor on their own task.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lanchat_common::hash::file_hash;
use lanchat_common::protocol::{FileRef, MessageKind};
use lanchat_common::validators::validate_message_length;
use lanchat_common::{DEFAULT_TRANSFER_PORT, TRANSFER_PORT_ATTEMPTS};
use tracing::{debug, warn};

use super::SessionController;
use crate::errors::SessionError;
use crate::i18n::{t, t_args};
use crate::transfers::executor::{bind_receiver, receive_file, send_file, unique_destination};
use crate::transfers::{
    InvalidTransition, Transfer, TransferDirection, TransferError, TransferId, TransferState,
    format_size,
};

fn file_ref(transfer: &Transfer) -> FileRef {
    FileRef {
        target: transfer.peer(),
        hash: transfer.file_hash(),
        name: transfer.file_name().to_string(),
    }
}

impl SessionController {
    // =========================================================================
    // Sending
    // =========================================================================

    /// Offer a local file to a peer
    ///
    /// Registers an outbound transfer in state Offered and announces it.
    pub async fn send_file(&self, code: u32, path: &Path) -> Result<Arc<Transfer>, SessionError> {
        let state = self.state.read().await;
        let me = state.peers.me();

        if code == me.code() {
            return Err(SessionError::SendToSelf);
        }
        if !self.connected_in(&state) {
            return Err(SessionError::NotConnected);
        }
        if me.away {
            return Err(SessionError::Away);
        }
        let peer = state
            .peers
            .get(code)
            .ok_or(SessionError::UnknownPeer(code))?;
        if peer.away {
            return Err(SessionError::PeerAway(peer.nick.clone()));
        }

        let display = path.display().to_string();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| SessionError::FileNotFound(display.clone()))?
            .to_string();
        if validate_message_length(&file_name).is_err() {
            return Err(SessionError::FileNameTooLong);
        }

        let size = match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => return Err(SessionError::FileNotFound(display)),
        };

        let hash = file_hash(&file_name, size);
        let transfer = self.transfers.register(Transfer::outgoing(
            code,
            path.to_path_buf(),
            file_name,
            hash,
            size,
        ))?;

        let offer = MessageKind::FileOffer {
            file: file_ref(&transfer),
            size,
        };
        if let Err(e) = self.broadcast_in(&state, offer) {
            self.transfers.unregister(&transfer);
            return Err(e.into());
        }

        self.notifier.system(t_args(
            "file-offer-sent",
            &[
                ("nick", &peer.nick),
                ("file", transfer.file_name()),
                ("id", &transfer.id().to_string()),
                ("size", &format_size(size)),
            ],
        ));
        Ok(transfer)
    }

    /// Stream an accepted outbound transfer to `address`
    pub(crate) fn start_send(self: &Arc<Self>, transfer: Arc<Transfer>, address: SocketAddr) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            debug!("Starting send of {} to {}", transfer.file_name(), address);
            let result = send_file(address, &transfer).await;
            session.finish_transfer(&transfer, result).await;
        });
    }

    // =========================================================================
    // Receiving
    // =========================================================================

    /// Accept an offered file from a peer
    ///
    /// An existing file at the destination is never overwritten: the
    /// destination is renamed with a numeric suffix first. A path another
    /// accepted receive already writes to counts as existing. Returns the final
    /// destination. The listener is bound and the acceptance sent on a
    /// separate task.
    pub async fn accept_file(
        self: &Arc<Self>,
        code: u32,
        id: TransferId,
    ) -> Result<PathBuf, SessionError> {
        if !self.is_connected().await {
            return Err(SessionError::NotConnected);
        }

        let transfer = self
            .transfers
            .get(code, id, TransferDirection::Receive)
            .ok_or(SessionError::NoSuchTransfer(id))?;
        let from = transfer.state();
        if from != TransferState::Offered {
            return Err(InvalidTransition {
                from,
                to: TransferState::Accepted,
            }
            .into());
        }

        let original = transfer
            .destination()
            .ok_or(SessionError::NoSuchTransfer(id))?;
        let reserved: Vec<PathBuf> = self
            .transfers
            .receivers()
            .iter()
            .filter(|other| other.key() != transfer.key() && other.state().is_active())
            .filter_map(|other| other.destination())
            .collect();
        let destination = unique_destination(&original, &reserved).await?;

        transfer.set_destination(destination.clone());
        transfer.accept()?;

        let nick = self.read().await.nick_of(code);
        if destination != original {
            self.notifier.system(t_args(
                "file-renamed",
                &[
                    ("file", transfer.file_name()),
                    ("path", &destination.display().to_string()),
                ],
            ));
        }
        self.notifier.system(t_args(
            "file-receiving",
            &[("nick", &nick), ("file", transfer.file_name())],
        ));

        let session = Arc::clone(self);
        tokio::spawn(async move {
            let result = session.run_receive(&transfer).await;
            session.finish_transfer(&transfer, result).await;
        });

        Ok(destination)
    }

    async fn run_receive(&self, transfer: &Transfer) -> Result<u64, TransferError> {
        let (listener, port) = bind_receiver(DEFAULT_TRANSFER_PORT, TRANSFER_PORT_ATTEMPTS).await?;
        debug!("Listening for {} on port {}", transfer.file_name(), port);

        let accept = {
            let state = self.state.read().await;
            state.message(MessageKind::FileAccept {
                file: file_ref(transfer),
                port,
            })
        };
        self.messenger
            .broadcast(accept)
            .map_err(|_| TransferError::ConnectionFailed)?;

        receive_file(listener, transfer).await
    }

    /// Turn down an offered file
    pub async fn reject_file(&self, code: u32, id: TransferId) -> Result<(), SessionError> {
        let transfer = self
            .transfers
            .get(code, id, TransferDirection::Receive)
            .ok_or(SessionError::NoSuchTransfer(id))?;
        let from = transfer.state();
        if from != TransferState::Offered {
            return Err(InvalidTransition {
                from,
                to: TransferState::Rejected,
            }
            .into());
        }

        let state = self.state.read().await;
        self.broadcast_in(
            &state,
            MessageKind::FileAbort {
                file: file_ref(&transfer),
            },
        )?;

        transfer.reject()?;
        self.transfers.unregister(&transfer);

        self.notifier.system(t_args(
            "file-rejected",
            &[
                ("nick", &state.nick_of(code)),
                ("file", transfer.file_name()),
            ],
        ));
        Ok(())
    }

    // =========================================================================
    // Cancelling and completion
    // =========================================================================

    /// Cancel a transfer in either direction
    ///
    /// An outbound offer nobody accepted yet is removed at once. A transfer
    /// with an accepted stream is only marked cancelled; its streaming task
    /// stops and removes it. An inbound offer that was never accepted can
    /// only be rejected.
    pub async fn cancel_file_transfer(&self, transfer: &Arc<Transfer>) -> Result<(), SessionError> {
        let from = transfer.state();
        let cancellable = match (transfer.direction(), from) {
            (_, state) if state.is_terminal() => false,
            (TransferDirection::Receive, TransferState::Offered) => false,
            _ => true,
        };
        if !cancellable {
            return Err(InvalidTransition {
                from,
                to: TransferState::Cancelled,
            }
            .into());
        }

        let state = self.state.read().await;
        // The peer must learn about it, but a dead link must not block a local cancel
        self.announce_in(
            &state,
            MessageKind::FileAbort {
                file: file_ref(transfer),
            },
        );

        transfer.cancel()?;
        if from == TransferState::Offered {
            self.transfers.unregister(transfer);
        }

        self.notifier.system(t_args(
            "file-cancelled",
            &[
                ("nick", &state.nick_of(transfer.peer())),
                ("file", transfer.file_name()),
            ],
        ));
        Ok(())
    }

    /// Report the end of a streaming task and forget the transfer
    async fn finish_transfer(&self, transfer: &Transfer, result: Result<u64, TransferError>) {
        self.transfers.unregister(transfer);
        let nick = self.read().await.nick_of(transfer.peer());

        match result {
            Ok(bytes) => {
                debug!("Transfer of {} finished, {} bytes", transfer.file_name(), bytes);
                let text = match transfer.direction() {
                    TransferDirection::Send => t_args(
                        "file-sent",
                        &[("nick", &nick), ("file", transfer.file_name())],
                    ),
                    TransferDirection::Receive => t_args(
                        "file-received",
                        &[
                            ("nick", &nick),
                            ("file", transfer.file_name()),
                            (
                                "path",
                                &transfer
                                    .destination()
                                    .map(|path| path.display().to_string())
                                    .unwrap_or_default(),
                            ),
                        ],
                    ),
                };
                self.notifier.system(text);
            }
            Err(_) if transfer.is_cancelled() => {
                debug!("Transfer of {} stopped after cancel", transfer.file_name());
            }
            Err(e) => {
                warn!("Transfer of {} failed: {}", transfer.file_name(), e);
                // Terminal already when the executor failed its own step
                let _ = transfer.cancel();

                let state = self.state.read().await;
                self.announce_in(
                    &state,
                    MessageKind::FileAbort {
                        file: file_ref(transfer),
                    },
                );
                drop(state);

                self.notifier.error(t_args(
                    "file-failed",
                    &[
                        ("nick", &nick),
                        ("file", transfer.file_name()),
                        ("reason", &t(e.to_i18n_key())),
                    ],
                ));
            }
        }
    }
}
