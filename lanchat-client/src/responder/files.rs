//! File offers, acceptances and aborts from peers

use std::net::SocketAddr;
use std::path::Path;

use lanchat_common::protocol::FileRef;
use tracing::{debug, warn};

use super::MessageResponder;
use crate::i18n::t_args;
use crate::transfers::{Transfer, TransferDirection, TransferState, format_size};

impl MessageResponder {
    /// Register an offered file; the user answers with receive or reject
    pub(super) async fn on_file_offer(&self, code: u32, file: FileRef, size: u64) {
        let Some(nick) = self.session.read().await.peers.get(code).map(|p| p.nick.clone()) else {
            warn!("Unknown user {}, ignoring file offer", code);
            return;
        };

        // Only the last component; a peer never picks our directories
        let Some(name) = Path::new(&file.name)
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
        else {
            warn!("{} offered a file without a usable name", nick);
            return;
        };

        let destination = self
            .session
            .settings()
            .get()
            .resolved_download_dir()
            .join(&name);
        let transfer = Transfer::incoming(code, destination, file.name.clone(), file.hash, size);

        let transfer = match self.session.transfers().register(transfer) {
            Ok(transfer) => transfer,
            Err(e) => {
                warn!("Ignoring file offer {} from {}: {}", file.name, nick, e);
                return;
            }
        };

        self.session.notifier().system(t_args(
            "file-offer-received",
            &[
                ("nick", &nick),
                ("file", &file.name),
                ("id", &transfer.id().to_string()),
                ("size", &format_size(size)),
            ],
        ));
    }

    /// The receiver is listening: start streaming
    pub(super) async fn on_file_accept(&self, code: u32, file: FileRef, port: u16) {
        let transfers = self.session.transfers();
        let Some(transfer) =
            transfers.find_by_file(code, TransferDirection::Send, file.hash, &file.name)
        else {
            debug!("No offer of {} to {}", file.name, code);
            return;
        };

        let (nick, ip) = {
            let state = self.session.read().await;
            (
                state.nick_of(code),
                state.peers.get(code).and_then(|peer| peer.ip_address),
            )
        };

        if let Err(e) = transfer.accept() {
            warn!("Ignoring accept of {}: {}", file.name, e);
            return;
        }
        self.session.notifier().system(t_args(
            "file-peer-accepted",
            &[("nick", &nick), ("file", &file.name)],
        ));

        let Some(ip) = ip else {
            warn!("No address for {}, cancelling {}", nick, file.name);
            if let Err(e) = self.session.cancel_file_transfer(&transfer).await {
                warn!("Failed to cancel {}: {}", file.name, e);
            }
            transfers.unregister(&transfer);
            return;
        };
        self.session
            .start_send(transfer, SocketAddr::new(ip, port));
    }

    /// The peer gave up on a transfer in either direction
    pub(super) async fn on_file_abort(&self, code: u32, file: FileRef) {
        let transfers = self.session.transfers();
        let nick = self.session.read().await.nick_of(code);

        if let Some(sender) =
            transfers.find_by_file(code, TransferDirection::Send, file.hash, &file.name)
        {
            // Fails only when already finished
            let _ = sender.cancel();
            transfers.unregister(&sender);
            self.session.notifier().system(t_args(
                "file-peer-aborted-reception",
                &[("nick", &nick), ("file", &file.name)],
            ));
        }

        if let Some(receiver) =
            transfers.find_by_file(code, TransferDirection::Receive, file.hash, &file.name)
        {
            let previous = receiver.cancel();
            // A running stream removes its own entry when it stops
            if matches!(previous, Ok(TransferState::Offered) | Err(_)) {
                transfers.unregister(&receiver);
            }
            self.session.notifier().system(t_args(
                "file-peer-aborted-sending",
                &[("nick", &nick), ("file", &file.name)],
            ));
        }
    }
}
