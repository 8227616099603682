//! /cancel command implementation - stop a file transfer

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    CommandHandler, CommandInvocation, CommandOutcome, CommandResult, find_other_peer,
    parse_transfer_id, usage, user_error,
};
use crate::i18n::t_args;
use crate::session::SessionController;
use crate::transfers::{TransferDirection, TransferState};

/// Execute the /cancel command
///
/// Works for files being sent in any state and for received files once
/// accepted. An offer that was never accepted is rejected, not cancelled.
///
/// Usage: /cancel <nick> <id>
pub struct Cancel;

#[async_trait]
impl CommandHandler for Cancel {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        let [nick, id] = invocation.args.as_slice() else {
            return Err(usage("cmd-cancel-usage", invocation));
        };

        let peer = find_other_peer(session, nick).await?;
        let id = parse_transfer_id(id)?;

        let Some(transfer) = session.transfers().find(peer.code(), id) else {
            return Err(t_args(
                "cmd-no-such-transfer",
                &[("id", &id.to_string()), ("nick", &peer.nick)],
            ));
        };

        if transfer.direction() == TransferDirection::Receive
            && transfer.state() == TransferState::Offered
        {
            return Err(t_args(
                "cmd-cancel-not-started",
                &[("file", transfer.file_name()), ("nick", &peer.nick)],
            ));
        }

        session
            .cancel_file_transfer(&transfer)
            .await
            .map_err(user_error)?;
        Ok(CommandOutcome::Continue)
    }
}
