//! /receive command implementation - accept a file offer

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    CommandHandler, CommandInvocation, CommandOutcome, CommandResult, find_other_peer,
    parse_transfer_id, usage, user_error,
};
use crate::i18n::t_args;
use crate::session::SessionController;
use crate::transfers::{TransferDirection, TransferState};

/// Execute the /receive command
///
/// Usage: /receive <nick> <id>
pub struct Receive;

#[async_trait]
impl CommandHandler for Receive {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        let [nick, id] = invocation.args.as_slice() else {
            return Err(usage("cmd-receive-usage", invocation));
        };

        let peer = find_other_peer(session, nick).await?;
        let id = parse_transfer_id(id)?;

        let Some(transfer) = session
            .transfers()
            .get(peer.code(), id, TransferDirection::Receive)
        else {
            return Err(t_args(
                "cmd-no-such-transfer",
                &[("id", &id.to_string()), ("nick", &peer.nick)],
            ));
        };

        if transfer.state() != TransferState::Offered {
            return Err(t_args(
                "cmd-receive-already",
                &[("file", transfer.file_name()), ("nick", &peer.nick)],
            ));
        }

        session
            .accept_file(peer.code(), id)
            .await
            .map_err(user_error)?;
        Ok(CommandOutcome::Continue)
    }
}
