//! /msg command implementation - send a private message

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    CommandHandler, CommandInvocation, CommandOutcome, CommandResult, find_other_peer, usage,
    user_error,
};
use crate::i18n::{t, t_args};
use crate::session::SessionController;

/// Execute the /msg command
///
/// Usage: /msg <nick> <message>
pub struct PrivateMessage;

#[async_trait]
impl CommandHandler for PrivateMessage {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        // Need at least nickname and one word of message
        if invocation.args.len() < 2 {
            return Err(usage("cmd-msg-usage", invocation));
        }

        let peer = find_other_peer(session, &invocation.args[0]).await?;

        if session.settings().get().no_private_chat {
            return Err(t("err-private-disabled"));
        }
        if !peer.has_private_port() {
            return Err(t_args("err-private-no-port", &[("nick", &peer.nick)]));
        }

        session
            .send_private_message(peer.code(), invocation.text_after(1))
            .await
            .map_err(user_error)?;
        Ok(CommandOutcome::Continue)
    }
}
