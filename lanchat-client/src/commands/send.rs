//! /send command implementation - offer a file

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::{
    CommandHandler, CommandInvocation, CommandOutcome, CommandResult, find_other_peer, usage,
    user_error,
};
use crate::i18n::t_args;
use crate::session::SessionController;

/// Execute the /send command
///
/// The file path is the rest of the line and may contain spaces.
///
/// Usage: /send <nick> <file>
pub struct SendFile;

#[async_trait]
impl CommandHandler for SendFile {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        if invocation.args.len() < 2 {
            return Err(usage("cmd-send-usage", invocation));
        }

        let peer = find_other_peer(session, &invocation.args[0]).await?;

        let file = invocation.text_after(1);
        let is_file = tokio::fs::metadata(file)
            .await
            .is_ok_and(|metadata| metadata.is_file());
        if !is_file {
            return Err(t_args("err-file-not-found", &[("file", file)]));
        }

        session
            .send_file(peer.code(), Path::new(file))
            .await
            .map_err(user_error)?;
        Ok(CommandOutcome::Continue)
    }
}
