//! /nick command implementation - change the own nick

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult, usage, user_error};
use crate::i18n::t_args;
use crate::session::SessionController;

/// Execute the /nick command
///
/// The new nick is announced to everyone and saved in the settings.
///
/// Usage: /nick <name>
pub struct Nick;

#[async_trait]
impl CommandHandler for Nick {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        let Some(nick) = invocation.args.first() else {
            return Err(usage("cmd-nick-usage", invocation));
        };

        if session.me().await.nick == *nick {
            return Err(t_args("cmd-nick-identical", &[("nick", nick)]));
        }

        session.change_my_nick(nick).await.map_err(user_error)?;
        Ok(CommandOutcome::Continue)
    }
}
