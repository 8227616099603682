//! /away command implementation - set away status

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult, usage, user_error};
use crate::i18n::t_args;
use crate::session::SessionController;

/// Execute the /away command
///
/// Marks the local user as away with a message everyone can see.
///
/// Usage: /away <message>
pub struct Away;

#[async_trait]
impl CommandHandler for Away {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        let me = session.me().await;
        if me.away {
            return Err(t_args(
                "cmd-away-already",
                &[("message", &me.away_message)],
            ));
        }

        let message = invocation.text_after(0);
        if message.is_empty() {
            return Err(usage("cmd-away-usage", invocation));
        }

        session
            .change_away_status(me.code(), true, message)
            .await
            .map_err(user_error)?;
        Ok(CommandOutcome::Continue)
    }
}
