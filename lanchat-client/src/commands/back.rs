//! /back command implementation - clear away status

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult, usage, user_error};
use crate::i18n::t;
use crate::session::SessionController;

/// Execute the /back command
///
/// Usage: /back
pub struct Back;

#[async_trait]
impl CommandHandler for Back {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        // /back takes no arguments
        if !invocation.args.is_empty() {
            return Err(usage("cmd-back-usage", invocation));
        }

        let me = session.me().await;
        if !me.away {
            return Err(t("cmd-back-not-away"));
        }

        session
            .change_away_status(me.code(), false, "")
            .await
            .map_err(user_error)?;
        Ok(CommandOutcome::Continue)
    }
}
