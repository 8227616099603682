//! /users command implementation - list users

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult};
use crate::i18n::t_args;
use crate::session::SessionController;

/// Execute the /users command
///
/// Usage: /users
pub struct Users;

#[async_trait]
impl CommandHandler for Users {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        _invocation: &CommandInvocation,
    ) -> CommandResult {
        let nicks: Vec<String> = session
            .read()
            .await
            .peers
            .iter()
            .map(|peer| peer.nick.clone())
            .collect();

        session
            .notifier()
            .system(t_args("cmd-users-output", &[("users", &nicks.join(", "))]));
        Ok(CommandOutcome::Continue)
    }
}
