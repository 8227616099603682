//! /about command implementation - show client name and version

use std::sync::Arc;

use async_trait::async_trait;
use lanchat_common::APP_NAME;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult};
use crate::i18n::t_args;
use crate::session::SessionController;

pub struct About;

#[async_trait]
impl CommandHandler for About {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        _invocation: &CommandInvocation,
    ) -> CommandResult {
        session.notifier().system(t_args(
            "cmd-about-output",
            &[("app", APP_NAME), ("version", env!("CARGO_PKG_VERSION"))],
        ));
        Ok(CommandOutcome::Continue)
    }
}
