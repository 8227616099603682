//! /quit command implementation

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult};
use crate::session::SessionController;

/// Execute the /quit command
///
/// Only asks the input loop to stop; logging off is part of shutdown.
///
/// Usage: /quit
pub struct Quit;

#[async_trait]
impl CommandHandler for Quit {
    async fn execute(
        &self,
        _session: &Arc<SessionController>,
        _invocation: &CommandInvocation,
    ) -> CommandResult {
        Ok(CommandOutcome::Quit)
    }
}
