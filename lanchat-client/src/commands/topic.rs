//! /topic command implementation - show or change the topic

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult, user_error};
use crate::clock::format_timestamp;
use crate::i18n::{t, t_args};
use crate::session::SessionController;

/// Execute the /topic command
///
/// Without text shows the current topic. With text sets it, unless it is
/// the same as the current one.
///
/// Usage: /topic [text]
pub struct Topic;

#[async_trait]
impl CommandHandler for Topic {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        let current = session.topic().await;
        let text = invocation.text_after(0);

        if invocation.args.is_empty() {
            let message = if current.is_set() {
                t_args(
                    "topic-is",
                    &[
                        ("topic", &current.text),
                        ("nick", &current.author),
                        ("time", &format_timestamp(current.time_ms)),
                    ],
                )
            } else {
                t("cmd-topic-none")
            };
            session.notifier().system(message);
            return Ok(CommandOutcome::Continue);
        }

        if text == current.text.trim() {
            return Ok(CommandOutcome::Continue);
        }

        session.change_topic(text).await.map_err(user_error)?;
        Ok(CommandOutcome::Continue)
    }
}
