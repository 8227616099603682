//! /transfers command implementation - list file transfers

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult};
use crate::i18n::{t, t_args};
use crate::session::SessionController;
use crate::transfers::{Transfer, format_size, format_speed};

/// Execute the /transfers command
///
/// Usage: /transfers
pub struct Transfers;

#[async_trait]
impl CommandHandler for Transfers {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        _invocation: &CommandInvocation,
    ) -> CommandResult {
        let senders = session.transfers().senders();
        let receivers = session.transfers().receivers();

        if senders.is_empty() && receivers.is_empty() {
            session.notifier().system(t("cmd-transfers-none"));
            return Ok(CommandOutcome::Continue);
        }

        let state = session.read().await;
        let describe = |transfer: &Arc<Transfer>| {
            format!(
                "  #{} {} [{}] {}% {} - {}",
                transfer.id(),
                transfer.file_name(),
                format_size(transfer.size()),
                transfer.percent(),
                format_speed(transfer.speed()),
                state.nick_of(transfer.peer())
            )
        };

        let mut lines = vec![t("cmd-transfers-header")];
        if !senders.is_empty() {
            lines.push(t("cmd-transfers-sending"));
            lines.extend(senders.iter().map(describe));
        }
        if !receivers.is_empty() {
            lines.push(t("cmd-transfers-receiving"));
            lines.extend(receivers.iter().map(describe));
        }
        drop(state);

        session.notifier().system(lines.join("\n"));
        Ok(CommandOutcome::Continue)
    }
}
