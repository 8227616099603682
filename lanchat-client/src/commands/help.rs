//! /help command implementation - list commands

use std::sync::Arc;

use async_trait::async_trait;
use lanchat_common::APP_NAME;

use super::{
    CommandHandler, CommandInvocation, CommandOutcome, CommandResult, command_list,
    get_command_info,
};
use crate::i18n::{t, t_args};
use crate::session::SessionController;

/// Execute the /help command
///
/// Without arguments lists every command; with a command name shows its
/// usage.
///
/// Usage: /help [command]
pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        if let Some(name) = invocation.args.first() {
            let name = name.trim_start_matches('/');
            let Some(info) = get_command_info(name) else {
                return Err(t_args("cmd-unknown", &[("command", name)]));
            };
            session
                .notifier()
                .system(t_args(info.usage_key, &[("command", info.name)]));
            return Ok(CommandOutcome::Continue);
        }

        let mut lines = vec![t_args("cmd-help-header", &[("app", APP_NAME)])];
        for info in command_list() {
            lines.push(format!("/{} - {}", info.name, t(info.description_key)));
        }
        lines.push(t("cmd-help-escape"));

        session.notifier().system(lines.join("\n"));
        Ok(CommandOutcome::Continue)
    }
}
