//! /whois command implementation - show information about a user

use std::sync::Arc;

use async_trait::async_trait;

use super::{CommandHandler, CommandInvocation, CommandOutcome, CommandResult, find_peer, usage};
use crate::clock::{format_elapsed, now_millis};
use crate::i18n::t_args;
use crate::session::SessionController;

/// Execute the /whois command
///
/// Usage: /whois <nick>
pub struct Whois;

#[async_trait]
impl CommandHandler for Whois {
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult {
        let Some(nick) = invocation.args.first() else {
            return Err(usage("cmd-whois-usage", invocation));
        };
        let peer = find_peer(session, nick).await?;

        let header_key = if peer.away {
            "cmd-whois-header-away"
        } else {
            "cmd-whois-header"
        };
        let address = peer
            .ip_address
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string());

        let mut lines = vec![
            t_args(header_key, &[("nick", &peer.nick)]),
            t_args("cmd-whois-address", &[("address", &address)]),
            t_args("cmd-whois-client", &[("client", &peer.client)]),
            t_args("cmd-whois-os", &[("os", &peer.operating_system)]),
            t_args(
                "cmd-whois-online",
                &[("time", &format_elapsed(now_millis() - peer.logon_time))],
            ),
        ];
        if peer.away {
            lines.push(t_args(
                "cmd-whois-away-message",
                &[("message", &peer.away_message)],
            ));
        }

        session.notifier().system(lines.join("\n"));
        Ok(CommandOutcome::Continue)
    }
}
