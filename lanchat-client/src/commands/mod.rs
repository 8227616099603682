//! Chat input command system
//!
//! This module provides `/command` parsing and execution for the chat input.
//! Every command validates what it can against local state (the named user
//! exists and is not us, the transfer id is numeric and names a transfer in
//! the right state) before asking the session to act. Nothing is sent when a
//! check fails.
//!
//! ## Available Commands
//!
//! | Command | Aliases | Description |
//! |---------|---------|-------------|
//! | `/about` | | Show client name and version |
//! | `/away` | `/a` | Set yourself as away |
//! | `/back` | `/b` | Clear away status |
//! | `/cancel` | | Cancel a file transfer |
//! | `/help` | `/h`, `/?` | Show available commands |
//! | `/msg` | `/m` | Send a private message |
//! | `/nick` | | Change your nick |
//! | `/quit` | `/q` | Log off and exit |
//! | `/receive` | | Accept a file offer |
//! | `/reject` | | Reject a file offer |
//! | `/send` | | Offer a file to a user |
//! | `/topic` | `/t` | Show or change the topic |
//! | `/transfers` | | List file transfers |
//! | `/users` | | List users |
//! | `/whois` | `/w` | Show information about a user |
//!
//! ## Special Syntax
//!
//! - A lone `/` opens the help
//! - `//text` sends `/text` to the main chat
//! - A line starting with a space is never a command
//!
//! Unknown commands display an error and are never sent to the network.

mod about;
mod away;
mod back;
mod cancel;
mod help;
mod message;
mod nick;
mod quit;
mod receive;
mod reject;
mod send;
mod topic;
mod transfers;
mod users;
mod whois;

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;

use crate::errors::SessionError;
use crate::i18n::{t, t_args};
use crate::peers::Peer;
use crate::session::SessionController;
use crate::transfers::TransferId;

/// What the input loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Quit,
}

/// Result of a command; the error is the localized text shown to the user
pub type CommandResult = Result<CommandOutcome, String>;

/// A command implementation
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command. `invocation.name` is the name or alias typed.
    async fn execute(
        &self,
        session: &Arc<SessionController>,
        invocation: &CommandInvocation,
    ) -> CommandResult;
}

/// Name, aliases and help text of one command
pub struct CommandInfo {
    pub name: &'static str,
    /// Short forms, typed without the slash
    pub aliases: &'static [&'static str],
    /// Fluent key of the one-line description shown by /help
    pub description_key: &'static str,
    /// Fluent key of the usage line, takes the typed command as `$command`
    pub usage_key: &'static str,
}

/// Help metadata paired with the handler that runs the command
struct CommandRegistration {
    info: CommandInfo,
    handler: &'static dyn CommandHandler,
}

/// Every command, sorted by name so /help lists them in order
static COMMANDS: &[CommandRegistration] = &[
    CommandRegistration {
        info: CommandInfo {
            name: "about",
            aliases: &[],
            description_key: "cmd-about-desc",
            usage_key: "cmd-about-usage",
        },
        handler: &about::About,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "away",
            aliases: &["a"],
            description_key: "cmd-away-desc",
            usage_key: "cmd-away-usage",
        },
        handler: &away::Away,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "back",
            aliases: &["b"],
            description_key: "cmd-back-desc",
            usage_key: "cmd-back-usage",
        },
        handler: &back::Back,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "cancel",
            aliases: &[],
            description_key: "cmd-cancel-desc",
            usage_key: "cmd-cancel-usage",
        },
        handler: &cancel::Cancel,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "help",
            aliases: &["h", "?"],
            description_key: "cmd-help-desc",
            usage_key: "cmd-help-usage",
        },
        handler: &help::Help,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "msg",
            aliases: &["m"],
            description_key: "cmd-msg-desc",
            usage_key: "cmd-msg-usage",
        },
        handler: &message::PrivateMessage,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "nick",
            aliases: &[],
            description_key: "cmd-nick-desc",
            usage_key: "cmd-nick-usage",
        },
        handler: &nick::Nick,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "quit",
            aliases: &["q"],
            description_key: "cmd-quit-desc",
            usage_key: "cmd-quit-usage",
        },
        handler: &quit::Quit,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "receive",
            aliases: &[],
            description_key: "cmd-receive-desc",
            usage_key: "cmd-receive-usage",
        },
        handler: &receive::Receive,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "reject",
            aliases: &[],
            description_key: "cmd-reject-desc",
            usage_key: "cmd-reject-usage",
        },
        handler: &reject::Reject,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "send",
            aliases: &[],
            description_key: "cmd-send-desc",
            usage_key: "cmd-send-usage",
        },
        handler: &send::SendFile,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "topic",
            aliases: &["t"],
            description_key: "cmd-topic-desc",
            usage_key: "cmd-topic-usage",
        },
        handler: &topic::Topic,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "transfers",
            aliases: &[],
            description_key: "cmd-transfers-desc",
            usage_key: "cmd-transfers-usage",
        },
        handler: &transfers::Transfers,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "users",
            aliases: &[],
            description_key: "cmd-users-desc",
            usage_key: "cmd-users-usage",
        },
        handler: &users::Users,
    },
    CommandRegistration {
        info: CommandInfo {
            name: "whois",
            aliases: &["w"],
            description_key: "cmd-whois-desc",
            usage_key: "cmd-whois-usage",
        },
        handler: &whois::Whois,
    },
];

/// Index into `COMMANDS` for every name and alias
static COMMAND_MAP: LazyLock<HashMap<&'static str, usize>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    for (index, reg) in COMMANDS.iter().enumerate() {
        map.insert(reg.info.name, index);
        for alias in reg.info.aliases {
            map.insert(alias, index);
        }
    }

    map
});

/// Look up a command by name or alias, ignoring case
pub fn get_command_info(name: &str) -> Option<&'static CommandInfo> {
    COMMAND_MAP
        .get(name.to_lowercase().as_str())
        .map(|&index| &COMMANDS[index].info)
}

/// All commands, in alphabetical order
pub(crate) fn command_list() -> impl Iterator<Item = &'static CommandInfo> {
    COMMANDS.iter().map(|reg| &reg.info)
}

// =============================================================================
// Parsing
// =============================================================================

/// What a line of input turned out to be
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    Command(CommandInvocation),
    /// Text for the main chat
    Message(String),
    /// Blank line
    Empty,
}

/// A command as typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Lowercased name or alias, no slash
    pub name: String,
    /// Whitespace-separated words after the name
    pub args: Vec<String>,
    /// Everything after the command name, spacing preserved
    pub text: String,
}

impl CommandInvocation {
    /// The rest of the line after skipping `skip` arguments, trimmed
    ///
    /// Used for free text (message bodies, file paths) that may contain
    /// spaces of its own.
    pub fn text_after(&self, skip: usize) -> &str {
        let mut rest = self.text.as_str();
        for _ in 0..skip {
            rest = rest.trim_start();
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            rest = &rest[end..];
        }
        rest.trim()
    }
}

/// Split a line of input into a command or a chat message
///
/// Only a `/` in the very first column starts a command. A doubled slash
/// is stripped once and the rest is chat text, spacing untouched.
pub fn parse_input(input: &str) -> ParseResult {
    if input.trim().is_empty() {
        return ParseResult::Empty;
    }

    let Some(rest) = input.strip_prefix('/') else {
        return ParseResult::Message(input.to_string());
    };

    // `//` sends the input without the first `/`
    if rest.starts_with('/') {
        return ParseResult::Message(rest.to_string());
    }

    let mut parts = rest.split_whitespace();

    let Some(name) = parts.next() else {
        return ParseResult::Command(CommandInvocation {
            name: "help".to_string(),
            args: Vec::new(),
            text: String::new(),
        });
    };

    let args = parts.map(str::to_string).collect();
    let text = rest.trim_start()[name.len()..].trim_start().to_string();

    ParseResult::Command(CommandInvocation {
        name: name.to_lowercase(),
        args,
        text,
    })
}

// =============================================================================
// Execution
// =============================================================================

/// Handle one line of user input
///
/// Commands are executed, anything else is sent to the main chat. Failures
/// are reported through the session's notifier.
pub async fn handle_input(session: &Arc<SessionController>, input: &str) -> CommandOutcome {
    match parse_input(input) {
        ParseResult::Command(invocation) => execute_command(session, invocation).await,
        ParseResult::Message(text) => {
            if let Err(e) = session.send_chat_message(&text).await {
                session.report(&e);
            }
            CommandOutcome::Continue
        }
        ParseResult::Empty => CommandOutcome::Continue,
    }
}

/// Execute a command, reporting any failure
pub async fn execute_command(
    session: &Arc<SessionController>,
    invocation: CommandInvocation,
) -> CommandOutcome {
    let Some(&index) = COMMAND_MAP.get(invocation.name.as_str()) else {
        let error_msg = t_args("cmd-unknown", &[("command", &invocation.name)]);
        session.notifier().error(error_msg);
        return CommandOutcome::Continue;
    };

    match COMMANDS[index].handler.execute(session, &invocation).await {
        Ok(outcome) => outcome,
        Err(error_msg) => {
            session.notifier().error(error_msg);
            CommandOutcome::Continue
        }
    }
}

// =============================================================================
// Shared checks
// =============================================================================

/// Usage error for the command as it was typed
fn usage(usage_key: &str, invocation: &CommandInvocation) -> String {
    t_args(usage_key, &[("command", &invocation.name)])
}

/// Look up a user by nick
async fn find_peer(session: &SessionController, nick: &str) -> Result<Peer, String> {
    session
        .peer_by_nick(nick)
        .await
        .ok_or_else(|| t_args("err-unknown-user", &[("nick", nick)]))
}

/// Look up a user by nick, refusing the local user
async fn find_other_peer(session: &SessionController, nick: &str) -> Result<Peer, String> {
    let peer = find_peer(session, nick).await?;
    if peer.is_self {
        return Err(t("err-self-target"));
    }
    Ok(peer)
}

/// Parse a transfer id argument
fn parse_transfer_id(arg: &str) -> Result<TransferId, String> {
    arg.parse::<u32>()
        .map(TransferId::from)
        .map_err(|_| t_args("err-invalid-transfer-id", &[("id", arg)]))
}

fn user_error(error: SessionError) -> String {
    error.to_user_message()
}
