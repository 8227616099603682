//! Command-line argument parsing

use std::path::PathBuf;

use clap::Parser;
use lanchat_common::DEFAULT_CHAT_PORT;

/// Serverless chat for the local network
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Nick to use (overrides the stored one for this session)
    #[arg(short, long)]
    pub nick: Option<String>,

    /// Settings file path (default: <config dir>/lanchat/config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory received files are saved in
    #[arg(short, long = "download-dir")]
    pub download_dir: Option<PathBuf>,

    /// Multicast port of the main chat
    #[arg(short, long, default_value_t = DEFAULT_CHAT_PORT)]
    pub port: u16,

    /// Do not send or receive private messages
    #[arg(long, default_value = "false")]
    pub no_private_chat: bool,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
