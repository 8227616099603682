//! LanChat client library
//!
//! Session, presence and file transfer logic of the serverless LAN chat.
//! The binary wires these pieces to the UDP network and the terminal.

pub mod clock;
pub mod commands;
pub mod config;
pub mod console;
pub mod constants;
pub mod errors;
pub mod i18n;
pub mod liveness;
pub mod logging;
pub mod network;
pub mod notices;
pub mod peers;
pub mod responder;
pub mod session;
pub mod transfers;
