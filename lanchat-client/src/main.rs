//! LanChat terminal client

mod args;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use lanchat_common::MULTICAST_ADDRESS;
use lanchat_common::code::generate_user_code;
use lanchat_common::validators::validate_nickname;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use args::Args;
use lanchat_client::clock::now_millis;
use lanchat_client::commands::{CommandOutcome, handle_input};
use lanchat_client::config::{self, Settings, SettingsStore};
use lanchat_client::console::ConsolePrinter;
use lanchat_client::constants::LOGOFF_FLUSH_DELAY;
use lanchat_client::i18n::t_args;
use lanchat_client::liveness::LivenessMonitor;
use lanchat_client::logging;
use lanchat_client::network::{Messenger, NetworkConfig, NetworkService};
use lanchat_client::notices::Notifier;
use lanchat_client::peers::Peer;
use lanchat_client::responder::MessageResponder;
use lanchat_client::session::SessionController;
use lanchat_client::transfers::TransferRegistry;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    let notifier = Arc::new(Notifier::new());
    notifier.register(Arc::new(ConsolePrinter));

    let settings = setup_settings(&args, &notifier);
    let code = generate_user_code();
    let nick = choose_nick(args.nick.as_deref(), &settings.get().nick, code);
    debug!("User code {} with nick {}", code, nick);

    let network_config = NetworkConfig {
        chat_port: args.port,
        private_port: settings.get().private_port,
        multicast_group: MULTICAST_ADDRESS,
        private_chat: !settings.get().no_private_chat,
    };
    let (network, events) = match NetworkService::start(network_config) {
        Ok(started) => started,
        Err(e) => {
            notifier.critical(t_args("err-network-start", &[("error", &e.to_string())]));
            return ExitCode::FAILURE;
        }
    };

    let mut me = Peer::new_self(code, nick, now_millis());
    me.private_port = network.private_port();

    let messenger: Arc<dyn Messenger> = network.clone();
    let session = SessionController::new(
        me,
        messenger,
        Arc::new(TransferRegistry::new()),
        Arc::clone(&notifier),
        settings,
    );

    let responder = MessageResponder::new(Arc::clone(&session));
    tokio::spawn(responder.run(events));

    session.log_on().await;
    let monitor = LivenessMonitor::new(Arc::clone(&session));
    let monitor_task = monitor.start();

    run_input_loop(&session).await;

    info!("Shutting down");
    monitor.stop();
    if let Err(e) = monitor_task.await {
        warn!("Liveness monitor ended abnormally: {}", e);
    }
    session.log_off(true).await;
    tokio::time::sleep(LOGOFF_FLUSH_DELAY).await;
    network.shutdown();

    ExitCode::SUCCESS
}

/// Read commands and chat lines from stdin until quit, EOF or a signal
async fn run_input_loop(session: &Arc<SessionController>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = setup_shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if handle_input(session, &line).await == CommandOutcome::Quit {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            },
        }
    }
}

/// Load the settings file and apply command-line overrides
///
/// A broken settings file is reported and the defaults are used instead.
fn setup_settings(args: &Args, notifier: &Notifier) -> Arc<SettingsStore> {
    let path: Option<PathBuf> = args.config.clone().or_else(config::default_path);

    let mut settings = match path.as_deref() {
        Some(path) => Settings::load(path).unwrap_or_else(|e| {
            notifier.error(t_args("err-settings-load", &[("error", &e.to_string())]));
            Settings::default()
        }),
        None => {
            warn!("No configuration directory, settings will not be saved");
            Settings::default()
        }
    };

    if let Some(dir) = &args.download_dir {
        settings.download_dir = Some(dir.clone());
    }
    if args.no_private_chat {
        settings.no_private_chat = true;
    }

    Arc::new(match path {
        Some(path) => SettingsStore::new(settings, Some(path)),
        None => SettingsStore::in_memory(settings),
    })
}

/// First usable nick out of the command line and the stored one
///
/// Falls back to the user code.
fn choose_nick(requested: Option<&str>, stored: &str, code: u32) -> String {
    [requested.unwrap_or_default(), stored]
        .into_iter()
        .map(str::trim)
        .find(|nick| validate_nickname(nick).is_ok())
        .map(str::to_string)
        .unwrap_or_else(|| code.to_string())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C elsewhere)
///
/// If no handler can be installed this never completes.
async fn setup_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("Failed to install signal handlers: {}", e);
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
