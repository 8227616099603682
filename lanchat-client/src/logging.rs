//! Diagnostic logging setup
//!
//! Logs go to stderr so they never mix with the chat on stdout. `RUST_LOG`
//! wins when no verbosity flag is given.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when neither `RUST_LOG` nor `-v` says otherwise
const DEFAULT_FILTER: &str = "lanchat=warn";

/// Pick the log filter for a verbosity count
pub fn filter_for(verbose: u8) -> EnvFilter {
    match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()),
        1 => EnvFilter::new("lanchat=debug"),
        _ => EnvFilter::new("lanchat=trace"),
    }
}

/// Install the global subscriber
pub fn init(verbose: u8) {
    let subscriber = tracing_subscriber::registry()
        .with(filter_for(verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    if subscriber.try_init().is_err() {
        eprintln!("Logging was already initialized");
    }
}
