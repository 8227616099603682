//! Plain terminal front end
//!
//! Prints every notice to stdout as one timestamped line.

use std::io::Write;

use crate::notices::{Notice, NoticeListener};

/// Prefix of system messages
const SYSTEM_PREFIX: &str = "***";

/// Prefix of error messages
const ERROR_PREFIX: &str = "!!!";

/// Writes notices to stdout
#[derive(Debug, Default)]
pub struct ConsolePrinter;

impl NoticeListener for ConsolePrinter {
    fn on_notice(&self, notice: &Notice) {
        let line = format!("[{}] {}", clock_time(), render(notice));
        let mut stdout = std::io::stdout().lock();
        // A closed stdout leaves nobody to tell
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

/// Current local time of day
fn clock_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Text of a notice without the timestamp
pub fn render(notice: &Notice) -> String {
    match notice {
        Notice::System(text) => format!("{} {}", SYSTEM_PREFIX, text),
        Notice::Error(text) | Notice::Critical(text) => format!("{} {}", ERROR_PREFIX, text),
        Notice::Chat { nick, text, .. } => format!("<{}>: {}", nick, text),
        Notice::Private {
            peer,
            outgoing: true,
            text,
        } => format!("-> *{}* {}", peer, text),
        Notice::Private { peer, text, .. } => format!("*{}* {}", peer, text),
        Notice::PrivateSystem { peer, text } => format!("*{}* {} {}", peer, SYSTEM_PREFIX, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_chat() {
        let notice = Notice::Chat {
            nick: "Tina".to_string(),
            color: 0,
            text: "hello".to_string(),
        };
        assert_eq!(render(&notice), "<Tina>: hello");
    }

    #[test]
    fn test_render_private() {
        let incoming = Notice::Private {
            peer: "Tina".to_string(),
            outgoing: false,
            text: "psst".to_string(),
        };
        let outgoing = Notice::Private {
            peer: "Tina".to_string(),
            outgoing: true,
            text: "hi".to_string(),
        };
        assert_eq!(render(&incoming), "*Tina* psst");
        assert_eq!(render(&outgoing), "-> *Tina* hi");
    }

    #[test]
    fn test_render_system_and_error() {
        assert_eq!(render(&Notice::System("x".to_string())), "*** x");
        assert_eq!(render(&Notice::Error("y".to_string())), "!!! y");
        assert_eq!(render(&Notice::Critical("z".to_string())), "!!! z");
    }
}
