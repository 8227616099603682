//! User preference settings

use std::path::PathBuf;

use lanchat_common::DEFAULT_PRIVATE_CHAT_PORT;

use crate::constants::DEFAULT_CHAT_COLOR;

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Settings {
    /// Preferred nick (empty means "use the user code")
    #[serde(default)]
    pub nick: String,

    /// Color of own chat lines (RGB)
    #[serde(default = "default_chat_color")]
    pub own_color: i32,

    /// Disable private chat entirely
    #[serde(default)]
    pub no_private_chat: bool,

    /// Where received files are stored (None = system downloads directory)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// UDP port for private messages
    #[serde(default = "default_private_port")]
    pub private_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nick: String::new(),
            own_color: default_chat_color(),
            no_private_chat: false,
            download_dir: None,
            private_port: default_private_port(),
        }
    }
}

impl Settings {
    /// Resolve the directory received files are written to
    ///
    /// Falls back to the system downloads directory, then the current directory.
    pub fn resolved_download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

// =============================================================================
// Default Functions (for serde)
// =============================================================================

fn default_chat_color() -> i32 {
    DEFAULT_CHAT_COLOR
}

fn default_private_port() -> u16 {
    DEFAULT_PRIVATE_CHAT_PORT
}
