//! Application-wide constants
//!
//! Shared constants used across multiple modules.

use std::time::Duration;

/// Application directory name (used in config directory path)
pub const APP_DIR_NAME: &str = "lanchat";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Period of the liveness beacon
pub const LIVENESS_INTERVAL: Duration = Duration::from_secs(15);

/// A peer silent for longer than this is considered gone (8 beacons)
pub const PEER_TIMEOUT: Duration = Duration::from_secs(120);

/// Delay before a fresh logon is considered confirmed
pub const LOGON_CONFIRM_DELAY: Duration = Duration::from_millis(1500);

/// Period of the network link check
pub const NETWORK_CHECK_INTERVAL: Duration = Duration::from_secs(15);

/// Default chat color (RGB)
pub const DEFAULT_CHAT_COLOR: i32 = 0x00_00_00;

/// Time given to the logoff message to leave before the sockets close
pub const LOGOFF_FLUSH_DELAY: Duration = Duration::from_millis(200);
