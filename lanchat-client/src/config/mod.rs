//! Configuration management
//!
//! Settings are stored as pretty JSON in `<config dir>/lanchat/config.json`.
//! A missing file is not an error: the defaults are used until the first save.

pub mod settings;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub use settings::Settings;

use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME};

/// Errors from loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration directory available")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Platform-specific settings file path
///
/// Returns None if the config directory cannot be determined.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl Settings {
    /// Load settings from `path`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings to `path`, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;

        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Shared settings with write-through persistence
///
/// Without a path (tests, or no config directory) changes stay in memory.
pub struct SettingsStore {
    path: Option<PathBuf>,
    settings: Mutex<Settings>,
}

impl SettingsStore {
    /// Create a store that saves to `path` on every change
    pub fn new(settings: Settings, path: Option<PathBuf>) -> Self {
        Self {
            path,
            settings: Mutex::new(settings),
        }
    }

    /// Create a store that never touches the disk
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(settings, None)
    }

    /// Where the settings are saved, if anywhere
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current settings
    pub fn get(&self) -> Settings {
        self.settings
            .lock()
            .expect("settings lock poisoned")
            .clone()
    }

    /// Apply a change and persist it
    ///
    /// The in-memory change is kept even when saving fails.
    pub fn update<F>(&self, change: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Settings),
    {
        let snapshot = {
            let mut settings = self.settings.lock().expect("settings lock poisoned");
            change(&mut settings);
            settings.clone()
        };

        match &self.path {
            Some(path) => snapshot.save(path),
            None => Ok(()),
        }
    }

    /// Change the stored nick and persist it
    pub fn update_nick(&self, nick: &str) -> Result<(), ConfigError> {
        self.update(|settings| settings.nick = nick.to_string())
    }
}
