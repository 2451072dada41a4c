//! Process-wide settings document.
//!
//! The document is a flat TOML table. Values are read leniently: numbers may
//! be written as strings, booleans as `"true"`/`"false"`, and anything missing
//! or unreadable falls back to its default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml::{Table, Value};
use tracing::{info, warn};

/// File name of the settings document inside a data directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Key of the default restock interval (seconds).
pub const KEY_DEFAULT_RESTOCK_TIME: &str = "default-restock-time";
/// Key of the announce-on-restock flag.
pub const KEY_ANNOUNCE_RESTOCK: &str = "announce-restock";
/// Key of the self-registration flag.
pub const KEY_ALLOW_PLAYER_REGISTRATION: &str = "allow-player-registration";

/// Default restock interval: five minutes.
pub const DEFAULT_RESTOCK_SECONDS: u32 = 300;

/// Errors raised by [`ConfigStore`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Wrap IO errors on the settings file.
    #[error("failed to access config: {0}")]
    Io(#[from] io::Error),
    /// The document is not a TOML table.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The table could not be rendered.
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
    /// The default interval must be at least one second.
    #[error("default restock time must be at least 1 second, got {0}")]
    InvalidDefault(i64),
}

/// Typed view of the settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Interval given to newly registered containers.
    pub default_restock_seconds: u32,
    /// Notify nearby actors after automatic restocks.
    pub announce_on_restock: bool,
    /// Let non-privileged actors register containers.
    pub allow_self_registration: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            default_restock_seconds: DEFAULT_RESTOCK_SECONDS,
            announce_on_restock: false,
            allow_self_registration: true,
        }
    }
}

impl GlobalConfig {
    /// Read typed values from a raw table, falling back per key.
    pub fn from_table(table: &Table) -> Self {
        let defaults = Self::default();
        let default_restock_seconds = get_int(table, KEY_DEFAULT_RESTOCK_TIME)
            .and_then(|seconds| u32::try_from(seconds).ok())
            .filter(|seconds| *seconds >= 1)
            .unwrap_or(defaults.default_restock_seconds);
        Self {
            default_restock_seconds,
            announce_on_restock: get_bool(table, KEY_ANNOUNCE_RESTOCK)
                .unwrap_or(defaults.announce_on_restock),
            allow_self_registration: get_bool(table, KEY_ALLOW_PLAYER_REGISTRATION)
                .unwrap_or(defaults.allow_self_registration),
        }
    }

    /// Raw table holding these values.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.insert(
            KEY_DEFAULT_RESTOCK_TIME.into(),
            Value::Integer(i64::from(self.default_restock_seconds)),
        );
        table.insert(
            KEY_ANNOUNCE_RESTOCK.into(),
            Value::Boolean(self.announce_on_restock),
        );
        table.insert(
            KEY_ALLOW_PLAYER_REGISTRATION.into(),
            Value::Boolean(self.allow_self_registration),
        );
        table
    }
}

fn get_int(table: &Table, key: &str) -> Option<i64> {
    match table.get(key)? {
        Value::Integer(value) => Some(*value),
        Value::Float(value) => Some(value.trunc() as i64),
        Value::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

fn get_bool(table: &Table, key: &str) -> Option<bool> {
    match table.get(key)? {
        Value::Boolean(value) => Some(*value),
        Value::String(value) => Some(value.trim().eq_ignore_ascii_case("true")),
        _ => None,
    }
}

/// Settings document on disk plus its typed view.
///
/// Unknown keys in the document are kept and written back on save.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    table: Table,
    current: GlobalConfig,
}

impl ConfigStore {
    /// Load [`CONFIG_FILE_NAME`] from `dir`.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self::load_from_path(dir.as_ref().join(CONFIG_FILE_NAME))
    }

    /// Load the document at `path`, creating it with defaults if absent.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let mut store = Self {
            path: path.as_ref().to_path_buf(),
            table: GlobalConfig::default().to_table(),
            current: GlobalConfig::default(),
        };
        store.reload();
        store
    }

    /// Re-read the document. Returns the new typed view.
    pub fn reload(&mut self) -> GlobalConfig {
        match self.read_table() {
            Ok(Some(table)) => self.table = table,
            Ok(None) => {
                info!(path = %self.path.display(), "Config not found. Writing defaults");
                self.table = GlobalConfig::default().to_table();
                if let Err(err) = self.save() {
                    warn!(%err, path = %self.path.display(), "Failed to write default config");
                }
            }
            Err(err) => {
                warn!(%err, path = %self.path.display(), "Failed to load config. Using defaults");
                self.table = GlobalConfig::default().to_table();
            }
        }
        self.current = GlobalConfig::from_table(&self.table);
        self.current
    }

    fn read_table(&self) -> Result<Option<Table>, ConfigError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(contents.parse::<Table>()?))
    }

    /// Current typed view.
    pub fn config(&self) -> GlobalConfig {
        self.current
    }

    /// Path of the settings document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the document.
    pub fn save(&self) -> Result<(), ConfigError> {
        let rendered = toml::to_string_pretty(&self.table)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, rendered)?;
        Ok(())
    }

    /// Change the default interval and persist it.
    ///
    /// A failed write is logged; the in-memory value is kept either way.
    pub fn set_default_restock_seconds(&mut self, seconds: i64) -> Result<u32, ConfigError> {
        let value = u32::try_from(seconds)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or(ConfigError::InvalidDefault(seconds))?;
        self.table
            .insert(KEY_DEFAULT_RESTOCK_TIME.into(), Value::Integer(i64::from(value)));
        self.current.default_restock_seconds = value;
        if let Err(err) = self.save() {
            warn!(%err, path = %self.path.display(), "Failed to save config");
        }
        info!(seconds = value, "Default restock time updated");
        Ok(value)
    }
}
