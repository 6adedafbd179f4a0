//! Configuration data model.
//!
//! `FileConfig` mirrors the TOML shape with raw strings; `Config` is the
//! resolved form with absolute paths that the rest of the crate consumes.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::{DEFAULT_BACKUP_KEEP, DEFAULT_VALIDATOR_TIMEOUT_SECS};

/// Top-level runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    pub validator: ValidatorConfig,
    pub backup: BackupConfig,
    pub display: DisplayConfig,
}

/// Resolved filesystem locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
    /// The assistant's live settings file (the Active-Config Mirror).
    pub settings_file: PathBuf,
    /// Directory owned by claudeswap.
    pub data_dir: PathBuf,
}

impl PathsConfig {
    /// Build paths rooted at an explicit data directory.
    pub fn new(settings_file: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings_file: settings_file.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Profile store file.
    pub fn profiles_file(&self) -> PathBuf {
        self.data_dir.join("profiles.json")
    }

    /// Engine-owned active state record.
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    /// Directory holding settings snapshots.
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// Advisory lock file serializing switches across processes.
    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join("switch.lock")
    }
}

/// Reachability probe settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: DEFAULT_VALIDATOR_TIMEOUT_SECS,
        }
    }
}

impl ValidatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Snapshot retention.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub keep: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            keep: DEFAULT_BACKUP_KEEP,
        }
    }
}

/// Display / rendering preferences.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct FilePathsConfig {
    pub(super) settings_file: Option<String>,
    pub(super) data_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileConfig {
    pub(super) paths: FilePathsConfig,
    pub(super) validator: ValidatorConfig,
    pub(super) backup: BackupConfig,
    pub(super) display: DisplayConfig,
}

/// Diagnostics captured while resolving runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigDiagnostics {
    /// Values that were adjusted to stay within supported bounds.
    pub warnings: Vec<String>,
}

/// Configuration payload plus load-time diagnostics.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub diagnostics: ConfigDiagnostics,
    /// Config file that was read, if any.
    pub source: Option<PathBuf>,
}

/// Result of explicit config initialization (`claudeswap init`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigInitResult {
    Created { path: PathBuf },
    AlreadyInitialized { path: PathBuf },
    Overwritten { path: PathBuf, backup_path: PathBuf },
}
