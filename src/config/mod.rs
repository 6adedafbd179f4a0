//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`CLAUDESWAP_SETTINGS_FILE`, `CLAUDESWAP_DATA_DIR`,
//!    `CLAUDESWAP_VALIDATE_TIMEOUT_SECS`, `CLAUDESWAP_SKIP_VALIDATE`)
//! 2. TOML file specified via `--config`
//! 3. `$XDG_CONFIG_HOME/claudeswap/claudeswap.toml` (or
//!    `~/.config/claudeswap/claudeswap.toml`)
//! 4. Built-in defaults

use std::path::PathBuf;

use crate::error::ConfigError;

mod defaults;
mod env;
mod init;
mod loader;
mod sources;
mod types;

pub use init::{config_root_dir, default_config_path, initialize_config};
pub use loader::{load_config, load_config_with_diagnostics};
pub use types::{
    BackupConfig, Config, ConfigDiagnostics, ConfigInitResult, DisplayConfig, LoadedConfig,
    PathsConfig, ValidatorConfig,
};
use types::FileConfig;

/// Expand a leading `~/` against `home`; other paths pass through unchanged.
pub(crate) fn expand_home(raw: &str, home: Option<&PathBuf>) -> Result<PathBuf, ConfigError> {
    let raw = raw.trim();
    if raw == "~" || raw.starts_with("~/") {
        let home = home.ok_or_else(|| {
            ConfigError::Invalid(format!(
                "cannot expand `{raw}`: home directory is unknown"
            ))
        })?;
        let rest = raw.trim_start_matches('~').trim_start_matches('/');
        return Ok(if rest.is_empty() {
            home.clone()
        } else {
            home.join(rest)
        });
    }
    Ok(PathBuf::from(raw))
}
