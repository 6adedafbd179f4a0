//! Default configuration constants.

/// Embedded default `claudeswap.toml` template written by `claudeswap init`.
pub(super) const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../templates/claudeswap.toml");
/// Directory name used under the config root.
pub(super) const APP_DIR_NAME: &str = "claudeswap";
/// Config file name inside [`APP_DIR_NAME`].
pub(super) const CONFIG_FILE_NAME: &str = "claudeswap.toml";
/// Assistant settings file, relative to the home directory.
pub(super) const DEFAULT_SETTINGS_RELATIVE: &str = ".claude/settings.json";
/// Default bound for the provider reachability probe.
pub(super) const DEFAULT_VALIDATOR_TIMEOUT_SECS: u64 = 5;
/// Default number of settings snapshots kept after successful switches.
pub(super) const DEFAULT_BACKUP_KEEP: usize = 5;
