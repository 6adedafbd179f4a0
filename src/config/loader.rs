//! Top-level config loading pipeline.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::{APP_DIR_NAME, DEFAULT_SETTINGS_RELATIVE};
use super::env::apply_runtime_env_overrides;
use super::init::config_root_dir;
use super::sources::read_config_text_with_sources;
use super::{expand_home, Config, ConfigDiagnostics, FileConfig, LoadedConfig, PathsConfig};

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from `--config`).
pub fn load_config(path_override: Option<&str>) -> Result<Config, ConfigError> {
    Ok(load_config_with_diagnostics(path_override)?.config)
}

/// Load configuration and return adjustment diagnostics.
pub fn load_config_with_diagnostics(
    path_override: Option<&str>,
) -> Result<LoadedConfig, ConfigError> {
    load_config_with_diagnostics_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
        dirs::home_dir,
    )
}

pub(super) fn load_config_with_diagnostics_from_sources<FRead, FEnv, FRoot, FHome>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
    home_dir: FHome,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
    FHome: Fn() -> Option<PathBuf>,
{
    let (config_text, source) =
        read_config_text_with_sources(path_override, &read_file, &config_root)?;
    let parsed: FileConfig = toml::from_str(&config_text)?;
    let home = home_dir();
    let mut diagnostics = ConfigDiagnostics::default();
    let mut config = resolve_config(parsed, home.as_ref(), &config_root, &mut diagnostics)?;
    apply_runtime_env_overrides(&mut config, &env_lookup, home.as_ref())?;

    Ok(LoadedConfig {
        config,
        diagnostics,
        source: source.path(),
    })
}

fn resolve_config<FRoot>(
    parsed: FileConfig,
    home: Option<&PathBuf>,
    config_root: &FRoot,
    diagnostics: &mut ConfigDiagnostics,
) -> Result<Config, ConfigError>
where
    FRoot: Fn() -> Option<PathBuf>,
{
    let settings_file = match parsed.paths.settings_file.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => expand_home(raw, home)?,
        _ => home
            .map(|dir| dir.join(DEFAULT_SETTINGS_RELATIVE))
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "unable to resolve home directory for ~/.claude/settings.json; set paths.settings_file"
                        .to_string(),
                )
            })?,
    };
    let data_dir = match parsed.paths.data_dir.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => expand_home(raw, home)?,
        _ => config_root()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| {
                ConfigError::Invalid(
                    "unable to resolve config directory for claudeswap data; set paths.data_dir"
                        .to_string(),
                )
            })?,
    };

    let mut validator = parsed.validator;
    if validator.timeout_secs == 0 {
        diagnostics
            .warnings
            .push("validator.timeout_secs = 0 is not allowed; using 1 second".to_string());
        validator.timeout_secs = 1;
    }
    let mut backup = parsed.backup;
    if backup.keep == 0 {
        diagnostics.warnings.push(
            "backup.keep = 0 would discard the rollback point; keeping 1 snapshot".to_string(),
        );
        backup.keep = 1;
    }

    Ok(Config {
        paths: PathsConfig::new(settings_file, data_dir),
        validator,
        backup,
        display: parsed.display,
    })
}
