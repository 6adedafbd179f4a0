//! Environment variable overrides.
//!
//! `CLAUDESWAP_*` variables outrank the config file so a single invocation can
//! be pointed at a scratch settings file or run without the network probe.

use std::path::PathBuf;

use crate::error::ConfigError;

use super::Config;

pub(super) const ENV_SETTINGS_FILE: &str = "CLAUDESWAP_SETTINGS_FILE";
pub(super) const ENV_DATA_DIR: &str = "CLAUDESWAP_DATA_DIR";
pub(super) const ENV_VALIDATE_TIMEOUT_SECS: &str = "CLAUDESWAP_VALIDATE_TIMEOUT_SECS";
pub(super) const ENV_SKIP_VALIDATE: &str = "CLAUDESWAP_SKIP_VALIDATE";

pub(super) fn apply_runtime_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
    home: Option<&PathBuf>,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(path) = non_empty(env_lookup, ENV_SETTINGS_FILE) {
        config.paths.settings_file = super::expand_home(&path, home)?;
    }
    if let Some(path) = non_empty(env_lookup, ENV_DATA_DIR) {
        config.paths.data_dir = super::expand_home(&path, home)?;
    }
    if let Some(timeout) = non_empty(env_lookup, ENV_VALIDATE_TIMEOUT_SECS) {
        let parsed = timeout.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "invalid {ENV_VALIDATE_TIMEOUT_SECS} value `{timeout}`: expected positive integer seconds"
            ))
        })?;
        config.validator.timeout_secs = parsed;
    }
    if let Some(flag) = non_empty(env_lookup, ENV_SKIP_VALIDATE) {
        if parse_bool_flag(&flag).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "invalid {ENV_SKIP_VALIDATE} value `{flag}`: expected 1/0 or true/false"
            ))
        })? {
            config.validator.enabled = false;
        }
    }
    Ok(())
}

fn non_empty<FEnv>(env_lookup: &FEnv, name: &str) -> Option<String>
where
    FEnv: Fn(&str) -> Option<String>,
{
    env_lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackupConfig, DisplayConfig, PathsConfig, ValidatorConfig};
    use std::collections::HashMap;

    fn base_config() -> Config {
        Config {
            paths: PathsConfig::new("/home/u/.claude/settings.json", "/home/u/.config/claudeswap"),
            validator: ValidatorConfig::default(),
            backup: BackupConfig::default(),
            display: DisplayConfig::default(),
        }
    }

    fn apply(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = base_config();
        let home = PathBuf::from("/home/u");
        apply_runtime_env_overrides(&mut config, &|name| env.get(name).cloned(), Some(&home))?;
        Ok(config)
    }

    #[test]
    fn settings_and_data_dir_overrides_expand_home() {
        let config = apply(&[
            (ENV_SETTINGS_FILE, "~/scratch/settings.json"),
            (ENV_DATA_DIR, "/tmp/cs"),
        ])
        .unwrap();
        assert_eq!(
            config.paths.settings_file,
            PathBuf::from("/home/u/scratch/settings.json")
        );
        assert_eq!(config.paths.data_dir, PathBuf::from("/tmp/cs"));
    }

    #[test]
    fn timeout_override_rejects_zero_and_garbage() {
        assert!(apply(&[(ENV_VALIDATE_TIMEOUT_SECS, "0")]).is_err());
        assert!(apply(&[(ENV_VALIDATE_TIMEOUT_SECS, "soon")]).is_err());
        let config = apply(&[(ENV_VALIDATE_TIMEOUT_SECS, "12")]).unwrap();
        assert_eq!(config.validator.timeout_secs, 12);
    }

    #[test]
    fn skip_validate_flag_disables_probe() {
        assert!(!apply(&[(ENV_SKIP_VALIDATE, "true")]).unwrap().validator.enabled);
        assert!(apply(&[(ENV_SKIP_VALIDATE, "0")]).unwrap().validator.enabled);
        assert!(apply(&[(ENV_SKIP_VALIDATE, "maybe")]).is_err());
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = apply(&[(ENV_SETTINGS_FILE, "   ")]).unwrap();
        assert_eq!(config.paths, base_config().paths);
    }
}
