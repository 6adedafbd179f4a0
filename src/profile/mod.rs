//! Provider profiles: the named unit a switch materializes.
//!
//! Core fields (`base_url`, `credential`, `model_map`) are typed; provider
//! specific tuning lives in the open `extra_flags` map and is passed through
//! verbatim.

mod crypto;
pub mod presets;
mod store;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::StoreError;

pub use store::{ProfileStore, UpsertOutcome, DEFAULT_KDF_LOG_N};

/// Logical model slots defined by the assistant. Each maps to exactly one
/// settings variable; unmapped slots fall back to the assistant's defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalModel {
    Default,
    Fast,
    Haiku,
    Sonnet,
    Opus,
    Subagent,
}

impl LogicalModel {
    pub const ALL: [LogicalModel; 6] = [
        LogicalModel::Default,
        LogicalModel::Fast,
        LogicalModel::Haiku,
        LogicalModel::Sonnet,
        LogicalModel::Opus,
        LogicalModel::Subagent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Fast => "fast",
            Self::Haiku => "haiku",
            Self::Sonnet => "sonnet",
            Self::Opus => "opus",
            Self::Subagent => "subagent",
        }
    }

    /// Settings `env` variable carrying this slot.
    pub fn env_var(self) -> &'static str {
        match self {
            Self::Default => "ANTHROPIC_MODEL",
            Self::Fast => "ANTHROPIC_SMALL_FAST_MODEL",
            Self::Haiku => "ANTHROPIC_DEFAULT_HAIKU_MODEL",
            Self::Sonnet => "ANTHROPIC_DEFAULT_SONNET_MODEL",
            Self::Opus => "ANTHROPIC_DEFAULT_OPUS_MODEL",
            Self::Subagent => "CLAUDE_CODE_SUBAGENT_MODEL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|slot| slot.as_str() == wanted)
    }
}

impl fmt::Display for LogicalModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named provider configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub base_url: String,
    pub credential: String,
    #[serde(default)]
    pub model_map: BTreeMap<LogicalModel, String>,
    #[serde(default)]
    pub extra_flags: BTreeMap<String, String>,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("credential", &mask_secret(&self.credential))
            .field("model_map", &self.model_map)
            .field("extra_flags", &self.extra_flags)
            .finish()
    }
}

impl Profile {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            credential: credential.into(),
            model_map: BTreeMap::new(),
            extra_flags: BTreeMap::new(),
        }
    }

    pub fn with_model(mut self, slot: LogicalModel, model: impl Into<String>) -> Self {
        self.model_map.insert(slot, model.into());
        self
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_flags.insert(key.into(), value.into());
        self
    }

    /// Trim whitespace around every field so stored records are canonical.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self.credential = self.credential.trim().to_string();
        for model in self.model_map.values_mut() {
            *model = model.trim().to_string();
        }
        self.extra_flags = self
            .extra_flags
            .into_iter()
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect();
        self
    }

    /// Reject records that could never be materialized safely.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_name(&self.name)?;
        validate_base_url(&self.name, &self.base_url)?;
        if self.credential.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "profile `{}` has an empty credential",
                self.name
            )));
        }
        for (slot, model) in &self.model_map {
            if model.trim().is_empty() {
                return Err(StoreError::Validation(format!(
                    "profile `{}` maps `{slot}` to an empty model id; drop the entry to use the assistant default",
                    self.name
                )));
            }
        }
        for key in self.extra_flags.keys() {
            validate_flag_name(&self.name, key)?;
        }
        Ok(())
    }

    /// Host portion of `base_url`, for compact listings.
    pub fn host(&self) -> String {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.base_url.clone())
    }
}

/// Settings variables the engine always owns, independent of any profile.
pub const CORE_ENV_VARS: [&str; 2] = ["ANTHROPIC_BASE_URL", "ANTHROPIC_AUTH_TOKEN"];

/// Every variable whose value comes from a typed profile field.
pub fn reserved_env_vars() -> impl Iterator<Item = &'static str> {
    CORE_ENV_VARS
        .into_iter()
        .chain(LogicalModel::ALL.into_iter().map(LogicalModel::env_var))
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation(
            "profile name must not be empty".to_string(),
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')))
    {
        return Err(StoreError::Validation(format!(
            "profile name `{name}` contains `{bad}`; use letters, digits, `-`, `_` or `.`"
        )));
    }
    Ok(())
}

fn validate_base_url(profile: &str, base_url: &str) -> Result<(), StoreError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!(
            "profile `{profile}` has an empty base_url"
        )));
    }
    let parsed = reqwest::Url::parse(trimmed).map_err(|err| {
        StoreError::Validation(format!(
            "invalid base_url `{trimmed}` for profile `{profile}`: {err}"
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(StoreError::Validation(format!(
                "invalid base_url `{trimmed}` for profile `{profile}`: unsupported scheme `{other}` (expected http or https)"
            )));
        }
    }
    if parsed.host_str().is_none() {
        return Err(StoreError::Validation(format!(
            "invalid base_url `{trimmed}` for profile `{profile}`: missing host"
        )));
    }
    Ok(())
}

fn validate_flag_name(profile: &str, key: &str) -> Result<(), StoreError> {
    let well_formed = key
        .chars()
        .next()
        .is_some_and(|first| first.is_ascii_uppercase() || first == '_')
        && key
            .chars()
            .all(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '_');
    if !well_formed {
        return Err(StoreError::Validation(format!(
            "profile `{profile}` flag `{key}` is not an environment variable name (A-Z, 0-9, _)"
        )));
    }
    if reserved_env_vars().any(|reserved| reserved == key) {
        return Err(StoreError::Validation(format!(
            "profile `{profile}` flag `{key}` collides with a managed variable; set it through base_url, credential or model_map"
        )));
    }
    Ok(())
}

/// Render a secret for display: first and last four characters only.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.trim().chars().collect();
    if chars.len() <= 8 {
        return "•".repeat(chars.len().max(4));
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
