//! Built-in provider presets offered by `claudeswap setup`.
//!
//! A preset fills everything except the credential. Third-party endpoints
//! get the long request timeout and non-essential-traffic opt-out they need
//! to behave under the assistant.

use super::{LogicalModel, Profile};

/// Request timeout for slow third-party providers, in milliseconds.
pub const THIRD_PARTY_TIMEOUT_MS: &str = "3000000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub key: &'static str,
    pub label: &'static str,
    pub base_url: &'static str,
    models: &'static [(LogicalModel, &'static str)],
    third_party: bool,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        key: "anthropic",
        label: "Anthropic (official API)",
        base_url: "https://api.anthropic.com",
        models: &[],
        third_party: false,
    },
    Preset {
        key: "glm",
        label: "Z.ai GLM",
        base_url: "https://api.z.ai/api/anthropic",
        models: &[
            (LogicalModel::Default, "glm-4.6"),
            (LogicalModel::Fast, "glm-4.5-air"),
            (LogicalModel::Haiku, "glm-4.5-air"),
            (LogicalModel::Sonnet, "glm-4.6"),
            (LogicalModel::Opus, "glm-4.6"),
        ],
        third_party: true,
    },
    Preset {
        key: "minimax",
        label: "MiniMax",
        base_url: "https://api.minimax.io/anthropic",
        models: &[
            (LogicalModel::Default, "MiniMax-M2"),
            (LogicalModel::Fast, "MiniMax-M2"),
            (LogicalModel::Haiku, "MiniMax-M2"),
            (LogicalModel::Sonnet, "MiniMax-M2"),
            (LogicalModel::Opus, "MiniMax-M2"),
        ],
        third_party: true,
    },
    Preset {
        key: "kimi",
        label: "Moonshot Kimi",
        base_url: "https://api.moonshot.ai/anthropic",
        models: &[
            (LogicalModel::Default, "kimi-k2-turbo-preview"),
            (LogicalModel::Fast, "kimi-k2-turbo-preview"),
        ],
        third_party: true,
    },
];

/// Look up a preset by key (case-insensitive).
pub fn find(key: &str) -> Option<&'static Preset> {
    let key = key.trim();
    PRESETS
        .iter()
        .find(|preset| preset.key.eq_ignore_ascii_case(key))
}

impl Preset {
    /// Build a profile from this preset under `name` with `credential`.
    pub fn to_profile(&self, name: &str, credential: &str) -> Profile {
        let mut profile = Profile::new(name, self.base_url, credential);
        for (slot, model) in self.models {
            profile = profile.with_model(*slot, *model);
        }
        if self.third_party {
            profile = profile
                .with_flag("API_TIMEOUT_MS", THIRD_PARTY_TIMEOUT_MS)
                .with_flag("CLAUDE_CODE_DISABLE_NONESSENTIAL_TRAFFIC", "1");
        }
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_builds_a_valid_profile() {
        for preset in PRESETS {
            preset
                .to_profile(preset.key, "k")
                .validate()
                .unwrap_or_else(|err| panic!("{}: {err}", preset.key));
        }
    }

    #[test]
    fn third_party_presets_carry_performance_flags() {
        let glm = find("GLM").unwrap().to_profile("glm", "k");
        assert_eq!(glm.extra_flags["API_TIMEOUT_MS"], "3000000");
        assert_eq!(glm.model_map[&LogicalModel::Fast], "glm-4.5-air");

        let anthropic = find("anthropic").unwrap().to_profile("anthropic", "k");
        assert!(anthropic.extra_flags.is_empty());
        assert!(anthropic.model_map.is_empty());
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(find("openrouter").is_none());
    }
}
