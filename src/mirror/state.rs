//! Engine-owned record of which profile is materialized (`state.json`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::MirrorError;
use crate::fsutil::{read_optional, write_atomic};

const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveState {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub last_switch_at_millis: Option<u64>,
    /// Settings variables written by the last switch.
    #[serde(default)]
    pub managed_keys: Vec<String>,
}

impl ActiveState {
    pub fn committed(profile: Option<String>, at_millis: u64, managed_keys: Vec<String>) -> Self {
        Self {
            version: STATE_VERSION,
            active_profile: profile,
            last_switch_at_millis: Some(at_millis),
            managed_keys,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Missing file reads as the pristine default.
    pub fn load(&self) -> Result<ActiveState, MirrorError> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(ActiveState::default());
        };
        serde_json::from_slice(&bytes).map_err(|err| {
            MirrorError::Malformed(format!(
                "failed to parse `{}`: {err}",
                self.path.display()
            ))
        })
    }

    pub fn save(&self, state: &ActiveState) -> Result<(), MirrorError> {
        let mut bytes = serde_json::to_vec_pretty(state)
            .map_err(|err| MirrorError::Malformed(format!("failed to serialize state: {err}")))?;
        bytes.push(b'\n');
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestTempDir;

    #[test]
    fn missing_state_is_pristine() {
        let tmp = TestTempDir::new("state-missing");
        let state = StateStore::new(tmp.child("state.json")).load().unwrap();
        assert_eq!(state, ActiveState::default());
        assert!(state.active_profile.is_none());
    }

    #[test]
    fn saved_state_loads_back() {
        let tmp = TestTempDir::new("state-save");
        let store = StateStore::new(tmp.child("state.json"));
        let state = ActiveState::committed(
            Some("glm".to_string()),
            1_700_000_000_000,
            vec!["ANTHROPIC_BASE_URL".to_string()],
        );
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn corrupt_state_is_malformed() {
        let tmp = TestTempDir::new("state-corrupt");
        tmp.write_text("state.json", "not json");
        assert!(matches!(
            StateStore::new(tmp.child("state.json")).load(),
            Err(MirrorError::Malformed(_))
        ));
    }
}
