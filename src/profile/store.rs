//! Persistent profile store (`<data_dir>/profiles.json`).
//!
//! Format history:
//! - version 1: plaintext credentials, still readable.
//! - version 2: credentials sealed per record under a machine-wrapped data key.
//!
//! Every write produces version 2. Listing order is lexical by name.

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::crypto::{self, KeyEnvelope, SealedSecret};
use super::{LogicalModel, Profile};
use crate::error::StoreError;
use crate::fsutil::{read_optional, write_atomic};

/// Production scrypt cost (`N = 2^15`).
pub const DEFAULT_KDF_LOG_N: u8 = 15;
const CURRENT_VERSION: u32 = 2;

/// Whether an upsert added a new name or replaced an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PlainStoreFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    profiles: BTreeMap<String, PlainRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PlainRecord {
    base_url: String,
    credential: String,
    #[serde(default)]
    model_map: BTreeMap<LogicalModel, String>,
    #[serde(default)]
    extra_flags: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SealedStoreFile {
    version: u32,
    key: KeyEnvelope,
    #[serde(default)]
    profiles: BTreeMap<String, SealedRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SealedRecord {
    base_url: String,
    credential: SealedSecret,
    #[serde(default)]
    model_map: BTreeMap<LogicalModel, String>,
    #[serde(default)]
    extra_flags: BTreeMap<String, String>,
}

/// File-backed profile store.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
    kdf_log_n: u8,
}

impl ProfileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kdf_log_n: DEFAULT_KDF_LOG_N,
        }
    }

    /// Override the key-derivation cost used for new writes.
    pub fn with_kdf_cost(mut self, log_n: u8) -> Self {
        self.kdf_log_n = log_n;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch one profile by exact name.
    pub fn get(&self, name: &str) -> Result<Profile, StoreError> {
        let mut profiles = self.load()?;
        profiles
            .remove(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// All profile names in lexical order.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.into_keys().collect())
    }

    /// All profiles in lexical name order.
    pub fn profiles(&self) -> Result<Vec<Profile>, StoreError> {
        Ok(self.load()?.into_values().collect())
    }

    /// Validate and insert or replace a profile. The file is durable on return.
    pub fn upsert(&self, profile: Profile) -> Result<UpsertOutcome, StoreError> {
        let profile = profile.normalized();
        profile.validate()?;

        let _guard = self.lock_for_write()?;
        let mut profiles = self.load()?;
        let outcome = if profiles.insert(profile.name.clone(), profile.clone()).is_some() {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Created
        };
        self.write(&profiles)?;
        info!(profile = %profile.name, ?outcome, "profile saved");
        Ok(outcome)
    }

    /// Delete a profile. Refuses to delete `active`.
    pub fn remove(&self, name: &str, active: Option<&str>) -> Result<(), StoreError> {
        if active == Some(name) {
            return Err(StoreError::InUse(name.to_string()));
        }
        let _guard = self.lock_for_write()?;
        let mut profiles = self.load()?;
        if profiles.remove(name).is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        self.write(&profiles)?;
        info!(profile = %name, "profile removed");
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, Profile>, StoreError> {
        let Some(bytes) = read_optional(&self.path)? else {
            return Ok(BTreeMap::new());
        };
        let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|err| {
            StoreError::Corrupt(format!(
                "failed to parse profile store `{}`: {err}",
                self.path.display()
            ))
        })?;
        let version = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(1);
        if version > u64::from(CURRENT_VERSION) {
            return Err(StoreError::Corrupt(format!(
                "profile store `{}` has format version {version}; this build understands up to {CURRENT_VERSION}",
                self.path.display()
            )));
        }

        if version >= 2 {
            let sealed: SealedStoreFile = serde_json::from_value(value).map_err(|err| {
                StoreError::Corrupt(format!(
                    "failed to parse profile store `{}`: {err}",
                    self.path.display()
                ))
            })?;
            return open_sealed(sealed);
        }

        debug!(path = %self.path.display(), "reading plaintext profile store");
        let plain: PlainStoreFile = serde_json::from_value(value).map_err(|err| {
            StoreError::Corrupt(format!(
                "failed to parse profile store `{}`: {err}",
                self.path.display()
            ))
        })?;
        Ok(plain
            .profiles
            .into_iter()
            .map(|(name, record)| {
                let profile = Profile {
                    name: name.clone(),
                    base_url: record.base_url,
                    credential: record.credential,
                    model_map: record.model_map,
                    extra_flags: record.extra_flags,
                };
                (name, profile)
            })
            .collect())
    }

    fn write(&self, profiles: &BTreeMap<String, Profile>) -> Result<(), StoreError> {
        let (key, envelope) = crypto::new_data_key(self.kdf_log_n)?;
        let mut records = BTreeMap::new();
        for (name, profile) in profiles {
            records.insert(
                name.clone(),
                SealedRecord {
                    base_url: profile.base_url.clone(),
                    credential: crypto::seal(&key, &profile.credential)?,
                    model_map: profile.model_map.clone(),
                    extra_flags: profile.extra_flags.clone(),
                },
            );
        }
        let file = SealedStoreFile {
            version: CURRENT_VERSION,
            key: envelope,
            profiles: records,
        };
        let text = serde_json::to_string_pretty(&file).map_err(|err| {
            StoreError::Corrupt(format!("failed to serialize profile store: {err}"))
        })?;
        write_atomic(&self.path, text.as_bytes())?;
        Ok(())
    }

    fn lock_for_write(&self) -> Result<File, StoreError> {
        let mut lock_name = self.path.as_os_str().to_os_string();
        lock_name.push(".lock");
        let lock_path = PathBuf::from(lock_name);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }
}

fn open_sealed(sealed: SealedStoreFile) -> Result<BTreeMap<String, Profile>, StoreError> {
    if sealed.profiles.is_empty() {
        return Ok(BTreeMap::new());
    }
    let key = crypto::open_envelope(&sealed.key)?;
    let mut profiles = BTreeMap::new();
    for (name, record) in sealed.profiles {
        let credential = crypto::unseal(&key, &record.credential, &name)?;
        profiles.insert(
            name.clone(),
            Profile {
                name,
                base_url: record.base_url,
                credential,
                model_map: record.model_map,
                extra_flags: record.extra_flags,
            },
        );
    }
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestTempDir;

    fn store(tmp: &TestTempDir) -> ProfileStore {
        ProfileStore::open(tmp.child("profiles.json")).with_kdf_cost(4)
    }

    fn glm() -> Profile {
        Profile::new("glm", "https://api.z.ai/api/anthropic", "k1")
            .with_model(LogicalModel::Fast, "glm-4-flash")
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let tmp = TestTempDir::new("store-empty");
        let store = store(&tmp);
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.get("glm"), Err(StoreError::NotFound(name)) if name == "glm"));
    }

    #[test]
    fn upsert_then_get_returns_the_saved_record() {
        let tmp = TestTempDir::new("store-upsert");
        let store = store(&tmp);
        assert_eq!(store.upsert(glm()).unwrap(), UpsertOutcome::Created);
        assert_eq!(store.get("glm").unwrap(), glm());

        let updated = glm().with_model(LogicalModel::Opus, "glm-4.6");
        assert_eq!(store.upsert(updated.clone()).unwrap(), UpsertOutcome::Replaced);
        assert_eq!(store.get("glm").unwrap(), updated);
    }

    #[test]
    fn list_is_lexical() {
        let tmp = TestTempDir::new("store-list");
        let store = store(&tmp);
        for name in ["minimax", "anthropic", "glm"] {
            store
                .upsert(Profile::new(name, "https://x.test", "k"))
                .unwrap();
        }
        assert_eq!(store.list().unwrap(), vec!["anthropic", "glm", "minimax"]);
    }

    #[test]
    fn invalid_profiles_are_rejected_before_any_write() {
        let tmp = TestTempDir::new("store-invalid");
        let store = store(&tmp);
        let err = store
            .upsert(Profile::new("bad", "", "k"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(!store.path().exists());
    }

    #[test]
    fn credentials_are_not_written_in_plaintext() {
        let tmp = TestTempDir::new("store-sealed");
        let store = store(&tmp);
        store
            .upsert(Profile::new("glm", "https://x.test", "sk-very-secret-token"))
            .unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(!text.contains("sk-very-secret-token"));
        assert!(text.contains("\"version\": 2"));
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TestTempDir::new("store-perms");
        let store = store(&tmp);
        store.upsert(glm()).unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn version_one_plaintext_files_are_readable_and_upgraded_on_write() {
        let tmp = TestTempDir::new("store-v1");
        tmp.write_text(
            "profiles.json",
            r#"{"version":1,"profiles":{"glm":{"base_url":"https://api.z.ai/api/anthropic","credential":"k1","model_map":{"fast":"glm-4-flash"}}}}"#,
        );
        let store = store(&tmp);
        assert_eq!(store.get("glm").unwrap(), glm());

        store
            .upsert(Profile::new("kimi", "https://api.moonshot.ai/anthropic", "k2"))
            .unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(!text.contains("\"k1\""));
        assert_eq!(store.get("glm").unwrap(), glm());
    }

    #[test]
    fn newer_format_versions_are_refused() {
        let tmp = TestTempDir::new("store-future");
        tmp.write_text("profiles.json", r#"{"version":9,"profiles":{}}"#);
        let err = store(&tmp).list().unwrap_err();
        assert!(err.to_string().contains("format version 9"), "{err}");
    }

    #[test]
    fn unknown_logical_model_in_file_is_corrupt() {
        let tmp = TestTempDir::new("store-unknown-slot");
        tmp.write_text(
            "profiles.json",
            r#"{"version":1,"profiles":{"glm":{"base_url":"https://x.test","credential":"k","model_map":{"reasoning":"m"}}}}"#,
        );
        assert!(matches!(store(&tmp).list(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn remove_refuses_the_active_profile() {
        let tmp = TestTempDir::new("store-remove");
        let store = store(&tmp);
        store.upsert(glm()).unwrap();
        assert!(matches!(
            store.remove("glm", Some("glm")),
            Err(StoreError::InUse(_))
        ));
        store.remove("glm", Some("kimi")).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.remove("glm", None),
            Err(StoreError::NotFound(_))
        ));
    }
}
