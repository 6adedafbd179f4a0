//! End-to-end switching through the public API against real files.

use async_trait::async_trait;
use claudeswap::backup::BackupStore;
use claudeswap::config::{BackupConfig, Config, DisplayConfig, PathsConfig, ValidatorConfig};
use claudeswap::lock::SwitchLock;
use claudeswap::mirror::{SettingsFile, StateStore};
use claudeswap::profile::{LogicalModel, Profile, ProfileStore};
use claudeswap::switch::{SwitchEngine, SwitchFailure, SwitchOutcome};
use claudeswap::validator::{SkipValidator, ValidationOutcome, Validator};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

struct Scratch {
    root: PathBuf,
}

impl Scratch {
    fn new(label: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "claudeswap-it-{label}-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).expect("create scratch dir");
        Self { root }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

struct RejectingValidator;

#[async_trait]
impl Validator for RejectingValidator {
    async fn check(&self, _profile: &Profile) -> ValidationOutcome {
        ValidationOutcome::AuthRejected("HTTP 401: invalid x-api-key".to_string())
    }
}

fn engine_in(scratch: &Scratch, validator: Arc<dyn Validator>) -> SwitchEngine {
    SwitchEngine::new(
        ProfileStore::open(scratch.path("data/profiles.json")).with_kdf_cost(4),
        Arc::new(SettingsFile::new(scratch.path("claude/settings.json"))),
        StateStore::new(scratch.path("data/state.json")),
        BackupStore::new(scratch.path("data/backups"), 5),
        validator,
        SwitchLock::new(scratch.path("data/switch.lock")),
    )
}

fn seed_profiles(store: &ProfileStore) {
    store
        .upsert(
            Profile::new("glm", "https://api.z.ai/api/anthropic", "glm-secret-key-0001")
                .with_model(LogicalModel::Fast, "glm-4-flash")
                .with_flag("API_TIMEOUT_MS", "3000000"),
        )
        .expect("upsert glm");
    store
        .upsert(Profile::new(
            "anthropic",
            "https://api.anthropic.com",
            "sk-ant-secret-0002",
        ))
        .expect("upsert anthropic");
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).expect("read settings")).expect("settings json")
}

#[tokio::test]
async fn switch_roll_back_and_reset_preserve_user_settings() {
    let scratch = Scratch::new("lifecycle");
    let settings = scratch.path("claude/settings.json");
    fs::create_dir_all(settings.parent().expect("parent")).expect("mkdir");
    fs::write(
        &settings,
        r#"{"model":"opus","env":{"HTTPS_PROXY":"http://proxy:3128"},"permissions":{"allow":["Bash"]}}"#,
    )
    .expect("seed settings");

    let engine = engine_in(&scratch, Arc::new(SkipValidator));
    seed_profiles(engine.profiles());

    let result = engine.switch_to("glm").await;
    assert_eq!(result.outcome, SwitchOutcome::Committed);
    let json = read_json(&settings);
    assert_eq!(json["env"]["ANTHROPIC_BASE_URL"], "https://api.z.ai/api/anthropic");
    assert_eq!(json["env"]["ANTHROPIC_AUTH_TOKEN"], "glm-secret-key-0001");
    assert_eq!(json["env"]["ANTHROPIC_SMALL_FAST_MODEL"], "glm-4-flash");
    assert_eq!(json["env"]["API_TIMEOUT_MS"], "3000000");
    assert_eq!(json["env"]["HTTPS_PROXY"], "http://proxy:3128");
    assert_eq!(json["permissions"]["allow"][0], "Bash");

    let result = engine.switch_to("anthropic").await;
    assert_eq!(result.previous_profile.as_deref(), Some("glm"));
    let json = read_json(&settings);
    assert_eq!(json["env"]["ANTHROPIC_BASE_URL"], "https://api.anthropic.com");
    assert!(json["env"].get("API_TIMEOUT_MS").is_none());
    assert!(json["env"].get("ANTHROPIC_SMALL_FAST_MODEL").is_none());
    assert_eq!(json["model"], "opus");

    let status = engine.status().expect("status");
    assert_eq!(status.active_profile.as_deref(), Some("anthropic"));
    assert_eq!(status.profile_count, 2);
    assert!(!status.fields["credential"].contains("secret"));

    let rolled = engine.rollback_latest().expect("rollback");
    assert_eq!(rolled.restored_profile.as_deref(), Some("glm"));
    assert_eq!(engine.peek_active().as_deref(), Some("glm"));
    assert_eq!(read_json(&settings)["env"]["API_TIMEOUT_MS"], "3000000");

    let result = engine.reset_to_default();
    assert_eq!(result.outcome, SwitchOutcome::Committed);
    assert_eq!(result.new_profile, None);
    let json = read_json(&settings);
    assert!(json["env"].get("ANTHROPIC_BASE_URL").is_none());
    assert!(json["env"].get("ANTHROPIC_AUTH_TOKEN").is_none());
    assert!(json["env"].get("API_TIMEOUT_MS").is_none());
    assert_eq!(json["env"]["HTTPS_PROXY"], "http://proxy:3128");
}

#[tokio::test]
async fn rejected_credentials_leave_settings_untouched() {
    let scratch = Scratch::new("rejected");
    let settings = scratch.path("claude/settings.json");
    let engine = engine_in(&scratch, Arc::new(SkipValidator));
    seed_profiles(engine.profiles());
    engine.switch_to("anthropic").await;
    let before = fs::read(&settings).expect("settings written");
    let backups_before = engine.backups().list().expect("list").len();

    let engine = engine.with_validator(Arc::new(RejectingValidator));
    let result = engine.switch_to("glm").await;
    assert!(!result.success);
    assert_eq!(result.outcome, SwitchOutcome::RolledBack);
    assert!(matches!(result.cause, Some(SwitchFailure::AuthRejected(_))));
    assert_eq!(result.exit_code(), 3);
    assert_eq!(fs::read(&settings).expect("settings"), before);
    assert_eq!(engine.peek_active().as_deref(), Some("anthropic"));
    assert_eq!(engine.backups().list().expect("list").len(), backups_before + 1);
}

#[tokio::test]
async fn unknown_profile_is_not_found_and_takes_no_snapshot() {
    let scratch = Scratch::new("missing");
    let engine = engine_in(&scratch, Arc::new(SkipValidator));
    let result = engine.switch_to("ghost").await;
    assert_eq!(result.cause, Some(SwitchFailure::NotFound("ghost".to_string())));
    assert_eq!(result.exit_code(), 2);
    assert!(engine.backups().list().expect("list").is_empty());
    assert!(!scratch.path("claude/settings.json").exists());
}

#[tokio::test]
async fn engine_from_config_honors_retention_and_disabled_validator() {
    let scratch = Scratch::new("from-config");
    let config = Config {
        paths: PathsConfig::new(scratch.path("claude/settings.json"), scratch.path("data")),
        validator: ValidatorConfig {
            enabled: false,
            timeout_secs: 1,
        },
        backup: BackupConfig { keep: 2 },
        display: DisplayConfig::default(),
    };
    // Seeded with a cheap KDF; reads follow the cost recorded in the file.
    seed_profiles(&ProfileStore::open(config.paths.profiles_file()).with_kdf_cost(4));
    let engine = SwitchEngine::from_config(&config, false);

    for target in ["glm", "anthropic", "glm", "anthropic"] {
        let result = engine.switch_to(target).await;
        assert_eq!(result.outcome, SwitchOutcome::Committed, "switch to {target}");
    }
    assert_eq!(engine.backups().list().expect("list").len(), 2);
    assert!(scratch.path("data/state.json").exists());
    assert!(scratch.path("data/profiles.json").exists());
}
