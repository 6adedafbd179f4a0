//! Shared test fixtures for store, mirror and engine test modules.

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Notify;

use crate::error::MirrorError;
use crate::mirror::{MirrorStore, SettingsFile};
use crate::profile::{LogicalModel, Profile};
use crate::validator::{ValidationOutcome, Validator};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!(
            "claudeswap-{prefix}-{}-{millis}-{suffix}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// The Z.ai profile used across scenarios.
pub fn glm_profile() -> Profile {
    Profile::new("glm", "https://api.z.ai/api/anthropic", "k1")
        .with_model(LogicalModel::Fast, "glm-4-flash")
        .with_flag("API_TIMEOUT_MS", "3000000")
}

/// The official-API profile used across scenarios.
pub fn anthropic_profile() -> Profile {
    Profile::new("anthropic", "https://api.anthropic.com", "k2")
}

/// Validator returning a fixed outcome, optionally parked until released.
#[derive(Debug)]
pub struct ScriptedValidator {
    outcome: Mutex<ValidationOutcome>,
    calls: AtomicUsize,
    gate: Option<Gate>,
}

#[derive(Debug, Clone)]
struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

/// Handle for a validator built with [`ScriptedValidator::gated`].
#[derive(Debug, Clone)]
pub struct GateHandle {
    gate: Gate,
}

impl GateHandle {
    /// Wait until a check is parked inside the validator.
    pub async fn entered(&self) {
        self.gate.entered.notified().await;
    }

    /// Let the parked check finish.
    pub fn release(&self) {
        self.gate.release.notify_one();
    }
}

impl ScriptedValidator {
    pub fn new(outcome: ValidationOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub fn reachable() -> Arc<Self> {
        Self::new(ValidationOutcome::Reachable)
    }

    /// A validator that parks every check until released.
    pub fn gated(outcome: ValidationOutcome) -> (Arc<Self>, GateHandle) {
        let gate = Gate {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        let validator = Arc::new(Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
            gate: Some(gate.clone()),
        });
        (validator, GateHandle { gate })
    }

    pub fn set_outcome(&self, outcome: ValidationOutcome) {
        *self.outcome.lock().expect("outcome lock") = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    async fn check(&self, _profile: &Profile) -> ValidationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.outcome.lock().expect("outcome lock").clone()
    }
}

/// File-backed mirror that fails a scripted number of upcoming writes.
#[derive(Debug)]
pub struct FaultyMirror {
    inner: SettingsFile,
    failing_writes: AtomicUsize,
    writes: AtomicUsize,
}

impl FaultyMirror {
    pub fn new(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            inner: SettingsFile::new(path),
            failing_writes: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        })
    }

    /// Fail the next `count` writes or removals.
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), MirrorError> {
        let pending = self.failing_writes.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_writes.store(pending - 1, Ordering::SeqCst);
            return Err(MirrorError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            )));
        }
        Ok(())
    }
}

impl MirrorStore for FaultyMirror {
    fn location(&self) -> &Path {
        self.inner.location()
    }

    fn read_raw(&self) -> Result<Option<Vec<u8>>, MirrorError> {
        self.inner.read_raw()
    }

    fn write_raw(&self, bytes: &[u8]) -> Result<(), MirrorError> {
        self.take_failure()?;
        self.inner.write_raw(bytes)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self) -> Result<(), MirrorError> {
        self.take_failure()?;
        self.inner.remove()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
        assert!(fixture.path().exists());
    }

    #[test]
    fn faulty_mirror_fails_only_the_scripted_writes() {
        let fixture = TestTempDir::new("faulty");
        let mirror = FaultyMirror::new(fixture.child("settings.json"));
        mirror.fail_next_writes(1);
        assert!(mirror.write_raw(b"{}").is_err());
        mirror.write_raw(b"{}").unwrap();
        assert_eq!(mirror.writes(), 1);
    }

    #[tokio::test]
    async fn scripted_validator_counts_calls() {
        let validator = ScriptedValidator::new(ValidationOutcome::AuthRejected("invalid key".into()));
        let outcome = validator.check(&glm_profile()).await;
        assert_eq!(outcome, ValidationOutcome::AuthRejected("invalid key".into()));
        assert_eq!(validator.calls(), 1);
    }
}
