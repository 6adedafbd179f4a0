//! The switch engine: the only code path that mutates the live configuration.
//!
//! A switch runs `lookup -> lock -> no-op check -> snapshot -> validate ->
//! write -> commit state -> prune`. Validation is the only await point, so a
//! dropped future releases the lock with nothing written. Everything after
//! validation is synchronous and either commits or restores the snapshot.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::backup::{BackupStore, Snapshot};
use crate::config::Config;
use crate::error::{LockError, MirrorError, StoreError};
use crate::fsutil::{now_unix_millis, remove_if_exists};
use crate::lock::SwitchLock;
use crate::mirror::settings::{self, MaterializedFields, RenderedSettings};
use crate::mirror::{materialize, ActiveState, MirrorStore, SettingsFile, StateStore};
use crate::profile::{Profile, ProfileStore};
use crate::validator::{HttpValidator, SkipValidator, ValidationOutcome, Validator};

/// Why a switch (or another engine operation) did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchFailure {
    NotFound(String),
    Validation(String),
    InUse(String),
    Unreachable(String),
    AuthRejected(String),
    Io(String),
    /// The write failed and putting the snapshot back failed too.
    RollbackFailed {
        cause: String,
        restore_error: String,
        snapshot: PathBuf,
    },
    Busy,
    NothingToRollBack,
}

impl SwitchFailure {
    /// Process exit code reported by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => 2,
            Self::Unreachable(_) | Self::AuthRejected(_) => 3,
            Self::Io(_) | Self::RollbackFailed { .. } => 4,
            Self::Busy => 5,
            Self::Validation(_) | Self::InUse(_) | Self::NothingToRollBack => 1,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RollbackFailed { .. })
    }
}

impl fmt::Display for SwitchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "profile `{name}` not found"),
            Self::Validation(msg) => write!(f, "invalid profile: {msg}"),
            Self::InUse(name) => write!(
                f,
                "profile `{name}` is active; switch to another profile or run `claudeswap reset` first"
            ),
            Self::Unreachable(reason) => write!(f, "provider unreachable: {reason}"),
            Self::AuthRejected(reason) => write!(f, "credential rejected: {reason}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::RollbackFailed {
                cause,
                restore_error,
                snapshot,
            } => write!(
                f,
                "write failed ({cause}) and restoring the previous settings also failed ({restore_error}); restore manually from {}",
                snapshot.display()
            ),
            Self::Busy => write!(f, "another switch is in progress; retry shortly"),
            Self::NothingToRollBack => write!(f, "no snapshot available to roll back to"),
        }
    }
}

impl std::error::Error for SwitchFailure {}

impl From<StoreError> for SwitchFailure {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(name) => Self::NotFound(name),
            StoreError::Validation(msg) => Self::Validation(msg),
            StoreError::InUse(name) => Self::InUse(name),
            StoreError::Io(err) => Self::Io(err.to_string()),
            StoreError::Corrupt(msg) => Self::Io(msg),
        }
    }
}

impl From<MirrorError> for SwitchFailure {
    fn from(value: MirrorError) -> Self {
        match value {
            MirrorError::Io(err) => Self::Io(err.to_string()),
            MirrorError::Malformed(msg) => Self::Io(msg),
        }
    }
}

impl From<LockError> for SwitchFailure {
    fn from(value: LockError) -> Self {
        match value {
            LockError::Busy => Self::Busy,
            LockError::Io(err) => Self::Io(format!("switch lock: {err}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Committed,
    NoOp,
    /// Nothing changed: the request failed before or during the write.
    RolledBack,
}

/// Report of one engine mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchResult {
    pub success: bool,
    pub outcome: SwitchOutcome,
    pub previous_profile: Option<String>,
    /// Profile active after the call (`None` for the pristine default).
    pub new_profile: Option<String>,
    pub cause: Option<SwitchFailure>,
    /// Snapshot taken for this switch, when one was retained.
    pub snapshot_path: Option<PathBuf>,
}

impl SwitchResult {
    fn committed(previous: Option<String>, new: Option<String>, snapshot: &Snapshot) -> Self {
        Self {
            success: true,
            outcome: SwitchOutcome::Committed,
            previous_profile: previous,
            new_profile: new,
            cause: None,
            snapshot_path: Some(snapshot.path.clone()),
        }
    }

    fn no_op(active: Option<String>) -> Self {
        Self {
            success: true,
            outcome: SwitchOutcome::NoOp,
            previous_profile: active.clone(),
            new_profile: active,
            cause: None,
            snapshot_path: None,
        }
    }

    fn failed(previous: Option<String>, cause: SwitchFailure, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            success: false,
            outcome: SwitchOutcome::RolledBack,
            previous_profile: previous.clone(),
            new_profile: previous,
            cause: Some(cause),
            snapshot_path,
        }
    }

    /// Exit code for the CLI: 0 on success, else the failure's code.
    pub fn exit_code(&self) -> i32 {
        self.cause.as_ref().map_or(0, SwitchFailure::exit_code)
    }
}

/// Read-only view used by `status` and the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub active_profile: Option<String>,
    pub last_switch_at_millis: Option<u64>,
    pub mirror_path: PathBuf,
    /// Managed fields currently in the Mirror, credential masked.
    pub fields: MaterializedFields,
    pub latest_snapshot: Option<PathBuf>,
    pub profile_count: usize,
}

/// Result of `rollback_latest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub previous_profile: Option<String>,
    pub restored_profile: Option<String>,
    pub snapshot_taken_at_millis: u64,
}

pub struct SwitchEngine {
    profiles: ProfileStore,
    mirror: Arc<dyn MirrorStore>,
    state: StateStore,
    backups: BackupStore,
    validator: Arc<dyn Validator>,
    lock: SwitchLock,
}

impl SwitchEngine {
    pub fn new(
        profiles: ProfileStore,
        mirror: Arc<dyn MirrorStore>,
        state: StateStore,
        backups: BackupStore,
        validator: Arc<dyn Validator>,
        lock: SwitchLock,
    ) -> Self {
        Self {
            profiles,
            mirror,
            state,
            backups,
            validator,
            lock,
        }
    }

    /// Wire the engine to the configured files. `skip_validate` forces the
    /// no-op validator regardless of config.
    pub fn from_config(config: &Config, skip_validate: bool) -> Self {
        let paths = &config.paths;
        let validator: Arc<dyn Validator> = if skip_validate || !config.validator.enabled {
            Arc::new(SkipValidator)
        } else {
            Arc::new(HttpValidator::new(config.validator.timeout()))
        };
        Self::new(
            ProfileStore::open(paths.profiles_file()),
            Arc::new(SettingsFile::new(paths.settings_file.clone())),
            StateStore::new(paths.state_file()),
            BackupStore::new(paths.backups_dir(), config.backup.keep),
            validator,
            SwitchLock::new(paths.lock_file()),
        )
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Make `target` the active profile.
    pub async fn switch_to(&self, target: &str) -> SwitchResult {
        self.run_switch(target, false).await
    }

    /// Re-materialize `target` even when it is already active, e.g. after
    /// its stored record was edited.
    pub async fn reapply(&self, target: &str) -> SwitchResult {
        self.run_switch(target, true).await
    }

    async fn run_switch(&self, target: &str, force: bool) -> SwitchResult {
        if let Err(err) = self.profiles.get(target) {
            return SwitchResult::failed(self.peek_active(), err.into(), None);
        }

        let _guard = match self.lock.try_acquire() {
            Ok(guard) => guard,
            Err(err) => return SwitchResult::failed(self.peek_active(), err.into(), None),
        };
        self.switch_locked(target, force).await
    }

    /// Body of a switch once the lock is held.
    async fn switch_locked(&self, target: &str, force: bool) -> SwitchResult {
        let state = match self.state.load() {
            Ok(state) => state,
            Err(err) => return SwitchResult::failed(None, err.into(), None),
        };
        let previous = state.active_profile.clone();
        // Re-read under the lock: another process may have removed or
        // edited the record since the first lookup.
        let profile = match self.profiles.get(target) {
            Ok(profile) => profile,
            Err(err) => return SwitchResult::failed(previous, err.into(), None),
        };
        if !force && previous.as_deref() == Some(target) {
            return SwitchResult::no_op(previous);
        }

        let snapshot = match self.backups.snapshot(self.mirror.as_ref(), &state) {
            Ok(snapshot) => snapshot,
            Err(err) => return SwitchResult::failed(previous, err.into(), None),
        };
        // Fails on a malformed settings file before any network traffic.
        let rendered = match settings::render(
            snapshot.content.as_deref(),
            &materialize(&profile),
            &state.managed_keys,
        ) {
            Ok(rendered) => rendered,
            Err(err) => return SwitchResult::failed(previous, err.into(), None),
        };

        if let Some(cause) = self.validate(&profile).await {
            warn!(profile = %target, %cause, "switch rejected by validator");
            return SwitchResult::failed(previous, cause, None);
        }

        match self.commit(rendered, Some(profile.name.clone()), &snapshot) {
            Ok(()) => {
                info!(from = ?previous, to = %profile.name, "switch committed");
                SwitchResult::committed(previous, Some(profile.name), &snapshot)
            }
            Err(cause) => SwitchResult::failed(previous, cause, Some(snapshot.path)),
        }
    }

    /// Remove every managed key and clear the active profile.
    pub fn reset_to_default(&self) -> SwitchResult {
        let _guard = match self.lock.try_acquire() {
            Ok(guard) => guard,
            Err(err) => return SwitchResult::failed(self.peek_active(), err.into(), None),
        };
        let state = match self.state.load() {
            Ok(state) => state,
            Err(err) => return SwitchResult::failed(None, err.into(), None),
        };
        let previous = state.active_profile.clone();

        let current_fields = self
            .mirror
            .read_raw()
            .and_then(|raw| settings::read_fields(raw.as_deref(), &state.managed_keys));
        match current_fields {
            Ok(fields) if fields.is_empty() && previous.is_none() => {
                return SwitchResult::no_op(None);
            }
            Ok(_) => {}
            Err(err) => return SwitchResult::failed(previous, err.into(), None),
        }

        let snapshot = match self.backups.snapshot(self.mirror.as_ref(), &state) {
            Ok(snapshot) => snapshot,
            Err(err) => return SwitchResult::failed(previous, err.into(), None),
        };
        let rendered = match settings::render(
            snapshot.content.as_deref(),
            &MaterializedFields::new(),
            &state.managed_keys,
        ) {
            Ok(rendered) => rendered,
            Err(err) => return SwitchResult::failed(previous, err.into(), None),
        };
        match self.commit(rendered, None, &snapshot) {
            Ok(()) => {
                info!(from = ?previous, "reset to default provider");
                SwitchResult::committed(previous, None, &snapshot)
            }
            Err(cause) => SwitchResult::failed(previous, cause, Some(snapshot.path)),
        }
    }

    /// Current state without taking the lock.
    pub fn status(&self) -> Result<StatusReport, SwitchFailure> {
        let state = self.state.load()?;
        let raw = self.mirror.read_raw()?;
        let fields = settings::read_fields(raw.as_deref(), &state.managed_keys)?;
        let latest_snapshot = self.backups.latest()?.map(|snapshot| snapshot.path);
        let profile_count = self.profiles.list()?.len();
        Ok(StatusReport {
            active_profile: state.active_profile,
            last_switch_at_millis: state.last_switch_at_millis,
            mirror_path: self.mirror.location().to_path_buf(),
            fields: settings::masked(&fields),
            latest_snapshot,
            profile_count,
        })
    }

    /// Put the newest snapshot back and consume it.
    pub fn rollback_latest(&self) -> Result<RollbackReport, SwitchFailure> {
        let _guard = self.lock.try_acquire()?;
        let state = self.state.load()?;
        let snapshot = self
            .backups
            .latest()?
            .ok_or(SwitchFailure::NothingToRollBack)?;

        let before = match self.backups.snapshot(self.mirror.as_ref(), &state) {
            Ok(before) => before,
            Err(err) => return Err(err.into()),
        };
        if let Err(err) = self.backups.restore(self.mirror.as_ref(), &snapshot) {
            let cause = SwitchFailure::from(err).to_string();
            let failure = self.roll_back(&before, cause);
            discard_snapshot(&before);
            return Err(failure);
        }
        let restored = ActiveState::committed(
            snapshot.active_profile.clone(),
            now_unix_millis(),
            snapshot.managed_keys.clone(),
        );
        if let Err(err) = self.state.save(&restored) {
            let cause = SwitchFailure::from(err).to_string();
            let failure = self.roll_back(&before, cause);
            discard_snapshot(&before);
            return Err(failure);
        }
        discard_snapshot(&before);
        discard_snapshot(&snapshot);

        info!(
            from = ?state.active_profile,
            to = ?snapshot.active_profile,
            "rolled back to snapshot"
        );
        Ok(RollbackReport {
            previous_profile: state.active_profile,
            restored_profile: snapshot.active_profile,
            snapshot_taken_at_millis: snapshot.taken_at_millis,
        })
    }

    /// Delete a stored profile; refuses the active one.
    pub fn remove_profile(&self, name: &str) -> Result<(), SwitchFailure> {
        let _guard = self.lock.try_acquire()?;
        let state = self.state.load()?;
        self.profiles
            .remove(name, state.active_profile.as_deref())?;
        Ok(())
    }

    /// Probe a stored profile without changing anything.
    pub async fn validate_profile(&self, name: &str) -> Result<ValidationOutcome, SwitchFailure> {
        let profile = self.profiles.get(name)?;
        Ok(self.validator.check(&profile).await)
    }

    /// Active profile name as last committed, read without the lock.
    pub fn peek_active(&self) -> Option<String> {
        self.state.load().ok().and_then(|state| state.active_profile)
    }

    async fn validate(&self, profile: &Profile) -> Option<SwitchFailure> {
        match self.validator.check(profile).await {
            ValidationOutcome::Reachable => None,
            ValidationOutcome::Unreachable(reason) => Some(SwitchFailure::Unreachable(reason)),
            ValidationOutcome::AuthRejected(reason) => Some(SwitchFailure::AuthRejected(reason)),
        }
    }

    /// Write `rendered`, persist state, prune. Restores `snapshot` on failure.
    ///
    /// `rendered` must be derived from the snapshot's captured bytes.
    fn commit(
        &self,
        rendered: RenderedSettings,
        new_profile: Option<String>,
        snapshot: &Snapshot,
    ) -> Result<(), SwitchFailure> {
        if let Err(err) = self.mirror.write_raw(&rendered.bytes) {
            return Err(self.roll_back(snapshot, err.to_string()));
        }

        let next = ActiveState::committed(new_profile, now_unix_millis(), rendered.managed_keys);
        if let Err(err) = self.state.save(&next) {
            return Err(self.roll_back(snapshot, err.to_string()));
        }

        if let Err(err) = self.backups.prune() {
            warn!("failed to prune old snapshots: {err}");
        }
        Ok(())
    }

    fn roll_back(&self, snapshot: &Snapshot, cause: String) -> SwitchFailure {
        match self.backups.restore(self.mirror.as_ref(), snapshot) {
            Ok(()) => {
                warn!(%cause, "write failed; previous settings restored");
                SwitchFailure::Io(cause)
            }
            Err(restore_err) => {
                error!(
                    %cause,
                    restore_error = %restore_err,
                    snapshot = %snapshot.path.display(),
                    "rollback failed; settings may be inconsistent"
                );
                SwitchFailure::RollbackFailed {
                    cause,
                    restore_error: restore_err.to_string(),
                    snapshot: snapshot.path.clone(),
                }
            }
        }
    }
}

fn discard_snapshot(snapshot: &Snapshot) {
    if let Err(err) = remove_if_exists(&snapshot.path) {
        warn!(snapshot = %snapshot.path.display(), "failed to remove snapshot: {err}");
    }
}
