//! Byte-exact snapshots of the live configuration, one JSON file each under
//! `<data_dir>/backups/`.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::error::MirrorError;
use crate::fsutil::{now_unix_millis, remove_if_exists, write_atomic};
use crate::mirror::{ActiveState, MirrorStore};

const SNAPSHOT_FILE_EXT: &str = "json";
const SNAPSHOT_VERSION: u32 = 1;

static NEXT_SNAPSHOT_SEQ: AtomicU64 = AtomicU64::new(0);

/// One captured Mirror state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub taken_at_millis: u64,
    /// Profile that was active when the snapshot was taken.
    pub active_profile: Option<String>,
    /// Settings variables the engine owned at capture time.
    pub managed_keys: Vec<String>,
    /// Verbatim Mirror bytes; `None` when the file did not exist.
    pub content: Option<Vec<u8>>,
    /// Where the snapshot itself is stored.
    pub path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSnapshot {
    version: u32,
    taken_at_millis: u64,
    #[serde(default)]
    active_profile: Option<String>,
    #[serde(default)]
    managed_keys: Vec<String>,
    mirror_path: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
    keep: usize,
}

impl BackupStore {
    /// `keep` is clamped to at least one.
    pub fn new(dir: impl Into<PathBuf>, keep: usize) -> Self {
        Self {
            dir: dir.into(),
            keep: keep.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Capture the Mirror verbatim and persist the snapshot before returning.
    pub fn snapshot(
        &self,
        mirror: &dyn MirrorStore,
        state: &ActiveState,
    ) -> Result<Snapshot, MirrorError> {
        let content = mirror.read_raw()?;
        let taken_at_millis = now_unix_millis();
        let seq = NEXT_SNAPSHOT_SEQ.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!(
            "{taken_at_millis:013}-{}-{seq:06}.{SNAPSHOT_FILE_EXT}",
            std::process::id()
        ));

        let persisted = PersistedSnapshot {
            version: SNAPSHOT_VERSION,
            taken_at_millis,
            active_profile: state.active_profile.clone(),
            managed_keys: state.managed_keys.clone(),
            mirror_path: mirror.location().display().to_string(),
            content: content.as_ref().map(|bytes| B64.encode(bytes)),
        };
        let text = serde_json::to_vec_pretty(&persisted)
            .map_err(|err| MirrorError::Malformed(format!("failed to serialize snapshot: {err}")))?;
        // Snapshots hold the previous credential.
        write_atomic(&path, &text)?;
        debug!(snapshot = %path.display(), "mirror snapshot taken");

        Ok(Snapshot {
            taken_at_millis,
            active_profile: state.active_profile.clone(),
            managed_keys: state.managed_keys.clone(),
            content,
            path,
        })
    }

    /// Put the Mirror back exactly as captured.
    pub fn restore(&self, mirror: &dyn MirrorStore, snapshot: &Snapshot) -> Result<(), MirrorError> {
        match &snapshot.content {
            Some(bytes) => mirror.write_raw(bytes),
            None => mirror.remove(),
        }
    }

    /// Retained snapshots, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<Snapshot>, MirrorError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if !is_snapshot_file(&path) {
                continue;
            }
            match read_snapshot(&path) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(err) => warn!(snapshot = %path.display(), "skipping unreadable snapshot: {err}"),
            }
        }

        snapshots.sort_by(|a, b| {
            b.taken_at_millis
                .cmp(&a.taken_at_millis)
                .then_with(|| b.path.cmp(&a.path))
        });
        Ok(snapshots)
    }

    pub fn latest(&self) -> Result<Option<Snapshot>, MirrorError> {
        Ok(self.list()?.into_iter().next())
    }

    /// Drop all but the newest `keep` snapshots. Returns how many were removed.
    pub fn prune(&self) -> Result<usize, MirrorError> {
        let snapshots = self.list()?;
        let mut removed = 0;
        for stale in snapshots.iter().skip(self.keep) {
            remove_if_exists(&stale.path)?;
            removed += 1;
        }
        if removed > 0 {
            debug!(removed, keep = self.keep, "pruned old snapshots");
        }
        Ok(removed)
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot, MirrorError> {
    let raw = fs::read(path)?;
    let persisted: PersistedSnapshot = serde_json::from_slice(&raw)
        .map_err(|err| MirrorError::Malformed(format!("invalid snapshot: {err}")))?;
    let content = persisted
        .content
        .map(|encoded| B64.decode(encoded))
        .transpose()
        .map_err(|err| MirrorError::Malformed(format!("invalid snapshot content: {err}")))?;
    Ok(Snapshot {
        taken_at_millis: persisted.taken_at_millis,
        active_profile: persisted.active_profile,
        managed_keys: persisted.managed_keys,
        content,
        path: path.to_path_buf(),
    })
}

fn is_snapshot_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(SNAPSHOT_FILE_EXT)
        && !path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'))
}
