//! Exclusive switch lock held across snapshot, write, and commit.
//!
//! Two layers: an in-process mutex so concurrent tasks in one process see
//! `Busy` without touching the filesystem, and an advisory file lock on
//! `<data_dir>/switch.lock` for other processes. Both are try-acquired.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::LockError;

#[derive(Debug, Clone)]
pub struct SwitchLock {
    local: Arc<Mutex<()>>,
    path: PathBuf,
}

/// Held lock. Both layers are released on drop.
#[derive(Debug)]
pub struct SwitchGuard {
    file: File,
    _local: OwnedMutexGuard<()>,
}

impl SwitchLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            local: Arc::new(Mutex::new(())),
            path: path.into(),
        }
    }

    /// Acquire without waiting; `Busy` when another switch holds it.
    pub fn try_acquire(&self) -> Result<SwitchGuard, LockError> {
        let local = Arc::clone(&self.local)
            .try_lock_owned()
            .map_err(|_| LockError::Busy)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)?;
        if let Err(err) = file.try_lock_exclusive() {
            if err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
                || err.kind() == std::io::ErrorKind::WouldBlock
            {
                return Err(LockError::Busy);
            }
            return Err(LockError::Io(err));
        }
        debug!(lock = %self.path.display(), "switch lock acquired");
        Ok(SwitchGuard {
            file,
            _local: local,
        })
    }
}

impl Drop for SwitchGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
