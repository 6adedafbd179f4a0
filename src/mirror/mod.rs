//! The assistant's live configuration file and the fields the engine owns in it.
//!
//! Storage sits behind [`MirrorStore`] so the engine only sees raw bytes;
//! [`settings`] knows the JSON layout.

pub mod settings;
pub mod state;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::MirrorError;
use crate::fsutil::{read_optional, remove_if_exists, write_atomic};

pub use settings::{materialize, MaterializedFields};
pub use state::{ActiveState, StateStore};

/// Byte-level access to the live configuration.
pub trait MirrorStore: Send + Sync {
    /// Path shown to users and recorded in snapshots.
    fn location(&self) -> &Path;

    /// Current content, `None` when the file does not exist.
    fn read_raw(&self) -> Result<Option<Vec<u8>>, MirrorError>;

    /// Atomically replace the content.
    fn write_raw(&self, bytes: &[u8]) -> Result<(), MirrorError>;

    /// Remove the file entirely.
    fn remove(&self) -> Result<(), MirrorError>;
}

/// `~/.claude/settings.json` (or the configured override).
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File that writes land in. A symlinked settings file (dotfile
    /// managers) is followed so the link itself stays in place.
    fn write_target(&self) -> io::Result<PathBuf> {
        match fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.file_type().is_symlink() => match fs::canonicalize(&self.path) {
                Ok(target) => Ok(target),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    // Dangling link: create the file it points at.
                    let link = fs::read_link(&self.path)?;
                    Ok(match self.path.parent() {
                        Some(parent) => parent.join(link),
                        None => link,
                    })
                }
                Err(err) => Err(err),
            },
            _ => Ok(self.path.clone()),
        }
    }
}

impl MirrorStore for SettingsFile {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Option<Vec<u8>>, MirrorError> {
        Ok(read_optional(&self.path)?)
    }

    fn write_raw(&self, bytes: &[u8]) -> Result<(), MirrorError> {
        write_atomic(&self.write_target()?, bytes)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), MirrorError> {
        remove_if_exists(&self.write_target()?)?;
        Ok(())
    }
}
