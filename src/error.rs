//! Unified error types for the switching engine.

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing `claudeswap.toml`.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Errors from the profile store.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying storage failure.
    Io(std::io::Error),
    /// Profile data rejected before it reached disk.
    Validation(String),
    /// No profile with this name.
    NotFound(String),
    /// The profile is currently active and cannot be removed.
    InUse(String),
    /// The on-disk store could not be decoded or sealed.
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Validation(msg) => write!(f, "invalid profile: {msg}"),
            Self::NotFound(name) => write!(f, "profile `{name}` not found"),
            Self::InUse(name) => write!(
                f,
                "profile `{name}` is active; switch to another profile (or `claudeswap reset`) before removing it"
            ),
            Self::Corrupt(msg) => write!(f, "profile store: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// MirrorError
// ---------------------------------------------------------------------------

/// Errors reading or writing the assistant's live settings file, the
/// engine state record, or snapshot files.
#[derive(Debug)]
pub enum MirrorError {
    Io(std::io::Error),
    /// File exists but does not have the expected shape.
    Malformed(String),
}

impl fmt::Display for MirrorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Malformed(msg) => write!(f, "malformed: {msg}"),
        }
    }
}

impl std::error::Error for MirrorError {}

impl From<std::io::Error> for MirrorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// LockError
// ---------------------------------------------------------------------------

/// Errors acquiring the switch lock.
#[derive(Debug)]
pub enum LockError {
    /// Another switch holds the lock.
    Busy,
    Io(std::io::Error),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "another switch is in progress; retry shortly"),
            Self::Io(e) => write!(f, "lock io: {e}"),
        }
    }
}

impl std::error::Error for LockError {}

impl From<std::io::Error> for LockError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let s = ConfigError::from(io_err).to_string();
        assert!(s.starts_with("io:"), "got: {s}");
        assert!(s.contains("file not found"));
    }

    #[test]
    fn config_error_from_toml() {
        let toml_err: toml::de::Error = toml::from_str::<toml::Value>("x = [unclosed").unwrap_err();
        assert!(ConfigError::from(toml_err).to_string().starts_with("toml:"));
    }

    #[test]
    fn store_error_messages_name_the_profile() {
        assert_eq!(
            StoreError::NotFound("glm".into()).to_string(),
            "profile `glm` not found"
        );
        assert!(StoreError::InUse("glm".into())
            .to_string()
            .contains("`glm` is active"));
        assert_eq!(
            StoreError::Validation("base_url must not be empty".into()).to_string(),
            "invalid profile: base_url must not be empty"
        );
    }

    #[test]
    fn lock_busy_is_retryable_message() {
        assert!(LockError::Busy.to_string().contains("retry"));
    }

    #[test]
    fn mirror_error_from_io() {
        let e = MirrorError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(e.to_string(), "io: denied");
    }
}
