//! Compile-time build metadata for `--version` output.

/// Semver package version from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// VCS commit hash captured at build time.
pub const GIT_COMMIT: &str = env!("CLAUDESWAP_BUILD_GIT_HASH");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: &str = env!("CLAUDESWAP_BUILD_TIMESTAMP");

/// Trailer appended to `claudeswap --help`.
pub const HELP_BUILD_METADATA: &str = concat!(
    "Build metadata:\n  commit: ",
    env!("CLAUDESWAP_BUILD_GIT_HASH"),
    "\n  built: ",
    env!("CLAUDESWAP_BUILD_TIMESTAMP")
);

/// Multi-line block printed after the binary name by `claudeswap --version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("CLAUDESWAP_BUILD_GIT_HASH"),
    "\nbuilt: ",
    env!("CLAUDESWAP_BUILD_TIMESTAMP")
);
