//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Every variant maps to exit code 1 at the top level.

use thiserror::Error;

// ── Environment errors ────────────────────────────────────────────────────────

/// The execution context is unusable; the operator must fix the host.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("No bash interpreter found in trusted locations: {searched}")]
    InterpreterMissing { searched: String },

    #[error("bash {version} at {path} is too old: version 4 or newer is required")]
    InterpreterTooOld { path: String, version: String },

    #[error("Could not determine the version of {path}: {reason}")]
    InterpreterProbeFailed { path: String, reason: String },

    #[error("git is required to fetch the installer but was not found: {reason}")]
    GitMissing { reason: String },

    #[error("{var} points to '{path}', which does not exist or is not a directory")]
    ScratchMissing { var: String, path: String },

    #[error("{var} points to '{path}', which is not writable")]
    ScratchNotWritable { var: String, path: String },

    #[error("Fallback scratch location '{0}' is unavailable or not writable")]
    FallbackUnavailable(String),

    #[error("Secure workspace allocation failed: {0}")]
    WorkspaceAllocation(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// The compiled-in configuration is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid source locator '{0}': must be https://github.com/<org>/<repo>")]
    InvalidLocator(String),

    #[error("Source locator '{locator}' contains forbidden character '{ch}'")]
    LocatorMetachar { locator: String, ch: char },

    #[error("Invalid installer filename '{0}': path separators and '..' are not allowed")]
    InvalidFilename(String),

    #[error("Invalid reference digest '{0}': expected 64 lowercase hex characters")]
    InvalidReferenceDigest(String),
}

// ── Fetch errors ──────────────────────────────────────────────────────────────

/// Retrieval of the remote content failed or its origin is wrong.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch {locator}: {reason}")]
    CloneFailed { locator: String, reason: String },

    #[error("Fetching {locator} timed out after {seconds}s")]
    TimedOut { locator: String, seconds: u64 },

    #[error("Fetched content is not a valid git repository")]
    NotARepository,

    #[error("Could not read the origin of the fetched repository")]
    OriginUnreadable,

    #[error("Fetched repository reports an origin containing forbidden character '{ch}'")]
    OriginUnsafe { ch: char },

    #[error("Repository origin mismatch (expected {expected}, actual {actual})")]
    OriginMismatch { expected: String, actual: String },
}

// ── Integrity errors ──────────────────────────────────────────────────────────

/// An installer-candidate invariant was violated; the file is never executed.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("Installer '{filename}' not found in fetched content (found: {siblings})")]
    NotFound { filename: String, siblings: String },

    #[error("Installer '{0}' is not readable")]
    Unreadable(String),

    #[error("Installer '{0}' is a symbolic link")]
    Symlink(String),

    #[error("Installer '{0}' is not a regular file")]
    NotRegularFile(String),

    #[error("Installer size {size} bytes is outside the allowed range [{min}, {max}]")]
    SizeOutOfRange { size: u64, min: u64, max: u64 },

    #[error("Installer is missing a shebang ('#!') on its first line")]
    MissingShebang,

    #[error("Installer permissions {mode} allow group or world write")]
    UnsafePermissions { mode: String },

    #[error("Computed digest '{0}' is not a valid SHA-256 hex digest")]
    MalformedDigest(String),

    #[error("Installer digest mismatch, possible tampering (expected {expected}, actual {actual})")]
    TamperDetected { expected: String, actual: String },
}

// ── Execution errors ──────────────────────────────────────────────────────────

/// The execution gate refused to run the trusted installer.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Installer '{0}' disappeared after verification")]
    Vanished(String),

    #[error("Installer '{0}' was replaced by a symbolic link after verification")]
    SymlinkSwapped(String),

    #[error("Installer '{0}' was replaced by a non-regular file after verification")]
    Replaced(String),

    #[error("Installer path '{0}' contains whitespace")]
    WhitespaceInPath(String),

    #[error("Security check failed: '{path}' is outside the workspace '{workspace}'")]
    OutsideWorkspace { path: String, workspace: String },

    #[error("Path '{0}' is not valid UTF-8")]
    NonUtf8Path(String),
}
