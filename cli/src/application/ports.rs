//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`: never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;

use crate::domain::EntryKind;

// ── Value Types ───────────────────────────────────────────────────────────────

/// A host that passed the environment guard.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Existing, writable directory the secure workspace is allocated under.
    pub scratch_dir: PathBuf,
    /// Absolute path of the interpreter the installer is run with.
    pub interpreter: PathBuf,
}

/// Raised by [`CommandRunner::run_with_timeout`] after the child was killed.
#[derive(Debug, Error)]
#[error("{program} timed out after {seconds}s")]
pub struct CommandTimedOut {
    pub program: String,
    pub seconds: u64,
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

// ── Environment Port ──────────────────────────────────────────────────────────

/// Validates the host before any network or destructive action.
#[allow(async_fn_in_trait)]
pub trait EnvironmentGuard {
    /// Check the interpreter, fetch tool and scratch space, restrict the
    /// file-creation mask, and describe the usable environment.
    async fn prepare(&self) -> Result<Environment>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Filesystem Ports ──────────────────────────────────────────────────────────

/// Platform-specific metadata queries. Never follows symlinks.
pub trait FileMetadata {
    /// Classify the entry at `path`; `Missing` when nothing is there.
    fn kind(&self, path: &Path) -> Result<EntryKind>;
    /// Size in bytes.
    fn size(&self, path: &Path) -> Result<u64>;
    /// Permission triple (`mode & 0o777`).
    fn permissions(&self, path: &Path) -> Result<u32>;
}

/// Content and directory reads used while verifying a candidate.
pub trait FileReader {
    /// `true` if the current process may read `path`. Must not open it.
    fn is_readable(&self, path: &Path) -> bool;
    /// First line of the file, without the trailing newline.
    fn first_line(&self, path: &Path) -> Result<String>;
    /// Names of the non-symlink entries directly under `dir`, sorted.
    fn list_entries(&self, dir: &Path) -> Result<Vec<String>>;
}

/// Abstracts file hashing operations.
pub trait FileHasher {
    /// Compute the SHA-256 hash of a file as lowercase hex.
    fn sha256_file(&self, path: &Path) -> Result<String>;
}

/// Physical (symlink-resolving) path resolution.
pub trait PathResolver {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
}

/// Permission changes on verified files.
pub trait PermissionWriter {
    fn set_mode(&self, path: &Path, mode: u32) -> Result<()>;
}

/// Composite trait: everything the verifier and execution gate need.
pub trait InstallerFs: FileMetadata + FileReader + FileHasher + PathResolver + PermissionWriter {}

/// Blanket implementation: any type implementing all sub-traits is an `InstallerFs`.
impl<T> InstallerFs for T where
    T: FileMetadata + FileReader + FileHasher + PathResolver + PermissionWriter
{
}
