//! Secure workspace: an owner-only scratch directory that is shredded and
//! removed on every exit path.
//!
//! The workspace is a scoped resource: [`SecureWorkspace::finish`] destroys
//! it on normal and error returns, and `Drop` covers everything else,
//! including a pipeline future dropped on SIGINT/SIGTERM.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use crate::domain::error::EnvironmentError;

/// Directory name prefix inside the scratch location.
pub const WORKSPACE_PREFIX: &str = "kiro-bootstrap.";

/// Overwrite patterns applied to every file before removal.
const SHRED_PASSES: [u8; 3] = [0x00, 0xFF, 0x00];

const WORKSPACE_MODE: u32 = 0o700;

/// Exclusively-owned scratch directory with mode `0700`.
pub struct SecureWorkspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl SecureWorkspace {
    /// Allocate a randomly named workspace under `scratch`.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::WorkspaceAllocation`] if the directory
    /// cannot be created, is not a directory afterwards, or its mode cannot
    /// be restricted to the owner.
    pub fn allocate(scratch: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .rand_bytes(16)
            .tempdir_in(scratch)
            .map_err(|e| {
                EnvironmentError::WorkspaceAllocation(format!("{}: {e}", scratch.display()))
            })?;
        let path = dir.path().to_path_buf();

        if path.as_os_str().is_empty() || !path.is_dir() {
            return Err(EnvironmentError::WorkspaceAllocation(format!(
                "'{}' is not a directory",
                path.display()
            ))
            .into());
        }
        restrict(&path)?;

        tracing::debug!(path = %path.display(), "secure workspace allocated");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.dir.is_none()
    }

    /// Shred the immediate files, then remove the tree. Idempotent and
    /// infallible: failures are logged and removal is still attempted.
    pub fn destroy(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        shred_immediate_files(dir.path());
        if let Err(e) = dir.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "workspace removal failed");
        } else {
            tracing::debug!(path = %self.path.display(), "secure workspace destroyed");
        }
    }

    /// Destroy the workspace and hand back `outcome` untouched, so the
    /// triggering result (and its exit code) wins over cleanup.
    pub fn finish<T>(mut self, outcome: T) -> T {
        self.destroy();
        outcome
    }
}

impl Drop for SecureWorkspace {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn restrict(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let fail = |reason: String| EnvironmentError::WorkspaceAllocation(reason);
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(WORKSPACE_MODE))
            .map_err(|e| fail(format!("chmod {}: {e}", path.display())))?;
        let mode = std::fs::metadata(path)
            .map_err(|e| fail(format!("stat {}: {e}", path.display())))?
            .permissions()
            .mode()
            & 0o777;
        if mode != WORKSPACE_MODE {
            return Err(fail(format!("{} has mode {mode:03o}", path.display())).into());
        }
    }
    Ok(())
}

fn shred_immediate_files(dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(meta) = std::fs::symlink_metadata(&path) else {
            continue;
        };
        if !meta.file_type().is_file() {
            continue;
        }
        if let Err(e) = overwrite(&path, meta.len()) {
            tracing::warn!(path = %path.display(), error = %e, "shred failed");
        }
    }
}

fn overwrite(path: &Path, len: u64) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(nix::libc::O_NOFOLLOW);
    }
    let mut file = options.open(path)?;
    let chunk_len = usize::try_from(len.min(65536)).unwrap_or(65536);
    for pattern in SHRED_PASSES {
        let chunk = vec![pattern; chunk_len];
        file.seek(SeekFrom::Start(0))?;
        let mut remaining = len;
        while remaining > 0 {
            let n = usize::try_from(remaining.min(chunk.len() as u64)).unwrap_or(chunk.len());
            file.write_all(&chunk[..n])?;
            remaining -= n as u64;
        }
        file.sync_data()?;
    }
    Ok(())
}
