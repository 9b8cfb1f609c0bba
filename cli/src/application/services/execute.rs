//! Application service: execution gate.
//!
//! Re-checks the trusted installer immediately before use (TOCTOU), confirms
//! its physical path is still inside the workspace, and runs it with the
//! explicit interpreter, forwarding the caller's arguments untouched.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, Environment, InstallerFs};
use crate::application::services::path_str;
use crate::domain::error::ExecutionError;
use crate::domain::installer::{EntryKind, TrustedInstaller};

/// Re-validate `installer` and return its canonical path.
///
/// # Errors
///
/// Returns an [`ExecutionError`] if the file vanished, became a symlink or
/// other non-regular entry, has whitespace in its path, or resolves outside
/// `workspace`.
pub fn gate(
    fs: &impl InstallerFs,
    installer: &TrustedInstaller,
    workspace: &Path,
) -> Result<PathBuf> {
    let path = installer.path();
    let shown = path.display().to_string();

    match fs.kind(path)? {
        EntryKind::Regular => {}
        EntryKind::Missing => return Err(ExecutionError::Vanished(shown).into()),
        EntryKind::Symlink => return Err(ExecutionError::SymlinkSwapped(shown).into()),
        EntryKind::Directory | EntryKind::Other => {
            return Err(ExecutionError::Replaced(shown).into());
        }
    }

    if shown.chars().any(char::is_whitespace) {
        return Err(ExecutionError::WhitespaceInPath(shown).into());
    }

    let canonical = fs.canonicalize(path)?;
    let root = fs.canonicalize(workspace)?;
    if canonical == root || !canonical.starts_with(&root) {
        return Err(ExecutionError::OutsideWorkspace {
            path: canonical.display().to_string(),
            workspace: root.display().to_string(),
        }
        .into());
    }
    Ok(canonical)
}

/// Pass the gate, then run `<interpreter> <installer> <args...>`.
///
/// Returns the installer's exit code unchanged; a signal-terminated child is
/// reported as `128 + signal`.
///
/// # Errors
///
/// Returns a gate error, or an error if the interpreter cannot be spawned.
pub async fn run_installer(
    runner: &impl CommandRunner,
    fs: &impl InstallerFs,
    env: &Environment,
    installer: &TrustedInstaller,
    workspace: &Path,
    args: &[String],
) -> Result<i32> {
    let canonical = gate(fs, installer, workspace)?;
    let interpreter = path_str(&env.interpreter)?;
    let target = path_str(&canonical)?;

    let mut argv: Vec<&str> = Vec::with_capacity(args.len() + 1);
    argv.push(target);
    argv.extend(args.iter().map(String::as_str));

    tracing::debug!(interpreter, installer = target, ?args, "running installer");
    let status = runner
        .run_status(interpreter, &argv)
        .await
        .context("running installer")?;
    Ok(exit_code(status))
}

/// Map an exit status to a process exit code.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
