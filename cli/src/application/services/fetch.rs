//! Application service: shallow retrieval of the installer repository and
//! confirmation of its declared origin.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, CommandTimedOut};
use crate::application::services::path_str;
use crate::domain::error::FetchError;
use crate::domain::locator::{SourceLocator, find_metachar};

/// Clone `locator` with minimal history into the (empty) `workspace`.
///
/// The locator has already passed [`SourceLocator::parse`], and the `--`
/// separator keeps it from ever being read as an option. No retry.
///
/// # Errors
///
/// Returns [`FetchError::TimedOut`] or [`FetchError::CloneFailed`].
pub async fn fetch_source(
    runner: &impl CommandRunner,
    locator: &SourceLocator,
    workspace: &Path,
    timeout: Duration,
) -> Result<()> {
    let dest = path_str(workspace)?;
    tracing::debug!(%locator, dest, "cloning installer repository");

    let result = runner
        .run_with_timeout(
            "git",
            &[
                "clone",
                "--depth",
                "1",
                "--single-branch",
                "--no-tags",
                "--quiet",
                "--",
                locator.as_str(),
                dest,
            ],
            timeout,
        )
        .await;

    let output = match result {
        Ok(output) => output,
        Err(e) if e.downcast_ref::<CommandTimedOut>().is_some() => {
            return Err(FetchError::TimedOut {
                locator: locator.to_string(),
                seconds: timeout.as_secs(),
            }
            .into());
        }
        Err(e) => {
            return Err(FetchError::CloneFailed {
                locator: locator.to_string(),
                reason: format!("{e:#}"),
            }
            .into());
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map_or_else(|| format!("git exited with {}", output.status), |l| l.trim().to_string());
        return Err(FetchError::CloneFailed {
            locator: locator.to_string(),
            reason,
        }
        .into());
    }
    Ok(())
}

/// Confirm `workspace` holds a repository whose origin is exactly `locator`.
///
/// # Errors
///
/// - [`FetchError::NotARepository`] if `workspace` is not itself a work tree root.
/// - [`FetchError::OriginUnreadable`] if the origin cannot be read or is empty.
/// - [`FetchError::OriginUnsafe`] if the reported origin contains a metacharacter.
/// - [`FetchError::OriginMismatch`] naming both values otherwise.
pub async fn verify_origin(
    runner: &impl CommandRunner,
    locator: &SourceLocator,
    workspace: &Path,
) -> Result<()> {
    let dir = path_str(workspace)?;

    // A repository in a parent of the scratch dir would also answer; insist
    // the git dir is the workspace's own.
    let git_dir = runner
        .run("git", &["-C", dir, "rev-parse", "--git-dir"])
        .await
        .map_err(|_| FetchError::NotARepository)?;
    if !git_dir.status.success() || String::from_utf8_lossy(&git_dir.stdout).trim() != ".git" {
        return Err(FetchError::NotARepository.into());
    }

    let origin = runner
        .run("git", &["-C", dir, "config", "--get", "remote.origin.url"])
        .await
        .map_err(|_| FetchError::OriginUnreadable)?;
    if !origin.status.success() {
        return Err(FetchError::OriginUnreadable.into());
    }
    let actual = String::from_utf8_lossy(&origin.stdout).trim().to_string();
    if actual.is_empty() {
        return Err(FetchError::OriginUnreadable.into());
    }
    if let Some(ch) = find_metachar(&actual) {
        return Err(FetchError::OriginUnsafe { ch }.into());
    }
    if actual != locator.as_str() {
        return Err(FetchError::OriginMismatch {
            expected: locator.to_string(),
            actual,
        }
        .into());
    }

    tracing::debug!(origin = %actual, "repository origin confirmed");
    Ok(())
}
