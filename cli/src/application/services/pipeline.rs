//! Application service: the bootstrap pipeline.
//!
//! fetch → origin check → installer verification → execution gate, strictly
//! in that order. Any failure aborts; the caller owns the workspace and its
//! cleanup.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{CommandRunner, Environment, InstallerFs, ProgressReporter};
use crate::application::services::{execute, fetch, verify};
use crate::domain::args::needs_privilege_notice;
use crate::domain::config::ValidatedConfig;
use crate::domain::installer::{DigestCheck, format_mode};

/// How the bootstrap was invoked.
pub struct Invocation<'a> {
    /// Arguments forwarded verbatim to the installer.
    pub args: &'a [String],
    /// Whether standard input is a terminal (false for `curl | bash` style runs).
    pub stdin_is_tty: bool,
}

/// Run every stage against an already-allocated `workspace`.
///
/// Returns the installer's exit code.
///
/// # Errors
///
/// Returns the first stage failure (`FetchError`, `IntegrityError`,
/// `ExecutionError`, or an I/O error).
pub async fn run(
    config: &ValidatedConfig,
    env: &Environment,
    workspace: &Path,
    runner: &impl CommandRunner,
    fs: &impl InstallerFs,
    reporter: &impl ProgressReporter,
    invocation: &Invocation<'_>,
) -> Result<i32> {
    reporter.step(&format!("Fetching installer from {}", config.locator));
    fetch::fetch_source(runner, &config.locator, workspace, config.fetch_timeout).await?;
    fetch::verify_origin(runner, &config.locator, workspace).await?;
    reporter.success(&format!("Fetched {}", config.locator));

    reporter.step(&format!("Verifying {}", config.installer_filename));
    let trusted = verify::verify_installer(
        fs,
        workspace,
        &config.installer_filename,
        config.reference_digest.as_deref(),
    )?;
    if trusted.digest_check() == DigestCheck::Skipped {
        reporter.warn("No reference digest configured: content hash not pinned");
    }
    reporter.success(&format!(
        "Verified {} ({} bytes, mode {}, sha256 {})",
        config.installer_filename,
        trusted.size(),
        format_mode(trusted.mode()),
        trusted.sha256()
    ));

    if needs_privilege_notice(invocation.args, invocation.stdin_is_tty) {
        reporter.warn(
            "Running non-interactively without --user: the installer will need root privileges",
        );
    }

    execute::run_installer(runner, fs, env, &trusted, workspace, invocation.args).await
}
