//! The bootstrap command: validate, guard, allocate, run the pipeline, clean up.

use anyhow::Result;

use crate::application::ports::{
    CommandRunner, EnvironmentGuard, InstallerFs, ProgressReporter,
};
use crate::application::services::pipeline::{self, Invocation};
use crate::domain::config::BootstrapConfig;
use crate::infra::workspace::SecureWorkspace;

/// Run the full bootstrap and return the exit code to surface.
///
/// The configuration is validated before anything else, so an invalid
/// locator or filename never reaches a subprocess or the filesystem. The
/// workspace is destroyed on every return path; if this future is dropped
/// (interruption) the workspace's `Drop` does the same.
///
/// # Errors
///
/// Returns the first configuration, environment, fetch, integrity or
/// execution failure.
pub async fn run(
    config: &BootstrapConfig,
    guard: &impl EnvironmentGuard,
    runner: &impl CommandRunner,
    fs: &impl InstallerFs,
    reporter: &impl ProgressReporter,
    invocation: &Invocation<'_>,
) -> Result<i32> {
    let config = config.validate()?;
    let env = guard.prepare().await?;

    let workspace = SecureWorkspace::allocate(&env.scratch_dir)?;
    let outcome = pipeline::run(
        &config,
        &env,
        workspace.path(),
        runner,
        fs,
        reporter,
        invocation,
    )
    .await;
    workspace.finish(outcome)
}
