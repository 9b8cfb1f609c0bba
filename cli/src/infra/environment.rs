//! Host environment guard: runs before any network or destructive action.
//!
//! Resolves the explicit interpreter from fixed absolute locations, checks it
//! supports associative arrays (bash ≥ 4), checks that git is available and
//! that the scratch location is usable, then restricts the process umask to
//! owner-only.

use std::path::{Path, PathBuf};

use anyhow::Result;
use nix::sys::stat::{Mode, umask};
use nix::unistd::{AccessFlags, access};

use crate::application::ports::{CommandRunner, Environment, EnvironmentGuard};
use crate::domain::error::EnvironmentError;
use crate::infra::config::{RuntimeOptions, SCRATCH_ENV_VAR};

/// Trusted interpreter locations, searched in order. `PATH` is never consulted.
pub const INTERPRETER_CANDIDATES: &[&str] = &[
    "/bin/bash",
    "/usr/bin/bash",
    "/usr/local/bin/bash",
    "/opt/homebrew/bin/bash",
];

/// System-wide scratch location used when no override is set.
pub const FALLBACK_SCRATCH: &str = "/tmp";

/// Oldest bash major version with associative arrays.
pub const MIN_BASH_MAJOR: u32 = 4;

/// Production `EnvironmentGuard`.
pub struct HostEnvironment<'a, R> {
    runner: &'a R,
    scratch_override: Option<PathBuf>,
    candidates: Vec<PathBuf>,
    fallback: PathBuf,
}

impl<'a, R: CommandRunner> HostEnvironment<'a, R> {
    #[must_use]
    pub fn new(runner: &'a R, options: &RuntimeOptions) -> Self {
        Self {
            runner,
            scratch_override: options.scratch_override.clone(),
            candidates: INTERPRETER_CANDIDATES.iter().map(PathBuf::from).collect(),
            fallback: PathBuf::from(FALLBACK_SCRATCH),
        }
    }

    /// Replace the interpreter search list (used in tests).
    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<PathBuf>) -> Self {
        self.candidates = candidates;
        self
    }

    async fn check_interpreter(&self) -> Result<PathBuf> {
        let Some(path) = self.candidates.iter().find(|p| p.is_file()) else {
            return Err(EnvironmentError::InterpreterMissing {
                searched: self
                    .candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }
            .into());
        };
        let shown = path.display().to_string();
        let probe_failed = |reason: String| EnvironmentError::InterpreterProbeFailed {
            path: shown.clone(),
            reason,
        };

        let output = self
            .runner
            .run(&shown, &["-c", "printf '%s' \"$BASH_VERSION\""])
            .await
            .map_err(|e| probe_failed(format!("{e:#}")))?;
        if !output.status.success() {
            return Err(probe_failed(format!("exited with {}", output.status)).into());
        }
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        match bash_major(&version) {
            Some(major) if major >= MIN_BASH_MAJOR => {
                tracing::debug!(interpreter = %shown, %version, "interpreter accepted");
                Ok(path.clone())
            }
            Some(_) => Err(EnvironmentError::InterpreterTooOld {
                path: shown.clone(),
                version,
            }
            .into()),
            None => Err(probe_failed(format!("unrecognised version '{version}'")).into()),
        }
    }

    async fn check_git(&self) -> Result<()> {
        let output = self
            .runner
            .run("git", &["--version"])
            .await
            .map_err(|e| EnvironmentError::GitMissing {
                reason: format!("{e:#}"),
            })?;
        if !output.status.success() {
            return Err(EnvironmentError::GitMissing {
                reason: format!("git --version exited with {}", output.status),
            }
            .into());
        }
        Ok(())
    }

    fn check_scratch(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.scratch_override {
            let shown = dir.display().to_string();
            if !dir.is_dir() {
                return Err(EnvironmentError::ScratchMissing {
                    var: SCRATCH_ENV_VAR.to_string(),
                    path: shown,
                }
                .into());
            }
            if !is_writable_dir(dir) {
                return Err(EnvironmentError::ScratchNotWritable {
                    var: SCRATCH_ENV_VAR.to_string(),
                    path: shown,
                }
                .into());
            }
            return Ok(dir.clone());
        }
        if !self.fallback.is_dir() || !is_writable_dir(&self.fallback) {
            return Err(
                EnvironmentError::FallbackUnavailable(self.fallback.display().to_string()).into(),
            );
        }
        Ok(self.fallback.clone())
    }
}

impl<R: CommandRunner> EnvironmentGuard for HostEnvironment<'_, R> {
    async fn prepare(&self) -> Result<Environment> {
        let scratch_dir = self.check_scratch()?;
        let interpreter = self.check_interpreter().await?;
        self.check_git().await?;
        restrict_umask();
        Ok(Environment {
            scratch_dir,
            interpreter,
        })
    }
}

/// Set the process umask to `077` (no group/other permissions on anything
/// created afterwards), returning the previous mask.
pub fn restrict_umask() -> Mode {
    umask(Mode::S_IRWXG | Mode::S_IRWXO)
}

fn is_writable_dir(path: &Path) -> bool {
    access(path, AccessFlags::W_OK | AccessFlags::X_OK).is_ok()
}

/// Major version from a `$BASH_VERSION` string such as `5.2.15(1)-release`.
#[must_use]
pub fn bash_major(version: &str) -> Option<u32> {
    version.split('.').next()?.trim().parse().ok()
}
