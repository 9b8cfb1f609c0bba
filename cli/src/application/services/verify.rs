//! Application service: installer verification.
//!
//! Advances a candidate through [`VerificationStage::ORDER`]; the first
//! failed check rejects it. Only a fully verified candidate becomes a
//! [`TrustedInstaller`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::InstallerFs;
use crate::domain::error::IntegrityError;
use crate::domain::installer::{
    DigestCheck, EXECUTABLE_MODE, EntryKind, TrustedInstaller, VerificationStage, check_digest,
    check_permissions, check_shebang, check_size, format_mode, is_executable, validate_filename,
};

/// Facts gathered about the candidate as it advances through the stages.
struct Candidate {
    path: PathBuf,
    shown: String,
    kind: EntryKind,
    size: u64,
    mode: u32,
    sha256: String,
    digest: DigestCheck,
}

/// Verify `workspace/filename` and return it as a trusted installer.
///
/// The filename is validated before the filesystem is touched. When the
/// candidate lacks execute permission it is set to `0755` as the very last
/// step, after every other check has passed.
///
/// # Errors
///
/// Returns a `ConfigError` for a bad filename, an [`IntegrityError`] for the
/// first violated invariant, or an I/O error from the filesystem port.
pub fn verify_installer(
    fs: &impl InstallerFs,
    workspace: &Path,
    filename: &str,
    reference_digest: Option<&str>,
) -> Result<TrustedInstaller> {
    validate_filename(filename)?;
    let path = workspace.join(filename);
    let mut candidate = Candidate {
        shown: path.display().to_string(),
        path,
        kind: EntryKind::Missing,
        size: 0,
        mode: 0,
        sha256: String::new(),
        digest: DigestCheck::Skipped,
    };

    for stage in VerificationStage::ORDER {
        advance(fs, stage, &mut candidate, workspace, filename, reference_digest)?;
        tracing::debug!(%stage, "installer check passed");
    }

    let Candidate {
        path,
        size,
        mode,
        sha256,
        digest,
        ..
    } = candidate;
    Ok(TrustedInstaller::new(path, size, mode, sha256, digest))
}

fn advance(
    fs: &impl InstallerFs,
    stage: VerificationStage,
    c: &mut Candidate,
    workspace: &Path,
    filename: &str,
    reference_digest: Option<&str>,
) -> Result<()> {
    match stage {
        VerificationStage::Located => {
            c.kind = fs.kind(&c.path)?;
            if c.kind == EntryKind::Missing {
                let siblings = fs
                    .list_entries(workspace)
                    .map(|names| names.join(", "))
                    .unwrap_or_default();
                return Err(IntegrityError::NotFound {
                    filename: filename.to_string(),
                    siblings,
                }
                .into());
            }
        }
        VerificationStage::Readable => {
            if !fs.is_readable(&c.path) {
                return Err(IntegrityError::Unreadable(c.shown.clone()).into());
            }
        }
        VerificationStage::NotSymlink => match c.kind {
            EntryKind::Regular => {}
            EntryKind::Symlink => return Err(IntegrityError::Symlink(c.shown.clone()).into()),
            _ => return Err(IntegrityError::NotRegularFile(c.shown.clone()).into()),
        },
        VerificationStage::SizeInRange => {
            c.size = fs.size(&c.path)?;
            check_size(c.size)?;
        }
        VerificationStage::HasShebang => check_shebang(&fs.first_line(&c.path)?)?,
        VerificationStage::PermissionsSafe => {
            c.mode = fs.permissions(&c.path)?;
            check_permissions(c.mode)?;
        }
        VerificationStage::DigestMatch => {
            c.sha256 = fs.sha256_file(&c.path)?;
            c.digest = check_digest(&c.sha256, reference_digest)?;
        }
        VerificationStage::Trusted => {
            if !is_executable(c.mode) {
                fs.set_mode(&c.path, EXECUTABLE_MODE)
                    .with_context(|| format!("making {} executable", c.shown))?;
                tracing::debug!(from = %format_mode(c.mode), "granted execute permission");
            }
        }
    }
    Ok(())
}
