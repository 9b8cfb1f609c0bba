//! Installer-candidate invariants and the verification state machine.
//!
//! Pure functions only: no I/O, no async, no filesystem access. The
//! application layer gathers facts about the candidate file through ports and
//! feeds them to these checks in [`VerificationStage`] order.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::error::{ConfigError, IntegrityError};

/// Smallest plausible installer; anything shorter is empty or truncated.
pub const MIN_INSTALLER_SIZE: u64 = 1024;

/// Largest plausible installer (1 MiB).
pub const MAX_INSTALLER_SIZE: u64 = 1_048_576;

/// Mode granted to a fully verified installer that lacks execute permission.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Group-write and world-write bits.
const GROUP_OR_WORLD_WRITE: u32 = 0o022;

/// Ordered stages a candidate walks through before it is trusted.
///
/// Each transition either advances to the next stage or rejects the
/// candidate outright; there is no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerificationStage {
    Located,
    Readable,
    NotSymlink,
    SizeInRange,
    HasShebang,
    PermissionsSafe,
    DigestMatch,
    Trusted,
}

impl VerificationStage {
    /// All stages in the order they must be passed.
    pub const ORDER: [Self; 8] = [
        Self::Located,
        Self::Readable,
        Self::NotSymlink,
        Self::SizeInRange,
        Self::HasShebang,
        Self::PermissionsSafe,
        Self::DigestMatch,
        Self::Trusted,
    ];
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Located => "located",
            Self::Readable => "readable",
            Self::NotSymlink => "not-symlink",
            Self::SizeInRange => "size-in-range",
            Self::HasShebang => "has-shebang",
            Self::PermissionsSafe => "permissions-safe",
            Self::DigestMatch => "digest-match",
            Self::Trusted => "trusted",
        };
        f.write_str(name)
    }
}

/// What the filesystem reports for a path, without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Missing,
    Regular,
    Symlink,
    Directory,
    Other,
}

/// Outcome of the optional digest comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestCheck {
    /// A reference digest was configured and matched.
    Matched,
    /// No reference digest configured; the step was skipped.
    Skipped,
}

/// An installer that passed every check. Only the verifier constructs one;
/// the execution gate accepts nothing else.
#[derive(Debug, Clone)]
pub struct TrustedInstaller {
    path: PathBuf,
    size: u64,
    mode: u32,
    sha256: String,
    digest: DigestCheck,
}

impl TrustedInstaller {
    pub(crate) fn new(
        path: PathBuf,
        size: u64,
        mode: u32,
        sha256: String,
        digest: DigestCheck,
    ) -> Self {
        Self {
            path,
            size,
            mode,
            sha256,
            digest,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Permission bits observed at verification time (before any chmod).
    #[must_use]
    pub fn mode(&self) -> u32 {
        self.mode
    }

    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    #[must_use]
    pub fn digest_check(&self) -> DigestCheck {
        self.digest
    }
}

/// Reject filenames that could escape the workspace (CWE-22).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidFilename`] for empty names, names containing
/// `/` or `\`, and names containing `..`.
pub fn validate_filename(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0')
    {
        return Err(ConfigError::InvalidFilename(name.to_string()).into());
    }
    Ok(())
}

/// # Errors
///
/// Returns [`IntegrityError::SizeOutOfRange`] outside `[MIN, MAX]`.
pub fn check_size(size: u64) -> Result<()> {
    if !(MIN_INSTALLER_SIZE..=MAX_INSTALLER_SIZE).contains(&size) {
        return Err(IntegrityError::SizeOutOfRange {
            size,
            min: MIN_INSTALLER_SIZE,
            max: MAX_INSTALLER_SIZE,
        }
        .into());
    }
    Ok(())
}

/// # Errors
///
/// Returns [`IntegrityError::MissingShebang`] unless the first line is
/// non-empty and begins with `#!`.
pub fn check_shebang(first_line: &str) -> Result<()> {
    if first_line.is_empty() || !first_line.starts_with("#!") {
        return Err(IntegrityError::MissingShebang.into());
    }
    Ok(())
}

/// Render the permission triple as three octal digits, e.g. `644`.
#[must_use]
pub fn format_mode(mode: u32) -> String {
    format!("{:03o}", mode & 0o777)
}

/// # Errors
///
/// Returns [`IntegrityError::UnsafePermissions`] when group or world write is set.
pub fn check_permissions(mode: u32) -> Result<()> {
    if mode & GROUP_OR_WORLD_WRITE != 0 {
        return Err(IntegrityError::UnsafePermissions {
            mode: format_mode(mode),
        }
        .into());
    }
    Ok(())
}

/// `true` if any of the owner/group/other execute bits is set.
#[must_use]
pub fn is_executable(mode: u32) -> bool {
    mode & 0o111 != 0
}

/// Exactly 64 lowercase hex characters.
#[must_use]
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Compare the computed digest against the optional reference.
///
/// # Errors
///
/// Returns [`IntegrityError::MalformedDigest`] if `actual` is not a SHA-256
/// hex string, or [`IntegrityError::TamperDetected`] naming both values on
/// mismatch.
pub fn check_digest(actual: &str, reference: Option<&str>) -> Result<DigestCheck> {
    if !is_sha256_hex(actual) {
        return Err(IntegrityError::MalformedDigest(actual.to_string()).into());
    }
    match reference {
        None | Some("") => Ok(DigestCheck::Skipped),
        Some(expected) if expected == actual => Ok(DigestCheck::Matched),
        Some(expected) => Err(IntegrityError::TamperDetected {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
        .into()),
    }
}
