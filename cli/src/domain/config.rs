//! Compiled-in bootstrap configuration and its validator.
//!
//! Pure functions only: no I/O, no async, no filesystem access. The value is
//! built once at startup and passed explicitly to every stage.

use std::time::Duration;

use anyhow::Result;

use crate::domain::error::ConfigError;
use crate::domain::installer::{is_sha256_hex, validate_filename};
use crate::domain::locator::SourceLocator;

// ── Constants ────────────────────────────────────────────────────────────────

/// Repository the installer is fetched from.
pub const SOURCE_LOCATOR: &str = "https://github.com/kirodotdev/kiro-installer";

/// Installer expected at the root of the fetched repository.
pub const INSTALLER_FILENAME: &str = "install-kiro.sh";

/// Pinned SHA-256 of the installer. `None` skips the digest stage.
pub const REFERENCE_DIGEST: Option<&str> = None;

/// Upper bound on the shallow clone.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(300);

// ── Config schema ────────────────────────────────────────────────────────────

/// Immutable bootstrap configuration.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Remote repository locator (validated by [`BootstrapConfig::validate`]).
    pub locator: String,
    /// Installer filename inside the repository root.
    pub installer_filename: String,
    /// Optional pinned digest (64 lowercase hex characters).
    pub reference_digest: Option<String>,
    /// Timeout applied to the fetch subprocess.
    pub fetch_timeout: Duration,
}

impl BootstrapConfig {
    /// The configuration shipped with this binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            locator: SOURCE_LOCATOR.to_string(),
            installer_filename: INSTALLER_FILENAME.to_string(),
            reference_digest: REFERENCE_DIGEST.map(str::to_string),
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    /// Validate every field before the configuration is used anywhere.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an invalid locator, filename, or a
    /// non-empty reference digest that is not 64 lowercase hex characters.
    pub fn validate(&self) -> Result<ValidatedConfig> {
        let locator = SourceLocator::parse(&self.locator)?;
        validate_filename(&self.installer_filename)?;
        let reference_digest = match self.reference_digest.as_deref() {
            None | Some("") => None,
            Some(d) if is_sha256_hex(d) => Some(d.to_string()),
            Some(d) => return Err(ConfigError::InvalidReferenceDigest(d.to_string()).into()),
        };
        Ok(ValidatedConfig {
            locator,
            installer_filename: self.installer_filename.clone(),
            reference_digest,
            fetch_timeout: self.fetch_timeout,
        })
    }
}

/// A configuration whose every field passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub locator: SourceLocator,
    pub installer_filename: String,
    pub reference_digest: Option<String>,
    pub fetch_timeout: Duration,
}
