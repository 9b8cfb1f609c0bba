//! Source locator validation.
//!
//! Pure functions only: no I/O, no async. A locator is checked here before
//! it is ever placed on a subprocess command line.

use std::fmt;
use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use crate::domain::error::ConfigError;

/// `https://github.com/<org>/<repo>` where `<org>` is 1–39 alphanumerics or
/// interior hyphens (GitHub's own rule) and `<repo>` uses `[A-Za-z0-9._-]`.
pub static LOCATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern: cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^https://github\.com/[A-Za-z0-9](?:[A-Za-z0-9-]{0,37}[A-Za-z0-9])?/[A-Za-z0-9._-]+$")
        .expect("valid regex")
});

/// Shell metacharacters that must never appear in a locator.
pub const LOCATOR_METACHARS: &[char] = &[
    ';', '$', '`', '|', '&', '<', '>', '(', ')', '{', '}', '[', ']',
];

/// Returns the first forbidden metacharacter in `value`, if any.
#[must_use]
pub fn find_metachar(value: &str) -> Option<char> {
    value.chars().find(|c| LOCATOR_METACHARS.contains(c))
}

/// A validated remote-content locator. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocator(String);

impl SourceLocator {
    /// Validate `raw` against the metacharacter blacklist and the allowlist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LocatorMetachar`] or [`ConfigError::InvalidLocator`].
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(ch) = find_metachar(raw) {
            return Err(ConfigError::LocatorMetachar {
                locator: raw.to_string(),
                ch,
            }
            .into());
        }
        if !LOCATOR_RE.is_match(raw) || raw.ends_with("/..") || raw.ends_with("/.") {
            return Err(ConfigError::InvalidLocator(raw.to_string()).into());
        }
        Ok(Self(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
