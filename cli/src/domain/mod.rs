//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod args;
pub mod config;
pub mod error;
pub mod installer;
pub mod locator;

pub use config::{BootstrapConfig, ValidatedConfig};
pub use error::{ConfigError, EnvironmentError, ExecutionError, FetchError, IntegrityError};
pub use installer::{DigestCheck, EntryKind, TrustedInstaller, VerificationStage};
pub use locator::SourceLocator;

/// Encode bytes as lowercase hex string.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
