//! Application services: use-case orchestration.
//!
//! Each service module implements a single pipeline stage by composing domain
//! logic with port trait calls. Services import only from `crate::domain` and
//! `crate::application::ports`: never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod execute;
pub mod fetch;
pub mod pipeline;
pub mod verify;

use std::path::Path;

use anyhow::Result;

use crate::domain::error::ExecutionError;

/// Borrow `path` as UTF-8 for use on a command line.
pub(crate) fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| ExecutionError::NonUtf8Path(path.display().to_string()).into())
}
