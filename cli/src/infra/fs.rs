//! Filesystem infrastructure: implements the installer filesystem ports.
//!
//! Metadata is always taken with `symlink_metadata` so a link is reported as
//! a link and never silently followed.

use std::fs::{File, Metadata};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nix::unistd::{AccessFlags, access};
use sha2::{Digest, Sha256};

use crate::application::ports::{
    FileHasher, FileMetadata, FileReader, PathResolver, PermissionWriter,
};
use crate::domain::{EntryKind, hex_encode};

/// Production filesystem implementation of the `InstallerFs` ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl LocalFs {
    fn lstat(path: &Path) -> Result<Metadata> {
        std::fs::symlink_metadata(path).with_context(|| format!("stat {}", path.display()))
    }
}

impl FileMetadata for LocalFs {
    fn kind(&self, path: &Path) -> Result<EntryKind> {
        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(EntryKind::Missing),
            Err(e) => return Err(e).with_context(|| format!("stat {}", path.display())),
        };
        let ft = meta.file_type();
        Ok(if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_file() {
            EntryKind::Regular
        } else if ft.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        })
    }

    fn size(&self, path: &Path) -> Result<u64> {
        Ok(Self::lstat(path)?.len())
    }

    fn permissions(&self, path: &Path) -> Result<u32> {
        let meta = Self::lstat(path)?;
        platform_mode(&meta)
    }
}

#[cfg(unix)]
fn platform_mode(meta: &Metadata) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(meta.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn platform_mode(_meta: &Metadata) -> Result<u32> {
    anyhow::bail!("permission bits are only available on unix platforms")
}

impl FileReader for LocalFs {
    fn is_readable(&self, path: &Path) -> bool {
        // access(2) never opens the entry, so a FIFO behind a link cannot block
        access(path, AccessFlags::R_OK).is_ok()
    }

    fn first_line(&self, path: &Path) -> Result<String> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut line = Vec::new();
        BufReader::new(file)
            .read_until(b'\n', &mut line)
            .with_context(|| format!("reading {}", path.display()))?;
        let line = String::from_utf8_lossy(&line);
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn list_entries(&self, dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in
            std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_symlink() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

impl FileHasher for LocalFs {
    fn sha256_file(&self, path: &Path) -> Result<String> {
        sha256_file(path)
    }
}

impl PathResolver for LocalFs {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        std::fs::canonicalize(path).with_context(|| format!("resolving {}", path.display()))
    }
}

impl PermissionWriter for LocalFs {
    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("setting permissions on {}", path.display()))?;
        }
        #[cfg(not(unix))]
        let _ = (path, mode);
        Ok(())
    }
}

/// Compute the SHA256 hex digest of a file.
///
/// Reads the file in 64 KB chunks to avoid loading large files into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 65536];
    loop {
        let n = file.read(&mut buf).context("reading file")?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex_encode(&hasher.finalize()))
}
