//! crates/access/src/probe.rs
//! Ownership and mode probing for the file under test.
//!
//! A query probes the file exactly once and carries the resulting
//! [`FileMetadata`] snapshot through every evaluation step, so a concurrent
//! `chown`/`chmod` cannot produce a verdict mixing old and new state.

use std::path::Path;

use crate::error::AccessError;
use crate::identity::{RawGid, RawUid};

/// Ownership and permission bits of a file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FileMetadata {
    /// User ID of the file owner.
    pub uid: RawUid,
    /// Group ID of the file owner.
    pub gid: RawGid,
    /// File mode (permission bits + file type).
    pub mode: u32,
}

impl FileMetadata {
    /// Creates a snapshot from raw values.
    pub const fn new(uid: RawUid, gid: RawGid, mode: u32) -> Self {
        Self { uid, gid, mode }
    }

    /// Returns the permission bits without the file type.
    pub const fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Retrieves [`FileMetadata`] for a path.
pub trait FileProbe {
    /// Probes `path`, following symbolic links.
    fn probe(&self, path: &Path) -> Result<FileMetadata, AccessError>;
}

impl<T: FileProbe + ?Sized> FileProbe for &T {
    fn probe(&self, path: &Path) -> Result<FileMetadata, AccessError> {
        (**self).probe(path)
    }
}

/// [`FileProbe`] backed by `stat(2)`.
#[cfg(unix)]
#[derive(Clone, Copy, Debug, Default)]
pub struct StatProbe;

#[cfg(unix)]
impl FileProbe for StatProbe {
    fn probe(&self, path: &Path) -> Result<FileMetadata, AccessError> {
        use rustix::io::Errno;

        match rustix::fs::stat(path) {
            Ok(stat) => {
                let metadata = FileMetadata::new(stat.st_uid, stat.st_gid, stat.st_mode as u32);
                logging::trace_probe!(
                    "{} is owned by {}:{} mode {:o}",
                    path.display(),
                    metadata.uid,
                    metadata.gid,
                    metadata.permissions()
                );
                Ok(metadata)
            }
            Err(Errno::NOENT | Errno::NOTDIR) => Err(AccessError::file_not_found(path)),
            Err(errno) => Err(AccessError::system("stat file", errno.into())),
        }
    }
}
