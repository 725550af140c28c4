//! crates/test-support/src/lib.rs
//! Shared fakes and fixtures for permcheck tests.
//!
//! The fakes implement the collaborator traits of [`access::AccessChecker`]
//! over in-memory tables and count how often they are consulted, so tests can
//! assert both the verdict and which lookups produced it.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use access::{
    AccessAcl, AccessError, AclEntry, AclLoad, AclPerm, AclSource, AclTag, FileMetadata,
    FileProbe, GroupList, IdentityResolver, RawGid, RawUid, UserRecord,
};
use tempfile::TempDir;

/// In-memory user directory.
#[derive(Debug, Default)]
pub struct FakeDirectory {
    users: HashMap<String, (UserRecord, Vec<RawGid>)>,
    unreachable_groups: bool,
    uid_lookups: Cell<usize>,
    group_lookups: Cell<usize>,
}

impl FakeDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user whose group list is `groups`.
    #[must_use]
    pub fn with_user(mut self, name: &str, uid: RawUid, primary_gid: RawGid, groups: &[RawGid]) -> Self {
        self.users.insert(
            name.to_owned(),
            (UserRecord { uid, primary_gid }, groups.to_vec()),
        );
        self
    }

    /// Makes every group enumeration fail with a system error.
    #[must_use]
    pub const fn with_unreachable_groups(mut self) -> Self {
        self.unreachable_groups = true;
        self
    }

    /// Number of `resolve_uid` calls so far.
    pub fn uid_lookups(&self) -> usize {
        self.uid_lookups.get()
    }

    /// Number of `resolve_groups` calls so far.
    pub fn group_lookups(&self) -> usize {
        self.group_lookups.get()
    }
}

impl IdentityResolver for FakeDirectory {
    fn resolve_uid(&self, user: &str) -> Result<UserRecord, AccessError> {
        self.uid_lookups.set(self.uid_lookups.get() + 1);
        self.users
            .get(user)
            .map(|(record, _)| *record)
            .ok_or_else(|| AccessError::user_not_found(user))
    }

    fn resolve_groups(&self, user: &str, _primary_gid: RawGid) -> Result<GroupList, AccessError> {
        self.group_lookups.set(self.group_lookups.get() + 1);
        if self.unreachable_groups {
            return Err(AccessError::system(
                "enumerate groups",
                io::Error::new(io::ErrorKind::TimedOut, "directory unreachable"),
            ));
        }
        self.users
            .get(user)
            .map(|(_, groups)| GroupList::from(groups.clone()))
            .ok_or_else(|| AccessError::user_not_found(user))
    }
}

/// In-memory file metadata table.
#[derive(Debug, Default)]
pub struct FakeProbe {
    files: HashMap<PathBuf, FileMetadata>,
    probes: Cell<usize>,
}

impl FakeProbe {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file owned by `uid:gid` with permission bits `mode`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>, uid: RawUid, gid: RawGid, mode: u32) -> Self {
        self.files
            .insert(path.into(), FileMetadata::new(uid, gid, 0o100_000 | mode));
        self
    }

    /// Number of probes so far.
    pub fn probes(&self) -> usize {
        self.probes.get()
    }
}

impl FileProbe for FakeProbe {
    fn probe(&self, path: &Path) -> Result<FileMetadata, AccessError> {
        self.probes.set(self.probes.get() + 1);
        self.files
            .get(path)
            .copied()
            .ok_or_else(|| AccessError::file_not_found(path))
    }
}

#[derive(Clone, Debug)]
enum AclState {
    Entries(AccessAcl),
    Malformed(String),
    Failing,
}

/// In-memory ACL table.
///
/// Paths without an entry behave like a filesystem without ACL support.
#[derive(Debug, Default)]
pub struct FakeAcl {
    acls: HashMap<PathBuf, AclState>,
    minimal_by_default: bool,
    loads: Cell<usize>,
}

impl FakeAcl {
    /// Creates a table where every file lacks ACL support.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::default()
    }

    /// Creates a table where files without an entry expose their mode bits
    /// as a minimal ACL.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            minimal_by_default: true,
            ..Self::default()
        }
    }

    /// Sets the ACL of `path`.
    #[must_use]
    pub fn with_acl(mut self, path: impl Into<PathBuf>, entries: Vec<AclEntry>) -> Self {
        self.acls
            .insert(path.into(), AclState::Entries(AccessAcl::new(entries)));
        self
    }

    /// Makes `path` report undecodable ACL data.
    #[must_use]
    pub fn with_malformed(mut self, path: impl Into<PathBuf>, reason: &str) -> Self {
        self.acls
            .insert(path.into(), AclState::Malformed(reason.to_owned()));
        self
    }

    /// Makes loading the ACL of `path` fail with an I/O error.
    #[must_use]
    pub fn with_failure(mut self, path: impl Into<PathBuf>) -> Self {
        self.acls.insert(path.into(), AclState::Failing);
        self
    }

    /// Number of loads so far.
    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl AclSource for FakeAcl {
    fn load(&self, path: &Path, metadata: &FileMetadata) -> Result<AclLoad, AccessError> {
        self.loads.set(self.loads.get() + 1);
        match self.acls.get(path) {
            Some(AclState::Entries(acl)) => Ok(AclLoad::Entries(acl.clone())),
            Some(AclState::Malformed(reason)) => Err(AccessError::malformed_acl(path, reason.clone())),
            Some(AclState::Failing) => Err(AccessError::system(
                "read ACL",
                io::Error::from(io::ErrorKind::PermissionDenied),
            )),
            None if self.minimal_by_default => Ok(AclLoad::Entries(AccessAcl::from_mode(metadata.mode))),
            None => Ok(AclLoad::Unsupported),
        }
    }
}

/// Builds ACL entry lists in `getfacl` order.
#[derive(Clone, Debug, Default)]
pub struct AclBuilder {
    entries: Vec<AclEntry>,
}

impl AclBuilder {
    /// Starts an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the minimal ACL for permission bits `mode`.
    #[must_use]
    pub fn from_mode(mode: u32) -> Self {
        Self {
            entries: AccessAcl::from_mode(mode).entries().to_vec(),
        }
    }

    /// Appends an entry.
    #[must_use]
    pub fn entry(mut self, tag: AclTag, perm: &str) -> Self {
        self.entries.push(AclEntry::new(tag, parse_perm(perm)));
        self
    }

    /// Returns the entries.
    #[must_use]
    pub fn build(self) -> Vec<AclEntry> {
        self.entries
    }

    /// Sets the entries as the access ACL of `path`.
    ///
    /// Entries are written in canonical order (owner, named users, owning
    /// group, named groups, mask, other), which the kernel requires. Named
    /// entries use decimal ids so no directory lookup is involved.
    #[cfg(target_os = "linux")]
    pub fn apply_to(&self, path: &Path) -> io::Result<()> {
        use exacl::{AclEntry as SysEntry, Perm};

        let mut entries = self.entries.clone();
        entries.sort_by_key(|entry| match entry.tag {
            AclTag::UserObj => 0,
            AclTag::User(_) => 1,
            AclTag::GroupObj => 2,
            AclTag::Group(_) => 3,
            AclTag::Mask => 4,
            AclTag::Other => 5,
            AclTag::Unknown(_) => 6,
        });

        let mut acl = Vec::with_capacity(entries.len());
        for entry in entries {
            let perms = [
                (AclPerm::READ, Perm::READ),
                (AclPerm::WRITE, Perm::WRITE),
                (AclPerm::EXECUTE, Perm::EXECUTE),
            ]
            .into_iter()
            .filter(|(bit, _)| entry.perm.contains(*bit))
            .fold(Perm::empty(), |perms, (_, bit)| perms | bit);

            acl.push(match entry.tag {
                AclTag::UserObj => SysEntry::allow_user("", perms, None),
                AclTag::User(uid) => SysEntry::allow_user(&uid.to_string(), perms, None),
                AclTag::GroupObj => SysEntry::allow_group("", perms, None),
                AclTag::Group(gid) => SysEntry::allow_group(&gid.to_string(), perms, None),
                AclTag::Mask => SysEntry::allow_mask(perms, None),
                AclTag::Other => SysEntry::allow_other(perms, None),
                AclTag::Unknown(raw) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("cannot store ACL tag {raw:#x}"),
                    ));
                }
            });
        }
        exacl::setfacl(&[path], &acl, None)
    }
}

/// Parses `getfacl`-style permissions such as `"r-x"`.
///
/// # Panics
///
/// Panics on anything other than three characters from `rwx-`.
#[must_use]
pub fn parse_perm(text: &str) -> AclPerm {
    assert_eq!(text.len(), 3, "permission must look like rwx: {text}");
    text.chars()
        .zip([AclPerm::READ, AclPerm::WRITE, AclPerm::EXECUTE])
        .fold(AclPerm::NONE, |perm, (c, bit)| match c {
            '-' => perm,
            'r' | 'w' | 'x' => perm | bit,
            other => panic!("unexpected permission character {other:?} in {text}"),
        })
}

/// Name of the user running the tests.
///
/// # Panics
///
/// Panics when the current uid has no passwd entry.
#[must_use]
pub fn current_user() -> String {
    use nix::unistd::{Uid, User};

    User::from_uid(Uid::current())
        .expect("passwd lookup")
        .expect("current user has a passwd entry")
        .name
}

/// Temporary directory of fixture files.
#[derive(Debug)]
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates an empty directory.
    ///
    /// # Panics
    ///
    /// Panics when the directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    /// Root of the directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `name` with permission bits `mode` and returns its path.
    ///
    /// # Panics
    ///
    /// Panics when the file cannot be written or chmodded.
    pub fn file(&self, name: &str, mode: u32) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, name.as_bytes()).expect("write fixture");
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).expect("chmod fixture");
        path
    }
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}
