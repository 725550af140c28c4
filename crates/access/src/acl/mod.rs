//! crates/access/src/acl/mod.rs
//!
//! POSIX.1e access ACL evaluation for read permission.
//!
//! # Model
//!
//! An access ACL is a list of entries, each tagged with the class of
//! principal it applies to:
//!
//! - `USER_OBJ` - the file owner
//! - `USER` - a named user (qualified by uid)
//! - `GROUP_OBJ` - the owning group
//! - `GROUP` - a named group (qualified by gid)
//! - `MASK` - upper bound on every group-class and named-user entry
//! - `OTHER` - everyone else
//!
//! # Evaluation
//!
//! Evaluation runs in two passes so group enumeration can be skipped when the
//! user pass already grants access. Each pass walks every entry once and
//! accumulates two flags: whether any applicable entry grants read, and
//! whether the mask permits read. Because the mask may appear anywhere in the
//! list, nothing is decided until the walk finishes; the result is therefore
//! independent of entry order.
//!
//! `OTHER` is consulted in the user pass only, mirroring mode-bit semantics
//! where "other" is evaluated once rather than per pass.

mod system;

pub use system::SystemAcl;

use std::fmt;
use std::path::Path;

use crate::diagnostics::{QueryEvent, QueryLog};
use crate::error::AccessError;
use crate::identity::{RawGid, RawUid};
use crate::probe::FileMetadata;
use crate::verdict::{AclOutcome, Scope, Verdict};

/// Permission bits of an ACL entry.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct AclPerm(u16);

impl AclPerm {
    /// Read permission.
    pub const READ: Self = Self(0x04);
    /// Write permission.
    pub const WRITE: Self = Self(0x02);
    /// Execute permission.
    pub const EXECUTE: Self = Self(0x01);
    /// No permission.
    pub const NONE: Self = Self(0);

    /// Creates permissions from raw bits.
    pub const fn from_raw(bits: u16) -> Self {
        Self(bits)
    }

    /// Creates permissions from an `rwx` triplet of mode bits.
    pub const fn from_mode_triplet(bits: u32) -> Self {
        Self((bits & 0o7) as u16)
    }

    /// Returns the raw bits.
    pub const fn as_raw(self) -> u16 {
        self.0
    }

    /// Returns `true` when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` when read is granted.
    pub const fn can_read(self) -> bool {
        self.contains(Self::READ)
    }
}

impl std::ops::BitOr for AclPerm {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for AclPerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |perm: Self, ch: char| if self.contains(perm) { ch } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(Self::READ, 'r'),
            flag(Self::WRITE, 'w'),
            flag(Self::EXECUTE, 'x')
        )
    }
}

/// Tag of an ACL entry, with the qualifier for named entries.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AclTag {
    /// `ACL_USER_OBJ`: the file owner.
    UserObj,
    /// `ACL_USER`: a named user.
    User(RawUid),
    /// `ACL_GROUP_OBJ`: the owning group.
    GroupObj,
    /// `ACL_GROUP`: a named group.
    Group(RawGid),
    /// `ACL_MASK`: the group-class upper bound.
    Mask,
    /// `ACL_OTHER`: everyone else.
    Other,
    /// A tag value this evaluator does not know.
    Unknown(u16),
}

impl fmt::Display for AclTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserObj => f.write_str("user::"),
            Self::User(uid) => write!(f, "user:{uid}:"),
            Self::GroupObj => f.write_str("group::"),
            Self::Group(gid) => write!(f, "group:{gid}:"),
            Self::Mask => f.write_str("mask::"),
            Self::Other => f.write_str("other::"),
            Self::Unknown(raw) => write!(f, "unknown({raw:#x}):"),
        }
    }
}

/// One ACL entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct AclEntry {
    /// Who the entry applies to.
    pub tag: AclTag,
    /// What it grants.
    pub perm: AclPerm,
}

impl AclEntry {
    /// Creates an entry.
    pub const fn new(tag: AclTag, perm: AclPerm) -> Self {
        Self { tag, perm }
    }
}

/// The access ACL of one file, in stored order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccessAcl {
    entries: Vec<AclEntry>,
}

impl AccessAcl {
    /// Wraps a list of entries.
    pub fn new(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    /// Builds the minimal ACL equivalent to the permission bits of `mode`.
    ///
    /// This is what the kernel reports for a file that carries no extended
    /// ACL: one owner, one owning-group and one other entry.
    pub fn from_mode(mode: u32) -> Self {
        Self::new(vec![
            AclEntry::new(AclTag::UserObj, AclPerm::from_mode_triplet(mode >> 6)),
            AclEntry::new(AclTag::GroupObj, AclPerm::from_mode_triplet(mode >> 3)),
            AclEntry::new(AclTag::Other, AclPerm::from_mode_triplet(mode)),
        ])
    }

    /// Returns the entries in stored order.
    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the ACL has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<AclEntry> for AccessAcl {
    fn from_iter<I: IntoIterator<Item = AclEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Result of loading a file's access ACL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AclLoad {
    /// The ACL entries.
    Entries(AccessAcl),
    /// The filesystem does not support ACLs.
    Unsupported,
}

/// Reads the access ACL of a file.
pub trait AclSource {
    /// Loads the access ACL of `path`.
    ///
    /// `metadata` is the snapshot taken for the query; sources use it to
    /// synthesize the minimal ACL of files without extended entries, so the
    /// ACL and the mode bits describe the same instant.
    fn load(&self, path: &Path, metadata: &FileMetadata) -> Result<AclLoad, AccessError>;
}

impl<T: AclSource + ?Sized> AclSource for &T {
    fn load(&self, path: &Path, metadata: &FileMetadata) -> Result<AclLoad, AccessError> {
        (**self).load(path, metadata)
    }
}

/// Decides whether `entry` takes part in a pass.
///
/// Returns an error for tags the evaluator does not understand.
fn entry_applies(
    entry: &AclEntry,
    metadata: &FileMetadata,
    scope: &Scope<'_>,
    path: &Path,
) -> Result<bool, AccessError> {
    let applies = match (entry.tag, scope) {
        (AclTag::UserObj, Scope::User(uid)) => *uid == metadata.uid,
        (AclTag::User(qualifier), Scope::User(uid)) => qualifier == *uid,
        (AclTag::GroupObj, Scope::Group(groups)) => groups.contains(metadata.gid),
        (AclTag::Group(qualifier), Scope::Group(groups)) => groups.contains(qualifier),
        (AclTag::Other, Scope::User(_)) => true,
        (AclTag::Mask, _) => true,
        (AclTag::UserObj | AclTag::User(_) | AclTag::Other, Scope::Group(_)) => false,
        (AclTag::GroupObj | AclTag::Group(_), Scope::User(_)) => false,
        (AclTag::Unknown(raw), _) => {
            return Err(AccessError::malformed_acl(
                path,
                format!("unknown ACL tag {raw:#x}"),
            ));
        }
    };
    Ok(applies)
}

/// Evaluates one pass over a loaded ACL.
pub fn evaluate(
    acl: &AccessAcl,
    path: &Path,
    metadata: &FileMetadata,
    scope: Scope<'_>,
    log: &QueryLog<'_>,
) -> Result<Verdict, AccessError> {
    let mut has_read = false;
    let mut mask_allows_read = true;

    for entry in acl.entries() {
        let applies = entry_applies(entry, metadata, &scope, path)?;
        log.emit(QueryEvent::AclEntry {
            scope: scope.kind(),
            tag: entry.tag,
            perm: entry.perm,
            applies,
        });
        if !applies {
            continue;
        }

        if entry.tag == AclTag::Mask {
            if !entry.perm.can_read() {
                mask_allows_read = false;
            }
        } else if entry.perm.can_read() {
            has_read = true;
        }
    }

    log.emit(QueryEvent::AclPass {
        scope: scope.kind(),
        has_read,
        mask_allows_read,
    });
    Ok(Verdict::from(has_read && mask_allows_read))
}

/// Evaluates one pass over an ACL loaded by an [`AclSource`].
///
/// A filesystem without ACL support yields [`AclOutcome::Unsupported`] so the
/// caller can fall back to mode bits. Both passes of a query share one load.
pub fn evaluate_acl(
    load: &AclLoad,
    path: &Path,
    metadata: &FileMetadata,
    scope: Scope<'_>,
    log: &QueryLog<'_>,
) -> Result<AclOutcome, AccessError> {
    match load {
        AclLoad::Entries(acl) => evaluate(acl, path, metadata, scope, log).map(AclOutcome::from),
        AclLoad::Unsupported => Ok(AclOutcome::Unsupported),
    }
}
