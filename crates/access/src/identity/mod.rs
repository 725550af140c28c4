//! crates/access/src/identity/mod.rs
//! User and group identity resolution.
//!
//! Resolution is split in two because the costs differ sharply: looking up a
//! single passwd entry is cheap, while enumerating every group a user belongs
//! to may walk a remote directory (LDAP, NIS). The decision engine therefore
//! asks for the uid up front and for the group list only when a group-scoped
//! evaluation cannot be avoided.

mod groups;
#[cfg(unix)]
mod system;

pub use groups::{Enumeration, GroupBufferPolicy, GroupEnumerator, load_groups};
#[cfg(unix)]
pub use system::{GetGroupList, SystemDirectory};

use crate::error::AccessError;

/// Raw user ID type.
pub type RawUid = u32;

/// Raw group ID type.
pub type RawGid = u32;

/// The passwd fields needed to answer a query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UserRecord {
    /// Numeric user ID.
    pub uid: RawUid,
    /// Primary group from the passwd entry, seeded into group enumeration.
    pub primary_gid: RawGid,
}

/// The group IDs a user belongs to, in enumeration order.
///
/// Duplicates are kept; membership is a linear scan.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GroupList(Vec<RawGid>);

impl GroupList {
    /// Returns `true` when `gid` appears in the list.
    pub fn contains(&self, gid: RawGid) -> bool {
        self.0.iter().any(|&member| member == gid)
    }

    /// Returns the number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the user belongs to no group at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the IDs as a slice.
    pub fn as_slice(&self) -> &[RawGid] {
        &self.0
    }
}

impl From<Vec<RawGid>> for GroupList {
    fn from(gids: Vec<RawGid>) -> Self {
        Self(gids)
    }
}

impl FromIterator<RawGid> for GroupList {
    fn from_iter<I: IntoIterator<Item = RawGid>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Maps user names to numeric identities.
pub trait IdentityResolver {
    /// Looks up the uid and primary gid of `user`.
    fn resolve_uid(&self, user: &str) -> Result<UserRecord, AccessError>;

    /// Enumerates every group `user` belongs to, seeded with `primary_gid`.
    ///
    /// Potentially slow; only call when group evaluation is required.
    fn resolve_groups(&self, user: &str, primary_gid: RawGid) -> Result<GroupList, AccessError>;
}

impl<T: IdentityResolver + ?Sized> IdentityResolver for &T {
    fn resolve_uid(&self, user: &str) -> Result<UserRecord, AccessError> {
        (**self).resolve_uid(user)
    }

    fn resolve_groups(&self, user: &str, primary_gid: RawGid) -> Result<GroupList, AccessError> {
        (**self).resolve_groups(user, primary_gid)
    }
}
