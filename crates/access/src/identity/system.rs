#![allow(unsafe_code)]

//! crates/access/src/identity/system.rs
//! Identity resolution against the host's passwd and group databases (NSS).

use std::ffi::{CString, c_int};
use std::io;

use nix::unistd::User;

use super::groups::{Enumeration, GroupBufferPolicy, GroupEnumerator, load_groups};
use super::{GroupList, IdentityResolver, RawGid, UserRecord};
use crate::error::AccessError;

/// [`GroupEnumerator`] backed by `getgrouplist(3)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GetGroupList;

impl GroupEnumerator for GetGroupList {
    fn enumerate(
        &self,
        user: &str,
        primary_gid: RawGid,
        buffer: &mut [RawGid],
    ) -> io::Result<Enumeration> {
        let name = CString::new(user)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "user name contains NUL"))?;
        let mut count = c_int::try_from(buffer.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "group buffer too large"))?;

        #[cfg(not(target_vendor = "apple"))]
        let groups = buffer.as_mut_ptr().cast::<libc::gid_t>();
        #[cfg(target_vendor = "apple")]
        let groups = buffer.as_mut_ptr().cast::<c_int>();

        // Safety: `name` is NUL-terminated and outlives the call, `groups`
        // points at `buffer.len()` writable slots of a 32-bit integer type,
        // and `count` tells the callee exactly that many are available.
        let result = unsafe { libc::getgrouplist(name.as_ptr(), primary_gid as _, groups, &mut count) };

        let reported = usize::try_from(count).unwrap_or(0);
        if result == -1 {
            Ok(Enumeration::Insufficient {
                reported: reported.max(buffer.len()),
            })
        } else {
            Ok(Enumeration::Complete(reported.min(buffer.len())))
        }
    }
}

/// [`IdentityResolver`] that consults the system user and group directories.
///
/// Lookups go through NSS, so the answers may come from local files or from a
/// remote directory service; latency is not bounded here.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemDirectory {
    policy: GroupBufferPolicy,
}

impl SystemDirectory {
    /// Creates a directory using the default [`GroupBufferPolicy`].
    pub const fn new() -> Self {
        Self {
            policy: GroupBufferPolicy::new(),
        }
    }

    /// Replaces the group buffer sizing policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: GroupBufferPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the active group buffer policy.
    pub const fn policy(&self) -> GroupBufferPolicy {
        self.policy
    }
}

impl IdentityResolver for SystemDirectory {
    fn resolve_uid(&self, user: &str) -> Result<UserRecord, AccessError> {
        if user.is_empty() || user.contains('\0') {
            return Err(AccessError::user_not_found(user));
        }

        match User::from_name(user) {
            Ok(Some(entry)) => {
                let record = UserRecord {
                    uid: entry.uid.as_raw(),
                    primary_gid: entry.gid.as_raw(),
                };
                logging::trace_ident!(
                    "user '{}' resolved to uid {} (primary gid {})",
                    user,
                    record.uid,
                    record.primary_gid
                );
                Ok(record)
            }
            Ok(None) => {
                logging::trace_ident!("no user '{}' found", user);
                Err(AccessError::user_not_found(user))
            }
            Err(errno) => Err(AccessError::system("look up user", errno.into())),
        }
    }

    fn resolve_groups(&self, user: &str, primary_gid: RawGid) -> Result<GroupList, AccessError> {
        if user.contains('\0') {
            return Err(AccessError::user_not_found(user));
        }
        load_groups(&GetGroupList, user, primary_gid, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use nix::unistd::Uid;

    fn current_user_name() -> Option<String> {
        User::from_uid(Uid::current()).ok().flatten().map(|user| user.name)
    }

    #[test]
    fn resolves_current_user() {
        let Some(name) = current_user_name() else {
            return;
        };
        let record = SystemDirectory::new().resolve_uid(&name).expect("resolve");
        assert_eq!(record.uid, Uid::current().as_raw());
    }

    #[test]
    fn unknown_user_is_reported() {
        let error = SystemDirectory::new()
            .resolve_uid("no-such-user-permcheck-test")
            .expect_err("unknown user");
        assert_eq!(error.kind(), ErrorKind::UserNotFound);
    }

    #[test]
    fn names_with_nul_are_unknown() {
        let directory = SystemDirectory::new();
        assert_eq!(
            directory.resolve_uid("ro\0ot").expect_err("nul").kind(),
            ErrorKind::UserNotFound
        );
        assert_eq!(
            directory.resolve_groups("ro\0ot", 0).expect_err("nul").kind(),
            ErrorKind::UserNotFound
        );
        assert_eq!(
            directory.resolve_uid("").expect_err("empty").kind(),
            ErrorKind::UserNotFound
        );
    }

    #[test]
    fn groups_include_primary_gid() {
        let Some(name) = current_user_name() else {
            return;
        };
        let directory = SystemDirectory::new();
        let record = directory.resolve_uid(&name).expect("resolve");
        let groups = directory
            .resolve_groups(&name, record.primary_gid)
            .expect("groups");
        assert!(groups.contains(record.primary_gid));
    }

    #[test]
    fn tiny_policy_still_lists_all_groups() {
        let Some(name) = current_user_name() else {
            return;
        };
        let record = SystemDirectory::new().resolve_uid(&name).expect("resolve");
        let reference = SystemDirectory::new()
            .resolve_groups(&name, record.primary_gid)
            .expect("groups");
        let tiny = SystemDirectory::new()
            .with_policy(GroupBufferPolicy::new().initial_capacity(0).increment(1))
            .resolve_groups(&name, record.primary_gid)
            .expect("groups");
        assert_eq!(tiny.len(), reference.len());
    }
}
