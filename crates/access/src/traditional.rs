//! crates/access/src/traditional.rs
//! Owner/group/other mode-bit evaluation, used when the filesystem has no ACLs.

use crate::diagnostics::{QueryEvent, QueryLog};
use crate::probe::FileMetadata;
use crate::verdict::{Scope, Verdict};

/// Read permission for the owner (`S_IRUSR`).
pub const S_IRUSR: u32 = 0o400;
/// Read permission for the owning group (`S_IRGRP`).
pub const S_IRGRP: u32 = 0o040;
/// Read permission for others (`S_IROTH`).
pub const S_IROTH: u32 = 0o004;

/// Evaluates one pass over the mode bits of `metadata`.
///
/// The user pass allows when "other" may read, regardless of who asks, or
/// when the requester owns the file and the owner may read. The group pass
/// allows when the group may read and the requester belongs to the owning
/// group.
pub fn evaluate_traditional(metadata: &FileMetadata, scope: Scope<'_>, log: &QueryLog<'_>) -> Verdict {
    let mode = metadata.mode;
    let allowed = match scope {
        Scope::User(uid) => mode & S_IROTH != 0 || (mode & S_IRUSR != 0 && uid == metadata.uid),
        Scope::Group(groups) => mode & S_IRGRP != 0 && groups.contains(metadata.gid),
    };

    let verdict = Verdict::from(allowed);
    log.emit(QueryEvent::TraditionalPass {
        scope: scope.kind(),
        verdict,
    });
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullSink;
    use crate::identity::GroupList;
    use std::path::Path;

    fn check(mode: u32, scope: Scope<'_>) -> Verdict {
        let log = QueryLog::new(&NullSink, "tester", Path::new("/f"));
        evaluate_traditional(&FileMetadata::new(500, 50, 0o100000 | mode), scope, &log)
    }

    #[test]
    fn other_read_allows_anyone() {
        for uid in [0, 1, 500, 501, u32::MAX] {
            assert_eq!(check(0o004, Scope::User(uid)), Verdict::Allowed);
        }
    }

    #[test]
    fn owner_read_requires_ownership() {
        assert_eq!(check(0o644, Scope::User(500)), Verdict::Allowed);
        assert_eq!(check(0o600, Scope::User(500)), Verdict::Allowed);
        assert_eq!(check(0o600, Scope::User(501)), Verdict::Denied);
        assert_eq!(check(0o200, Scope::User(500)), Verdict::Denied);
    }

    #[test]
    fn group_read_requires_membership() {
        let member = GroupList::from(vec![10, 50]);
        let outsider = GroupList::from(vec![10, 51]);
        assert_eq!(check(0o640, Scope::Group(&member)), Verdict::Allowed);
        assert_eq!(check(0o640, Scope::Group(&outsider)), Verdict::Denied);
        assert_eq!(check(0o600, Scope::Group(&member)), Verdict::Denied);
    }

    #[test]
    fn other_bit_is_not_consulted_in_group_pass() {
        let outsider = GroupList::from(vec![99]);
        assert_eq!(check(0o604, Scope::Group(&outsider)), Verdict::Denied);
    }

    #[test]
    fn group_bit_is_not_consulted_in_user_pass() {
        assert_eq!(check(0o040, Scope::User(500)), Verdict::Denied);
    }
}
