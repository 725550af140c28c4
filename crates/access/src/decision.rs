//! crates/access/src/decision.rs
//!
//! The read-permission decision.
//!
//! # Ordering
//!
//! A query gathers facts from the cheapest source first and stops as soon as a
//! verdict is certain:
//!
//! 1. resolve the user's uid
//! 2. take one metadata snapshot of the file
//! 3. load the access ACL and run the user pass (owner, named user, other)
//! 4. only if that pass did not allow, enumerate the user's groups and run
//!    the group pass
//!
//! Group enumeration is the expensive step (it may query a remote directory),
//! so it is skipped whenever the user pass allows. When the filesystem has no
//! ACL support, the same two passes run over the mode bits instead.
//!
//! The ACL is loaded once and both passes read that copy, just as both read
//! the one metadata snapshot.

use std::path::Path;

use crate::acl::{AclSource, evaluate_acl};
use crate::diagnostics::{QueryEvent, QueryLog, QuerySink, TracingSink};
use crate::error::AccessError;
use crate::identity::{GroupList, IdentityResolver, UserRecord};
use crate::probe::{FileMetadata, FileProbe};
use crate::traditional::evaluate_traditional;
use crate::verdict::{AclOutcome, Scope, Verdict};

/// Per-call state of one query.
///
/// Lives on the stack of [`AccessChecker::permission_to_read`]; every field
/// is filled at most once and dropped with the query on every exit path.
struct AccessQuery<'a> {
    user_name: &'a str,
    file_path: &'a Path,
    user: UserRecord,
    metadata: FileMetadata,
    groups: Option<GroupList>,
}

impl AccessQuery<'_> {
    /// Returns the group list, enumerating it on first use.
    fn groups<R: IdentityResolver>(
        &mut self,
        resolver: &R,
        log: &QueryLog<'_>,
    ) -> Result<&GroupList, AccessError> {
        let groups = match self.groups.take() {
            Some(groups) => groups,
            None => {
                let groups = resolver.resolve_groups(self.user_name, self.user.primary_gid)?;
                log.emit(QueryEvent::GroupsResolved {
                    count: groups.len(),
                });
                groups
            }
        };
        Ok(&*self.groups.insert(groups))
    }
}

/// Answers "can this user read this file?".
///
/// The checker holds no per-query state; one instance can serve any number
/// of queries. Collaborators are injected so the directory, the filesystem
/// and the diagnostics can each be replaced.
#[derive(Clone, Debug)]
pub struct AccessChecker<R, P, A, S = TracingSink> {
    resolver: R,
    probe: P,
    acl_source: A,
    sink: S,
}

impl<R, P, A> AccessChecker<R, P, A> {
    /// Creates a checker reporting to [`TracingSink`].
    pub const fn new(resolver: R, probe: P, acl_source: A) -> Self {
        Self {
            resolver,
            probe,
            acl_source,
            sink: TracingSink,
        }
    }
}

#[cfg(unix)]
impl AccessChecker<crate::SystemDirectory, crate::StatProbe, crate::acl::SystemAcl> {
    /// Creates a checker backed by the host's user directory and filesystem.
    pub const fn system() -> Self {
        Self::new(
            crate::SystemDirectory::new(),
            crate::StatProbe,
            crate::acl::SystemAcl,
        )
    }
}

impl<R, P, A, S> AccessChecker<R, P, A, S> {
    /// Replaces the diagnostic sink.
    pub fn with_sink<T>(self, sink: T) -> AccessChecker<R, P, A, T> {
        AccessChecker {
            resolver: self.resolver,
            probe: self.probe,
            acl_source: self.acl_source,
            sink,
        }
    }

    /// Returns the identity resolver.
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Returns the diagnostic sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }
}

impl<R, P, A, S> AccessChecker<R, P, A, S>
where
    R: IdentityResolver,
    P: FileProbe,
    A: AclSource,
    S: QuerySink,
{
    /// Decides whether `user_name` may read `file_path`.
    ///
    /// Returns [`Verdict::Denied`] only when every applicable check ran and
    /// none granted read; any failure along the way is returned as an error
    /// instead.
    pub fn permission_to_read(
        &self,
        user_name: &str,
        file_path: &Path,
    ) -> Result<Verdict, AccessError> {
        let log = QueryLog::new(&self.sink, user_name, file_path);
        let result = self.decide(user_name, file_path, &log);
        match &result {
            Ok(verdict) => log.emit(QueryEvent::Finished(*verdict)),
            Err(error) => log.emit(QueryEvent::Failed(error.kind())),
        }
        result
    }

    fn decide(
        &self,
        user_name: &str,
        file_path: &Path,
        log: &QueryLog<'_>,
    ) -> Result<Verdict, AccessError> {
        let user = self.resolver.resolve_uid(user_name)?;
        log.emit(QueryEvent::UserResolved { uid: user.uid });

        let metadata = self.probe.probe(file_path)?;
        log.emit(QueryEvent::MetadataProbed(metadata));

        let mut query = AccessQuery {
            user_name,
            file_path,
            user,
            metadata,
            groups: None,
        };

        let load = self.acl_source.load(file_path, &metadata)?;
        match evaluate_acl(&load, file_path, &metadata, Scope::User(user.uid), log)? {
            AclOutcome::Allowed => Ok(Verdict::Allowed),
            AclOutcome::Denied => {
                let groups = query.groups(&self.resolver, log)?;
                let outcome = evaluate_acl(&load, file_path, &metadata, Scope::Group(groups), log)?;
                Ok(Verdict::from(outcome == AclOutcome::Allowed))
            }
            AclOutcome::Unsupported => {
                log.emit(QueryEvent::AclUnsupported);
                self.decide_with_mode(&mut query, log)
            }
        }
    }

    fn decide_with_mode(
        &self,
        query: &mut AccessQuery<'_>,
        log: &QueryLog<'_>,
    ) -> Result<Verdict, AccessError> {
        let metadata = query.metadata;
        if evaluate_traditional(&metadata, Scope::User(query.user.uid), log).is_allowed() {
            return Ok(Verdict::Allowed);
        }

        let groups = query.groups(&self.resolver, log)?;
        Ok(evaluate_traditional(&metadata, Scope::Group(groups), log))
    }
}

/// Decides whether `user_name` may read `file_path` using the host's user
/// directory and filesystem.
#[cfg(unix)]
pub fn permission_to_read(
    user_name: &str,
    file_path: impl AsRef<Path>,
) -> Result<Verdict, AccessError> {
    AccessChecker::system().permission_to_read(user_name, file_path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::{AccessAcl, AclEntry, AclLoad, AclPerm, AclTag};
    use crate::diagnostics::MemorySink;
    use crate::error::ErrorKind;
    use crate::identity::RawGid;
    use std::cell::Cell;
    use std::io;

    struct Directory {
        uid: u32,
        groups: Vec<RawGid>,
        group_calls: Cell<usize>,
        fail_groups: bool,
    }

    impl Directory {
        fn new(uid: u32, groups: &[RawGid]) -> Self {
            Self {
                uid,
                groups: groups.to_vec(),
                group_calls: Cell::new(0),
                fail_groups: false,
            }
        }
    }

    impl IdentityResolver for Directory {
        fn resolve_uid(&self, user: &str) -> Result<UserRecord, AccessError> {
            if user == "ghost" {
                return Err(AccessError::user_not_found(user));
            }
            Ok(UserRecord {
                uid: self.uid,
                primary_gid: self.groups.first().copied().unwrap_or(65534),
            })
        }

        fn resolve_groups(&self, _user: &str, _gid: RawGid) -> Result<GroupList, AccessError> {
            self.group_calls.set(self.group_calls.get() + 1);
            if self.fail_groups {
                return Err(AccessError::system("enumerate groups", io::Error::other("ldap down")));
            }
            Ok(GroupList::from(self.groups.clone()))
        }
    }

    struct Probe(Option<FileMetadata>);

    impl FileProbe for Probe {
        fn probe(&self, path: &Path) -> Result<FileMetadata, AccessError> {
            self.0.ok_or_else(|| AccessError::file_not_found(path))
        }
    }

    enum Acl {
        Entries(Vec<AclEntry>),
        Unsupported,
        Broken,
    }

    impl AclSource for Acl {
        fn load(&self, path: &Path, _: &FileMetadata) -> Result<AclLoad, AccessError> {
            match self {
                Self::Entries(entries) => Ok(AclLoad::Entries(AccessAcl::new(entries.clone()))),
                Self::Unsupported => Ok(AclLoad::Unsupported),
                Self::Broken => Err(AccessError::malformed_acl(path, "truncated")),
            }
        }
    }

    fn file(mode: u32) -> Probe {
        Probe(Some(FileMetadata::new(500, 50, 0o100000 | mode)))
    }

    fn check(directory: &Directory, probe: Probe, acl: Acl) -> Result<Verdict, AccessError> {
        AccessChecker::new(directory, probe, acl)
            .with_sink(crate::diagnostics::NullSink)
            .permission_to_read("alice", Path::new("/srv/app.log"))
    }

    #[test]
    fn owner_read_bit_allows_owner() {
        let directory = Directory::new(500, &[50]);
        assert_eq!(check(&directory, file(0o644), Acl::Unsupported).unwrap(), Verdict::Allowed);
        assert_eq!(directory.group_calls.get(), 0);
    }

    #[test]
    fn private_file_denies_other_user() {
        let directory = Directory::new(501, &[60]);
        assert_eq!(check(&directory, file(0o600), Acl::Unsupported).unwrap(), Verdict::Denied);
        assert_eq!(directory.group_calls.get(), 1);
    }

    #[test]
    fn group_bits_checked_after_enumeration() {
        let directory = Directory::new(501, &[60, 50]);
        assert_eq!(check(&directory, file(0o640), Acl::Unsupported).unwrap(), Verdict::Allowed);
        assert_eq!(directory.group_calls.get(), 1);
    }

    #[test]
    fn user_pass_grant_skips_group_enumeration() {
        let directory = Directory::new(501, &[42]);
        let acl = Acl::Entries(vec![
            AclEntry::new(AclTag::UserObj, AclPerm::NONE),
            AclEntry::new(AclTag::User(501), AclPerm::READ),
            AclEntry::new(AclTag::GroupObj, AclPerm::NONE),
            AclEntry::new(AclTag::Mask, AclPerm::READ),
            AclEntry::new(AclTag::Other, AclPerm::NONE),
        ]);
        assert_eq!(check(&directory, file(0o600), acl).unwrap(), Verdict::Allowed);
        assert_eq!(directory.group_calls.get(), 0);
    }

    #[test]
    fn named_group_grant_needs_group_pass() {
        let directory = Directory::new(501, &[42]);
        let entries = |mask| {
            vec![
                AclEntry::new(AclTag::UserObj, AclPerm::READ | AclPerm::WRITE),
                AclEntry::new(AclTag::GroupObj, AclPerm::NONE),
                AclEntry::new(AclTag::Group(42), AclPerm::READ),
                AclEntry::new(AclTag::Mask, mask),
                AclEntry::new(AclTag::Other, AclPerm::NONE),
            ]
        };

        let allowed = check(&directory, file(0o600), Acl::Entries(entries(AclPerm::READ | AclPerm::WRITE)));
        assert_eq!(allowed.unwrap(), Verdict::Allowed);
        let denied = check(&directory, file(0o600), Acl::Entries(entries(AclPerm::WRITE)));
        assert_eq!(denied.unwrap(), Verdict::Denied);
        assert_eq!(directory.group_calls.get(), 2);
    }

    #[test]
    fn unknown_user_stops_before_probe() {
        let directory = Directory::new(501, &[]);
        let error = AccessChecker::new(&directory, Probe(None), Acl::Unsupported)
            .permission_to_read("ghost", Path::new("/missing"))
            .expect_err("unknown user");
        assert_eq!(error.kind(), ErrorKind::UserNotFound);
    }

    #[test]
    fn missing_file_is_reported() {
        let directory = Directory::new(501, &[]);
        let error = check(&directory, Probe(None), Acl::Unsupported).expect_err("missing");
        assert_eq!(error.kind(), ErrorKind::FileNotFound);
    }

    #[test]
    fn malformed_acl_is_an_error_not_a_fallback() {
        let directory = Directory::new(500, &[50]);
        let error = check(&directory, file(0o644), Acl::Broken).expect_err("broken");
        assert_eq!(error.kind(), ErrorKind::UnsupportedAclQuery);
        assert_eq!(directory.group_calls.get(), 0);
    }

    #[test]
    fn group_failure_aborts_query() {
        let mut directory = Directory::new(501, &[50]);
        directory.fail_groups = true;
        let error = check(&directory, file(0o640), Acl::Unsupported).expect_err("ldap down");
        assert_eq!(error.kind(), ErrorKind::SystemError);
    }

    #[test]
    fn events_describe_the_query() {
        let directory = Directory::new(501, &[50]);
        let sink = MemorySink::new();
        let verdict = AccessChecker::new(&directory, file(0o640), Acl::Unsupported)
            .with_sink(&sink)
            .permission_to_read("alice", Path::new("/srv/app.log"))
            .expect("verdict");
        assert_eq!(verdict, Verdict::Allowed);

        let events = sink.events();
        assert_eq!(events.first(), Some(&QueryEvent::UserResolved { uid: 501 }));
        assert!(events.contains(&QueryEvent::AclUnsupported));
        assert!(events.contains(&QueryEvent::GroupsResolved { count: 1 }));
        assert_eq!(events.last(), Some(&QueryEvent::Finished(Verdict::Allowed)));
    }

    #[test]
    fn failures_are_reported_to_the_sink() {
        let directory = Directory::new(501, &[]);
        let sink = MemorySink::new();
        let _ = AccessChecker::new(&directory, Probe(None), Acl::Unsupported)
            .with_sink(&sink)
            .permission_to_read("alice", Path::new("/missing"));
        assert_eq!(
            sink.events().last(),
            Some(&QueryEvent::Failed(ErrorKind::FileNotFound))
        );
    }
}
