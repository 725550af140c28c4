//! crates/access/src/acl/system.rs
//! Access ACL loading from the live filesystem.
//!
//! On Linux, macOS and FreeBSD the ACL is read through `exacl`, following
//! symlinks like `stat(2)` does. Elsewhere, or when the `acl` feature is
//! disabled, every file reports [`AclLoad::Unsupported`] and mode bits decide.

use std::path::Path;

use super::{AclLoad, AclSource};
use crate::error::AccessError;
use crate::probe::FileMetadata;

/// [`AclSource`] reading the host filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAcl;

#[cfg(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
))]
impl AclSource for SystemAcl {
    fn load(&self, path: &Path, metadata: &FileMetadata) -> Result<AclLoad, AccessError> {
        use super::AccessAcl;

        match exacl::getfacl(path, access_acl_option()) {
            Ok(entries) if entries.is_empty() => {
                logging::trace_acl!(
                    "{} has no extended ACL, using minimal ACL",
                    path.display()
                );
                Ok(AclLoad::Entries(AccessAcl::from_mode(metadata.mode)))
            }
            Ok(entries) => {
                let acl = convert_entries(path, metadata, &entries)?;
                logging::trace_acl!("{} carries {} ACL entries", path.display(), acl.len());
                Ok(AclLoad::Entries(acl))
            }
            Err(error) if is_unsupported(&error) => {
                logging::trace_acl!("{}: filesystem has no ACL support", path.display());
                Ok(AclLoad::Unsupported)
            }
            Err(error) => Err(AccessError::system("read ACL", error)),
        }
    }
}

#[cfg(all(feature = "acl", any(target_os = "linux", target_os = "freebsd")))]
const fn access_acl_option() -> Option<exacl::AclOption> {
    Some(exacl::AclOption::ACCESS_ACL)
}

/// macOS has a single ACL per file; the default option reads it.
#[cfg(all(feature = "acl", target_os = "macos"))]
const fn access_acl_option() -> Option<exacl::AclOption> {
    None
}

/// Returns `true` when `error` means the filesystem has no ACL support.
///
/// The cause is taken from the error value returned by the failing call, not
/// from a later read of `errno`.
#[cfg(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
))]
fn is_unsupported(error: &std::io::Error) -> bool {
    matches!(
        error.raw_os_error(),
        Some(code) if code == libc::ENOTSUP || code == libc::EOPNOTSUPP
    )
}

/// Maps the entries reported by `exacl` onto the evaluator's model.
///
/// macOS reports only the extended entries, so the mode-bit entries are
/// prepended there; Linux and FreeBSD report the complete access ACL.
#[cfg(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
))]
fn convert_entries(
    path: &Path,
    metadata: &FileMetadata,
    entries: &[exacl::AclEntry],
) -> Result<super::AccessAcl, AccessError> {
    let mut converted = if cfg!(target_os = "macos") {
        super::AccessAcl::from_mode(metadata.mode).entries().to_vec()
    } else {
        Vec::with_capacity(entries.len())
    };

    for entry in entries {
        if let Some(entry) = convert_entry(path, entry)? {
            converted.push(entry);
        }
    }
    Ok(super::AccessAcl::new(converted))
}

/// Converts one entry. Deny entries that do not mention read are dropped;
/// those that do cannot be expressed as grants and make the ACL malformed.
#[cfg(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
))]
fn convert_entry(
    path: &Path,
    entry: &exacl::AclEntry,
) -> Result<Option<super::AclEntry>, AccessError> {
    use exacl::AclEntryKind;

    use super::AclTag;

    let perm = convert_perm(entry.perms);
    if !entry.allow {
        if perm.can_read() {
            return Err(AccessError::malformed_acl(
                path,
                format!("deny entry for '{}' restricts read", entry.name),
            ));
        }
        return Ok(None);
    }

    let tag = match entry.kind {
        AclEntryKind::User if entry.name.is_empty() => AclTag::UserObj,
        AclEntryKind::User => AclTag::User(principal_uid(path, &entry.name)?),
        AclEntryKind::Group if entry.name.is_empty() => AclTag::GroupObj,
        AclEntryKind::Group => AclTag::Group(principal_gid(path, &entry.name)?),
        #[cfg(any(target_os = "linux", target_os = "freebsd"))]
        AclEntryKind::Mask => AclTag::Mask,
        #[cfg(any(target_os = "linux", target_os = "freebsd"))]
        AclEntryKind::Other => AclTag::Other,
        #[allow(unreachable_patterns)]
        other => {
            return Err(AccessError::malformed_acl(
                path,
                format!("unsupported ACL entry kind {other:?}"),
            ));
        }
    };
    Ok(Some(super::AclEntry::new(tag, perm)))
}

#[cfg(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
))]
fn convert_perm(perms: exacl::Perm) -> super::AclPerm {
    use super::AclPerm;

    [
        (exacl::Perm::READ, AclPerm::READ),
        (exacl::Perm::WRITE, AclPerm::WRITE),
        (exacl::Perm::EXECUTE, AclPerm::EXECUTE),
    ]
    .into_iter()
    .filter(|(bit, _)| perms.contains(*bit))
    .fold(AclPerm::NONE, |perm, (_, bit)| perm | bit)
}

/// Resolves the qualifier of a named-user entry.
///
/// `exacl` reports the user name when the directory knows the uid and the
/// decimal uid otherwise.
#[cfg(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
))]
fn principal_uid(path: &Path, name: &str) -> Result<crate::identity::RawUid, AccessError> {
    match nix::unistd::User::from_name(name) {
        Ok(Some(user)) => Ok(user.uid.as_raw()),
        Ok(None) => name
            .parse()
            .map_err(|_| AccessError::malformed_acl(path, format!("unknown ACL user '{name}'"))),
        Err(errno) => Err(AccessError::system("look up ACL user", errno.into())),
    }
}

/// Resolves the qualifier of a named-group entry.
#[cfg(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
))]
fn principal_gid(path: &Path, name: &str) -> Result<crate::identity::RawGid, AccessError> {
    match nix::unistd::Group::from_name(name) {
        Ok(Some(group)) => Ok(group.gid.as_raw()),
        Ok(None) => name
            .parse()
            .map_err(|_| AccessError::malformed_acl(path, format!("unknown ACL group '{name}'"))),
        Err(errno) => Err(AccessError::system("look up ACL group", errno.into())),
    }
}

#[cfg(not(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
)))]
impl AclSource for SystemAcl {
    fn load(&self, path: &Path, _metadata: &FileMetadata) -> Result<AclLoad, AccessError> {
        warn_acl_unsupported();
        logging::trace_acl!("{}: ACL support not available", path.display());
        Ok(AclLoad::Unsupported)
    }
}

/// Emits a one-time warning that ACLs are not evaluated in this build.
#[cfg(not(all(
    feature = "acl",
    any(target_os = "linux", target_os = "macos", target_os = "freebsd")
)))]
fn warn_acl_unsupported() {
    use std::sync::Once;

    static WARN_ONCE: Once = Once::new();
    WARN_ONCE.call_once(|| {
        tracing::warn!(
            target: "permcheck::acl",
            "ACLs are not supported on this platform; using permission bits only"
        );
    });
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn probe(path: &Path) -> FileMetadata {
        use std::os::unix::fs::MetadataExt;
        let metadata = fs::metadata(path).expect("metadata");
        FileMetadata::new(metadata.uid(), metadata.gid(), metadata.mode())
    }

    #[test]
    fn plain_file_loads_minimal_acl_or_unsupported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("plain");
        fs::write(&path, b"x").expect("write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).expect("chmod");

        match SystemAcl.load(&path, &probe(&path)).expect("load") {
            AclLoad::Entries(acl) => {
                // Files without extended entries expose exactly the mode bits.
                if acl.len() == 3 {
                    assert_eq!(acl, super::super::AccessAcl::from_mode(0o640));
                }
            }
            AclLoad::Unsupported => {}
        }
    }

    #[cfg(all(feature = "acl", target_os = "linux"))]
    mod linux {
        use super::super::*;
        use crate::acl::{AclEntry, AclPerm, AclTag};
        use crate::error::ErrorKind;
        use exacl::Perm;

        const PATH: &str = "/srv/shared/report.csv";

        fn convert(entries: &[exacl::AclEntry]) -> Result<crate::acl::AccessAcl, AccessError> {
            convert_entries(Path::new(PATH), &FileMetadata::new(0, 0, 0o600), entries)
        }

        #[test]
        fn missing_file_is_system_error() {
            let temp = tempfile::tempdir().expect("tempdir");
            let path = temp.path().join("absent");
            let metadata = FileMetadata::new(0, 0, 0o644);
            let error = SystemAcl.load(&path, &metadata).expect_err("missing");
            assert_eq!(error.kind(), ErrorKind::SystemError);
        }

        #[test]
        fn unsupported_errno_is_detected() {
            use std::io;
            assert!(is_unsupported(&io::Error::from_raw_os_error(libc::EOPNOTSUPP)));
            assert!(!is_unsupported(&io::Error::from_raw_os_error(libc::EACCES)));
            assert!(!is_unsupported(&io::Error::other("no errno")));
        }

        #[test]
        fn unnamed_entries_are_owner_and_owning_group() {
            let acl = convert(&[
                exacl::AclEntry::allow_user("", Perm::READ | Perm::WRITE, None),
                exacl::AclEntry::allow_group("", Perm::READ, None),
                exacl::AclEntry::allow_other(Perm::empty(), None),
            ])
            .expect("convert");
            assert_eq!(acl, crate::acl::AccessAcl::from_mode(0o640));
        }

        #[test]
        fn numeric_names_become_qualifiers() {
            let acl = convert(&[
                exacl::AclEntry::allow_user("", Perm::READ, None),
                exacl::AclEntry::allow_user("4242424", Perm::READ, None),
                exacl::AclEntry::allow_group("", Perm::empty(), None),
                exacl::AclEntry::allow_group("4343434", Perm::READ | Perm::EXECUTE, None),
                exacl::AclEntry::allow_mask(Perm::READ, None),
                exacl::AclEntry::allow_other(Perm::empty(), None),
            ])
            .expect("convert");
            assert!(acl
                .entries()
                .contains(&AclEntry::new(AclTag::User(4_242_424), AclPerm::READ)));
            assert!(acl.entries().contains(&AclEntry::new(
                AclTag::Group(4_343_434),
                AclPerm::READ | AclPerm::EXECUTE
            )));
            assert!(acl
                .entries()
                .contains(&AclEntry::new(AclTag::Mask, AclPerm::READ)));
        }

        #[test]
        fn unresolvable_name_is_malformed() {
            let error = convert(&[exacl::AclEntry::allow_group(
                "permcheck-no-such-group",
                Perm::READ,
                None,
            )])
            .expect_err("unknown group");
            assert_eq!(error.kind(), ErrorKind::UnsupportedAclQuery);
        }

        #[test]
        fn deny_entries_restricting_read_are_malformed() {
            let mut deny = exacl::AclEntry::allow_user("4242424", Perm::READ, None);
            deny.allow = false;
            let error = convert(&[deny]).expect_err("deny read");
            assert_eq!(error.kind(), ErrorKind::UnsupportedAclQuery);

            let mut deny_write = exacl::AclEntry::allow_user("4242424", Perm::WRITE, None);
            deny_write.allow = false;
            assert!(convert(&[deny_write]).expect("convert").is_empty());
        }
    }

    #[cfg(not(all(
        feature = "acl",
        any(target_os = "linux", target_os = "macos", target_os = "freebsd")
    )))]
    #[test]
    fn without_acl_support_everything_is_unsupported() {
        let metadata = FileMetadata::new(0, 0, 0o644);
        assert_eq!(
            SystemAcl.load(Path::new("/nonexistent"), &metadata).expect("load"),
            AclLoad::Unsupported
        );
    }
}
