//! Decisions against the live filesystem and user database.
#![cfg(unix)]

use access::{AccessChecker, ErrorKind, MemorySink, QueryEvent, Verdict, permission_to_read};
use test_support::{TestDir, current_user};

#[test]
fn owner_reads_private_file() {
    let dir = TestDir::new();
    let path = dir.file("private", 0o600);
    assert_eq!(
        permission_to_read(&current_user(), &path).expect("verdict"),
        Verdict::Allowed
    );
}

#[test]
fn no_permission_bits_deny_even_the_owner() {
    let dir = TestDir::new();
    let path = dir.file("sealed", 0o000);
    assert_eq!(
        permission_to_read(&current_user(), &path).expect("verdict"),
        Verdict::Denied
    );
}

#[test]
fn primary_group_grants_through_group_pass() {
    let dir = TestDir::new();
    let path = dir.file("shared", 0o040);
    let sink = MemorySink::new();
    let verdict = AccessChecker::system()
        .with_sink(&sink)
        .permission_to_read(&current_user(), &path)
        .expect("verdict");

    assert_eq!(verdict, Verdict::Allowed);
    assert!(
        sink.events()
            .iter()
            .any(|event| matches!(event, QueryEvent::GroupsResolved { count } if *count >= 1))
    );
}

#[test]
fn symlink_is_followed() {
    let dir = TestDir::new();
    let target = dir.file("target", 0o644);
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(&target, &link).expect("symlink");
    assert_eq!(
        permission_to_read(&current_user(), &link).expect("verdict"),
        Verdict::Allowed
    );
}

#[test]
fn dangling_symlink_is_file_not_found() {
    let dir = TestDir::new();
    let link = dir.path().join("dangling");
    std::os::unix::fs::symlink(dir.path().join("gone"), &link).expect("symlink");
    let error = permission_to_read(&current_user(), &link).expect_err("dangling");
    assert_eq!(error.kind(), ErrorKind::FileNotFound);
}

#[test]
fn missing_file_is_reported() {
    let dir = TestDir::new();
    let error = permission_to_read(&current_user(), dir.path().join("absent")).expect_err("missing");
    assert_eq!(error.kind(), ErrorKind::FileNotFound);
}

#[test]
fn unknown_user_is_reported() {
    let dir = TestDir::new();
    let path = dir.file("public", 0o644);
    let error = permission_to_read("permcheck-no-such-user", &path).expect_err("unknown user");
    assert_eq!(error.kind(), ErrorKind::UserNotFound);
}

#[test]
fn name_with_nul_is_unknown_user() {
    let dir = TestDir::new();
    let path = dir.file("public", 0o644);
    let error = permission_to_read("root\0evil", &path).expect_err("nul");
    assert_eq!(error.kind(), ErrorKind::UserNotFound);
}

#[cfg(all(target_os = "linux", feature = "acl"))]
mod extended_acl {
    use std::os::unix::fs::MetadataExt;
    use std::path::PathBuf;

    use access::{AclTag, Verdict, permission_to_read};
    use test_support::{AclBuilder, TestDir, current_user};

    /// Creates a file readable only through a named-group entry for its own
    /// group, limited by `mask`. Returns `None` when the filesystem has no
    /// ACL support.
    fn named_group_file(dir: &TestDir, mask: &str) -> Option<PathBuf> {
        let path = dir.file("shared", 0o600);
        let gid = std::fs::metadata(&path).expect("metadata").gid();
        let applied = AclBuilder::new()
            .entry(AclTag::UserObj, "-w-")
            .entry(AclTag::GroupObj, "---")
            .entry(AclTag::Group(gid), "r--")
            .entry(AclTag::Mask, mask)
            .entry(AclTag::Other, "---")
            .apply_to(&path);
        match applied {
            Ok(()) => Some(path),
            Err(error)
                if matches!(
                    error.raw_os_error(),
                    Some(code) if code == libc::EOPNOTSUPP || code == libc::ENOTSUP
                ) =>
            {
                None
            }
            Err(error) => panic!("setfacl: {error}"),
        }
    }

    #[test]
    fn named_group_with_reading_mask_is_allowed() {
        let dir = TestDir::new();
        let Some(path) = named_group_file(&dir, "r--") else {
            return;
        };
        assert_eq!(
            permission_to_read(&current_user(), &path).expect("verdict"),
            Verdict::Allowed
        );
    }

    #[test]
    fn mask_without_read_denies_named_group() {
        let dir = TestDir::new();
        let Some(path) = named_group_file(&dir, "-w-") else {
            return;
        };
        assert_eq!(
            permission_to_read(&current_user(), &path).expect("verdict"),
            Verdict::Denied
        );
    }
}
