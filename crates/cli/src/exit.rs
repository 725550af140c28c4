//! crates/cli/src/exit.rs
//! Exit statuses.

use access::{ErrorKind, Verdict};

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Every path is readable.
pub const EXIT_ALLOWED: i32 = 0;
/// At least one path is not readable.
pub const EXIT_DENIED: i32 = 1;
/// The command line was rejected.
pub const EXIT_USAGE: i32 = 2;
/// The user does not exist.
pub const EXIT_USER_NOT_FOUND: i32 = 3;
/// A path does not exist.
pub const EXIT_FILE_NOT_FOUND: i32 = 4;
/// An ACL could not be interpreted.
pub const EXIT_MALFORMED_ACL: i32 = 5;
/// The user's group list could not be sized.
pub const EXIT_OVERFLOW: i32 = 6;
/// A system call failed.
pub const EXIT_SYSTEM: i32 = 7;

/// Status contributed by one verdict.
#[must_use]
pub const fn status_for_verdict(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Allowed => EXIT_ALLOWED,
        Verdict::Denied => EXIT_DENIED,
    }
}

/// Status contributed by one failed query.
#[must_use]
pub const fn status_for_error(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::UserNotFound => EXIT_USER_NOT_FOUND,
        ErrorKind::FileNotFound => EXIT_FILE_NOT_FOUND,
        ErrorKind::UnsupportedAclQuery => EXIT_MALFORMED_ACL,
        ErrorKind::Overflow => EXIT_OVERFLOW,
        ErrorKind::SystemError => EXIT_SYSTEM,
    }
}

/// Converts a numeric status into an [`ExitCode`](std::process::ExitCode),
/// clamping it to the range a process can report.
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(u8::try_from(clamped).unwrap_or(u8::MAX))
}
