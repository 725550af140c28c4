#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `permcheck` command-line front-end: given a user name
//! and one or more paths, it reports whether the user may read each path and
//! summarises the outcome in the exit status.
//!
//! # Design
//!
//! The crate exposes [`run`] as the primary entry point. The function accepts
//! an iterator of arguments together with handles for standard output and
//! error so tests can drive it without spawning a process. A
//! [`clap`](https://docs.rs/clap/) command definition parses the options;
//! each path is then checked with an [`access::AccessChecker`] built from the
//! host's user directory and filesystem.
//!
//! # Invariants
//!
//! - `run` never panics; failures surface as exit statuses.
//! - Results go to standard output as `allowed: PATH` or `denied: PATH`, one
//!   line per path in argument order, unless `--quiet` is given.
//! - Errors go to standard error as `permcheck: error: ...` and never stop
//!   the remaining paths from being checked.
//! - The exit status is the highest status contributed by any path.
//!
//! # Examples
//!
//! ```
//! use cli::run;
//!
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = run(["permcheck", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("permcheck "));
//! ```

mod args;
mod exit;

use std::ffi::OsString;
use std::fmt::Display;
use std::io::Write;

use args::{HELP_TEXT, ParsedArgs, parse_args};

pub use args::PROGRAM_NAME;
pub use exit::{
    EXIT_ALLOWED, EXIT_DENIED, EXIT_FILE_NOT_FOUND, EXIT_MALFORMED_ACL, EXIT_OVERFLOW,
    EXIT_SYSTEM, EXIT_USAGE, EXIT_USER_NOT_FOUND, exit_code_from, status_for_error,
    status_for_verdict,
};

/// Writes `permcheck: error: {message}` to `stderr`.
fn report_error<Err: Write>(stderr: &mut Err, message: impl Display) {
    let _ = writeln!(stderr, "{PROGRAM_NAME}: error: {message}");
}

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Returns the process exit status; see the `EXIT_*` constants.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => {
            report_error(stderr, error);
            let _ = writeln!(stderr, "Try '{PROGRAM_NAME} --help' for more information.");
            EXIT_USAGE
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    if parsed.show_help {
        if stdout.write_all(HELP_TEXT.as_bytes()).is_err() {
            return EXIT_SYSTEM;
        }
        return EXIT_ALLOWED;
    }

    if parsed.show_version {
        if writeln!(stdout, "{PROGRAM_NAME} {}", env!("CARGO_PKG_VERSION")).is_err() {
            return EXIT_SYSTEM;
        }
        return EXIT_ALLOWED;
    }

    logging::init_tracing(&parsed.verbosity);
    check_paths(parsed, stdout, stderr)
}

#[cfg(unix)]
fn check_paths<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    use access::{AccessChecker, StatProbe, SystemAcl, SystemDirectory};

    let ParsedArgs {
        quiet,
        policy,
        user,
        paths,
        ..
    } = parsed;
    let Some(user) = user else {
        report_error(stderr, "missing USER operand");
        return EXIT_USAGE;
    };

    let checker = AccessChecker::new(
        SystemDirectory::new().with_policy(policy),
        StatProbe,
        SystemAcl,
    );

    let mut status = EXIT_ALLOWED;
    for path in &paths {
        let contributed = match checker.permission_to_read(&user, path) {
            Ok(verdict) => {
                if !quiet && writeln!(stdout, "{verdict}: {}", path.display()).is_err() {
                    return EXIT_SYSTEM;
                }
                status_for_verdict(verdict)
            }
            Err(error) => {
                report_error(stderr, &error);
                status_for_error(error.kind())
            }
        };
        status = status.max(contributed);
    }

    if stdout.flush().is_err() {
        return status.max(EXIT_SYSTEM);
    }
    status
}

#[cfg(not(unix))]
fn check_paths<Out, Err>(_parsed: ParsedArgs, _stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    report_error(stderr, "read-permission checks are not supported on this platform");
    EXIT_SYSTEM
}
