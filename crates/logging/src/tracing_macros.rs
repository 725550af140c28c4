//! crates/logging/src/tracing_macros.rs
//! Convenience macros for permcheck-specific tracing.
//!
//! These macros wrap the standard tracing macros with the target of each
//! subsystem, so `--debug` flags and `PERMCHECK_LOG` directives can select
//! them individually. All of them emit at INFO, the level a bare
//! `--debug NAME` admits.

/// Emit an ACL loading or evaluation trace.
///
/// # Example
/// ```ignore
/// trace_acl!("{} carries {} entries", path.display(), count);
/// ```
#[macro_export]
macro_rules! trace_acl {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "permcheck::acl", $($arg)*);
    };
}

/// Emit a user or group resolution trace.
///
/// # Example
/// ```ignore
/// trace_ident!("user '{}' is in {} groups", user, count);
/// ```
#[macro_export]
macro_rules! trace_ident {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "permcheck::identity", $($arg)*);
    };
}

/// Emit a file metadata trace.
///
/// # Example
/// ```ignore
/// trace_probe!("{}: mode {:o}", path.display(), mode);
/// ```
#[macro_export]
macro_rules! trace_probe {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "permcheck::probe", $($arg)*);
    };
}

/// Emit a decision trace.
///
/// # Example
/// ```ignore
/// trace_decision!("{} may read {}", user, path.display());
/// ```
#[macro_export]
macro_rules! trace_decision {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "permcheck::decision", $($arg)*);
    };
}
