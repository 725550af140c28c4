//! crates/access/src/error.rs
//! Error types for read-permission queries.

use std::io;
use std::path::{Path, PathBuf};

/// Coarse classification of an [`AccessError`].
///
/// Callers that only need to branch on the failure category (for example to
/// pick an exit status) match on this instead of the full error.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The user name is not known to the identity directory.
    UserNotFound,
    /// The file does not exist.
    FileNotFound,
    /// The file's ACL could not be interpreted.
    UnsupportedAclQuery,
    /// Group-count arithmetic would overflow.
    Overflow,
    /// Any other lower-layer failure.
    SystemError,
}

/// Error returned when a read-permission query cannot produce a verdict.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The user could not be found in the identity directory.
    #[error("unknown user '{user}'")]
    UserNotFound {
        /// The requested user name.
        user: String,
    },

    /// The file to check does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// The path that was probed.
        path: PathBuf,
    },

    /// The access ACL contained data the evaluator cannot interpret.
    #[error("malformed ACL on {}: {reason}", path.display())]
    UnsupportedAclQuery {
        /// The file carrying the ACL.
        path: PathBuf,
        /// What was wrong with the ACL.
        reason: String,
    },

    /// Growing the group buffer would overflow the platform size type.
    #[error("group list for '{user}' too large: {requested} entries")]
    Overflow {
        /// The user whose groups were being enumerated.
        user: String,
        /// The capacity that could not be represented.
        requested: usize,
    },

    /// An opaque lower-layer failure.
    #[error("failed to {context}: {source}")]
    SystemError {
        /// What was being attempted.
        context: &'static str,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl AccessError {
    /// Creates a [`AccessError::UserNotFound`] for `user`.
    pub fn user_not_found(user: impl Into<String>) -> Self {
        Self::UserNotFound { user: user.into() }
    }

    /// Creates a [`AccessError::FileNotFound`] for `path`.
    pub fn file_not_found(path: &Path) -> Self {
        Self::FileNotFound {
            path: path.to_path_buf(),
        }
    }

    /// Creates a [`AccessError::UnsupportedAclQuery`] describing a malformed ACL.
    pub fn malformed_acl(path: &Path, reason: impl Into<String>) -> Self {
        Self::UnsupportedAclQuery {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Creates a [`AccessError::SystemError`] with context.
    pub fn system(context: &'static str, source: io::Error) -> Self {
        Self::SystemError { context, source }
    }

    /// Returns the classification of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound { .. } => ErrorKind::UserNotFound,
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::UnsupportedAclQuery { .. } => ErrorKind::UnsupportedAclQuery,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::SystemError { .. } => ErrorKind::SystemError,
        }
    }
}
