//! crates/access/src/verdict.rs
//! Verdicts and evaluation scopes shared by the ACL and mode-bit evaluators.

use std::fmt;

use crate::identity::{GroupList, RawUid};

/// Final answer of a read-permission query.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Verdict {
    /// The user may read the file.
    Allowed,
    /// No grant was found.
    Denied,
}

impl Verdict {
    /// Returns `true` for [`Verdict::Allowed`].
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    const fn from_bool(allowed: bool) -> Self {
        if allowed { Self::Allowed } else { Self::Denied }
    }
}

impl From<bool> for Verdict {
    fn from(allowed: bool) -> Self {
        Self::from_bool(allowed)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
        })
    }
}

/// Outcome of an ACL evaluation.
///
/// `Unsupported` is deliberately distinct from `Denied`: it means the
/// filesystem has no ACL support and the caller must fall back to mode bits.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AclOutcome {
    /// An applicable entry grants read and the mask does not revoke it.
    Allowed,
    /// No applicable grant survived the mask.
    Denied,
    /// The filesystem does not support ACLs.
    Unsupported,
}

impl From<Verdict> for AclOutcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Allowed => Self::Allowed,
            Verdict::Denied => Self::Denied,
        }
    }
}

/// Which class of entries an evaluation pass considers.
///
/// The group pass can only be constructed from a resolved [`GroupList`], so
/// no evaluator can run group checks before enumeration happened.
#[derive(Clone, Copy, Debug)]
pub enum Scope<'a> {
    /// Owner, named-user and other entries, matched against a uid.
    User(RawUid),
    /// Owning-group and named-group entries, matched against group IDs.
    Group(&'a GroupList),
}

impl Scope<'_> {
    /// Returns the data-free discriminant, used in diagnostics.
    pub const fn kind(&self) -> ScopeKind {
        match self {
            Self::User(_) => ScopeKind::User,
            Self::Group(_) => ScopeKind::Group,
        }
    }
}

/// Data-free form of [`Scope`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ScopeKind {
    /// User pass.
    User,
    /// Group pass.
    Group,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Group => "group",
        })
    }
}
