#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `access` answers one question: may a named local user read a given file?
//! The answer considers the file's POSIX access ACL when the filesystem
//! supports one and its permission bits otherwise.
//!
//! # Design
//!
//! [`AccessChecker`] drives a query through four collaborators, each behind a
//! trait so it can be replaced:
//!
//! - [`IdentityResolver`] turns a user name into a uid and, on demand, the
//!   user's supplementary groups
//! - [`FileProbe`] takes one metadata snapshot of the file
//! - [`AclSource`] loads the file's access ACL
//! - [`QuerySink`] receives a structured event for every decision step
//!
//! Evaluation always runs a user pass first and a group pass only when the
//! user pass did not allow. Group enumeration is therefore skipped whenever it
//! cannot change the answer.
//!
//! # Errors
//!
//! Every failure is an [`AccessError`]. A filesystem without ACL support is
//! not an error: the query silently falls back to permission bits. Malformed
//! ACL data, unknown users, missing files and failing system calls are.
//!
//! # Examples
//!
//! ```no_run
//! use access::{Verdict, permission_to_read};
//!
//! let verdict = permission_to_read("www-data", "/var/log/nginx/access.log")?;
//! if verdict == Verdict::Allowed {
//!     println!("readable");
//! }
//! # Ok::<(), access::AccessError>(())
//! ```

pub mod acl;
pub mod diagnostics;
mod decision;
mod error;
pub mod identity;
mod probe;
mod traditional;
mod verdict;

pub use acl::{AccessAcl, AclEntry, AclLoad, AclPerm, AclSource, AclTag, SystemAcl, evaluate_acl};
pub use decision::AccessChecker;
#[cfg(unix)]
pub use decision::permission_to_read;
pub use diagnostics::{MemorySink, NullSink, QueryEvent, QuerySink, TracingSink};
pub use error::{AccessError, ErrorKind};
pub use identity::{GroupBufferPolicy, GroupList, IdentityResolver, RawGid, RawUid, UserRecord};
#[cfg(unix)]
pub use identity::SystemDirectory;
#[cfg(unix)]
pub use probe::StatProbe;
pub use probe::{FileMetadata, FileProbe};
pub use traditional::{S_IRGRP, S_IROTH, S_IRUSR, evaluate_traditional};
pub use verdict::{AclOutcome, Scope, ScopeKind, Verdict};
