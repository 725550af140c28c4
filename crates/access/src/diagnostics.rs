//! crates/access/src/diagnostics.rs
//! Query-scoped diagnostics.
//!
//! Every step of a query reports a [`QueryEvent`] to the [`QuerySink`] the
//! checker was constructed with. The default [`TracingSink`] forwards events
//! to `tracing` under the `permcheck::*` targets; [`MemorySink`] keeps them for
//! inspection.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::acl::{AclPerm, AclTag};
use crate::error::ErrorKind;
use crate::identity::RawUid;
use crate::probe::FileMetadata;
use crate::verdict::{ScopeKind, Verdict};

/// Identifies the query an event belongs to.
#[derive(Clone, Copy, Debug)]
pub struct QueryContext<'a> {
    /// The user whose access is checked.
    pub user: &'a str,
    /// The file being checked.
    pub path: &'a Path,
}

/// A step in the evaluation of one query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryEvent {
    /// The user name resolved to a uid.
    UserResolved {
        /// Resolved uid.
        uid: RawUid,
    },
    /// The file metadata snapshot was taken.
    MetadataProbed(FileMetadata),
    /// The filesystem reported no ACL support.
    AclUnsupported,
    /// One ACL entry was classified.
    AclEntry {
        /// The pass that inspected the entry.
        scope: ScopeKind,
        /// Entry tag.
        tag: AclTag,
        /// Entry permissions.
        perm: AclPerm,
        /// Whether the entry took part in the decision.
        applies: bool,
    },
    /// An ACL pass finished.
    AclPass {
        /// The pass.
        scope: ScopeKind,
        /// Some applicable entry granted read.
        has_read: bool,
        /// The mask (if any) allowed read.
        mask_allows_read: bool,
    },
    /// A mode-bit pass finished.
    TraditionalPass {
        /// The pass.
        scope: ScopeKind,
        /// Its verdict.
        verdict: Verdict,
    },
    /// Group memberships were enumerated.
    GroupsResolved {
        /// Number of memberships.
        count: usize,
    },
    /// The query produced a verdict.
    Finished(Verdict),
    /// The query failed.
    Failed(ErrorKind),
}

/// Receives the events of a query.
pub trait QuerySink {
    /// Records `event` for the query identified by `context`.
    fn record(&self, context: &QueryContext<'_>, event: &QueryEvent);
}

impl<T: QuerySink + ?Sized> QuerySink for &T {
    fn record(&self, context: &QueryContext<'_>, event: &QueryEvent) {
        (**self).record(context, event);
    }
}

/// Binds a sink to one query so evaluators can report without carrying the
/// user and path around.
#[derive(Clone, Copy)]
pub struct QueryLog<'a> {
    sink: &'a dyn QuerySink,
    context: QueryContext<'a>,
}

impl<'a> QueryLog<'a> {
    /// Creates a log for the query of `user` on `path`.
    pub fn new(sink: &'a dyn QuerySink, user: &'a str, path: &'a Path) -> Self {
        Self {
            sink,
            context: QueryContext { user, path },
        }
    }

    /// Records an event.
    pub fn emit(&self, event: QueryEvent) {
        self.sink.record(&self.context, &event);
    }

    /// Returns the query context.
    pub const fn context(&self) -> &QueryContext<'a> {
        &self.context
    }
}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl QuerySink for TracingSink {
    fn record(&self, context: &QueryContext<'_>, event: &QueryEvent) {
        let user = context.user;
        let path = context.path.display();
        match event {
            QueryEvent::UserResolved { uid } => {
                logging::trace_ident!("[{user} {path}] uid {uid}");
            }
            QueryEvent::MetadataProbed(metadata) => {
                logging::trace_probe!(
                    "[{user} {path}] owner {}:{} mode {:o}",
                    metadata.uid,
                    metadata.gid,
                    metadata.permissions()
                );
            }
            QueryEvent::AclUnsupported => {
                logging::trace_acl!("[{user} {path}] no ACL support, using mode bits");
            }
            QueryEvent::AclEntry {
                scope,
                tag,
                perm,
                applies,
            } => {
                logging::trace_acl!(
                    "[{user} {path}] {scope} pass: {tag} {perm} {}",
                    if *applies { "applies" } else { "skipped" }
                );
            }
            QueryEvent::AclPass {
                scope,
                has_read,
                mask_allows_read,
            } => {
                logging::trace_acl!(
                    "[{user} {path}] {scope} pass: read granted={has_read} mask allows={mask_allows_read}"
                );
            }
            QueryEvent::TraditionalPass { scope, verdict } => {
                logging::trace_decision!("[{user} {path}] mode bits, {scope} pass: {verdict}");
            }
            QueryEvent::GroupsResolved { count } => {
                logging::trace_ident!("[{user} {path}] member of {count} groups");
            }
            QueryEvent::Finished(verdict) => {
                logging::trace_decision!("[{user} {path}] {verdict}");
            }
            QueryEvent::Failed(kind) => {
                logging::trace_decision!("[{user} {path}] failed: {kind:?}");
            }
        }
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl QuerySink for NullSink {
    fn record(&self, _context: &QueryContext<'_>, _event: &QueryEvent) {}
}

/// Keeps events in memory, tagged with their query.
///
/// Single-threaded; give each worker its own sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: RefCell<Vec<RecordedEvent>>,
}

/// An event captured by [`MemorySink`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedEvent {
    /// The user of the query.
    pub user: String,
    /// The path of the query.
    pub path: PathBuf,
    /// The event.
    pub event: QueryEvent,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the captured events in order.
    pub fn events(&self) -> Vec<QueryEvent> {
        self.events
            .borrow()
            .iter()
            .map(|recorded| recorded.event.clone())
            .collect()
    }

    /// Returns the captured events with their query context.
    pub fn recorded(&self) -> Vec<RecordedEvent> {
        self.events.borrow().clone()
    }

    /// Removes and returns the captured events.
    pub fn take(&self) -> Vec<QueryEvent> {
        self.events
            .borrow_mut()
            .drain(..)
            .map(|recorded| recorded.event)
            .collect()
    }
}

impl QuerySink for MemorySink {
    fn record(&self, context: &QueryContext<'_>, event: &QueryEvent) {
        self.events.borrow_mut().push(RecordedEvent {
            user: context.user.to_owned(),
            path: context.path.to_path_buf(),
            event: event.clone(),
        });
    }
}
