#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` carries the diagnostic plumbing shared by the permcheck
//! workspace: subsystem tracing macros, a verbosity configuration driven by
//! `-v` counts and `--debug` flags, and installation of the global
//! `tracing` subscriber.
//!
//! # Design
//!
//! Every subsystem emits under its own target below `permcheck::`
//! ([`Subsystem::target`]). [`VerbosityConfig`] holds one level per
//! subsystem and renders them as `EnvFilter` directives, so
//! `PERMCHECK_LOG=permcheck::acl=trace` and `--debug acl3` select the same
//! events.
//!
//! # Examples
//!
//! ```
//! use logging::VerbosityConfig;
//!
//! let mut config = VerbosityConfig::from_verbose_level(1);
//! config.apply_debug_flags("acl2,identity").unwrap();
//! assert_eq!(
//!     config.filter_directives(),
//!     "warn,permcheck::acl=debug,permcheck::identity=info,permcheck::decision=info"
//! );
//! ```

mod config;
mod init;
mod levels;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use init::{LOG_ENV, build_filter, init_tracing, init_tracing_with_writer};
pub use levels::{Subsystem, SubsystemLevels, TARGET_ROOT, level_filter};
