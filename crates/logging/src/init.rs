//! crates/logging/src/init.rs
//! Global subscriber installation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use logging::{VerbosityConfig, init_tracing};
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! init_tracing(&config);
//!
//! logging::trace_acl!("evaluating {} entries", 5);
//! ```

use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use super::config::VerbosityConfig;

/// Environment variable whose value replaces the configured directives.
pub const LOG_ENV: &str = "PERMCHECK_LOG";

/// Builds the event filter for `config`.
///
/// A valid [`LOG_ENV`] value wins over `config`; an invalid one is ignored so
/// a typo never silences errors.
#[must_use]
pub fn build_filter(config: &VerbosityConfig) -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(config.filter_directives()))
}

/// Installs a global subscriber writing to standard error.
///
/// Returns `false` when a global subscriber was already installed, in which
/// case the existing one stays in effect.
pub fn init_tracing(config: &VerbosityConfig) -> bool {
    init_tracing_with_writer(config, io::stderr)
}

/// Installs a global subscriber writing through `writer`.
pub fn init_tracing_with_writer<W>(config: &VerbosityConfig, writer: W) -> bool
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(false)
        .without_time();

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(layer)
        .try_init()
        .is_ok()
}
