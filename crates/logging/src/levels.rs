//! crates/logging/src/levels.rs
//! Subsystem names and per-subsystem verbosity levels.

use std::fmt;

use tracing::level_filters::LevelFilter;

/// Root of every tracing target emitted by the workspace.
pub const TARGET_ROOT: &str = "permcheck";

/// Diagnostic categories, one per stage of a permission query.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Subsystem {
    /// ACL loading and entry evaluation.
    Acl,
    /// User and group resolution.
    Identity,
    /// File metadata probing.
    Probe,
    /// Pass results and final verdicts.
    Decision,
}

impl Subsystem {
    /// Every subsystem, in display order.
    pub const ALL: [Self; 4] = [Self::Acl, Self::Identity, Self::Probe, Self::Decision];

    /// Flag name accepted by [`VerbosityConfig::apply_debug_flag`](crate::VerbosityConfig::apply_debug_flag).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Acl => "acl",
            Self::Identity => "identity",
            Self::Probe => "probe",
            Self::Decision => "decision",
        }
    }

    /// Tracing target the subsystem's macro emits under.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Acl => "permcheck::acl",
            Self::Identity => "permcheck::identity",
            Self::Probe => "permcheck::probe",
            Self::Decision => "permcheck::decision",
        }
    }

    /// Looks up a subsystem by flag name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|subsystem| subsystem.name() == name)
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Verbosity level for each subsystem.
///
/// Level 0 shows warnings only, 1 adds informational events, 2 adds debug
/// events and 3 or more shows everything.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubsystemLevels {
    /// ACL loading and evaluation level.
    pub acl: u8,
    /// Identity resolution level.
    pub identity: u8,
    /// Metadata probe level.
    pub probe: u8,
    /// Decision level.
    pub decision: u8,
}

impl SubsystemLevels {
    /// Get the level for a specific subsystem.
    #[must_use]
    pub const fn get(&self, subsystem: Subsystem) -> u8 {
        match subsystem {
            Subsystem::Acl => self.acl,
            Subsystem::Identity => self.identity,
            Subsystem::Probe => self.probe,
            Subsystem::Decision => self.decision,
        }
    }

    /// Set the level for a specific subsystem.
    pub const fn set(&mut self, subsystem: Subsystem, level: u8) {
        match subsystem {
            Subsystem::Acl => self.acl = level,
            Subsystem::Identity => self.identity = level,
            Subsystem::Probe => self.probe = level,
            Subsystem::Decision => self.decision = level,
        }
    }

    /// Set all subsystems to the specified level.
    pub const fn set_all(&mut self, level: u8) {
        self.acl = level;
        self.identity = level;
        self.probe = level;
        self.decision = level;
    }
}

/// Maps a subsystem level to the most verbose tracing level it admits.
#[must_use]
pub const fn level_filter(level: u8) -> LevelFilter {
    match level {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
