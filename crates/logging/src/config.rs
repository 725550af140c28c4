//! crates/logging/src/config.rs
//! Verbosity configuration and its translation into filter directives.

use super::levels::{Subsystem, SubsystemLevels, level_filter};

/// Combined verbosity configuration for every subsystem.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Per-subsystem levels.
    pub subsystems: SubsystemLevels,
    /// Suppresses everything below errors, overriding the levels.
    pub quiet: bool,
}

impl VerbosityConfig {
    /// Create a configuration from a `-v` count.
    ///
    /// - 0: warnings only
    /// - 1: verdicts and pass results
    /// - 2: every subsystem at debug
    /// - 3 and above: every subsystem at trace
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();

        match level {
            0 => {}
            1 => {
                config.subsystems.decision = 1;
            }
            2 => {
                config.subsystems.set_all(2);
            }
            _ => {
                config.subsystems.set_all(3);
            }
        }

        config
    }

    /// Create a configuration that only reports errors.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    /// Apply a single subsystem token (e.g., "acl2", "identity").
    ///
    /// A bare name means level 1; "all" applies the level to every subsystem.
    pub fn apply_debug_flag(&mut self, token: &str) -> Result<(), String> {
        let (name, level) = parse_flag_token(token)?;

        if name == "all" {
            self.subsystems.set_all(level);
            return Ok(());
        }

        let subsystem =
            Subsystem::from_name(name).ok_or_else(|| format!("unknown debug flag: {name}"))?;
        self.subsystems.set(subsystem, level);
        Ok(())
    }

    /// Apply a comma-separated list of tokens.
    pub fn apply_debug_flags(&mut self, list: &str) -> Result<(), String> {
        list.split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .try_for_each(|token| self.apply_debug_flag(token))
    }

    /// Renders the configuration as `EnvFilter` directives.
    ///
    /// The global default stays at `warn` so third-party crates do not flood
    /// the output; each subsystem target gets its own level.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        if self.quiet {
            return "error".to_owned();
        }

        let mut directives = String::from("warn");
        for subsystem in Subsystem::ALL {
            let level = self.subsystems.get(subsystem);
            if level > 0 {
                directives.push(',');
                directives.push_str(subsystem.target());
                directives.push('=');
                directives.push_str(&level_filter(level).to_string().to_lowercase());
            }
        }
        directives
    }
}

/// Parse a flag token like "acl2" into ("acl", 2) or "probe" into ("probe", 1).
fn parse_flag_token(token: &str) -> Result<(&str, u8), String> {
    if token.is_empty() {
        return Err("empty flag token".to_owned());
    }

    match token.find(|c: char| c.is_ascii_digit()) {
        Some(0) => Err(format!("missing flag name in: {token}")),
        Some(pos) => {
            let (name, level_str) = token.split_at(pos);
            let level = level_str
                .parse::<u8>()
                .map_err(|_| format!("invalid level in flag: {token}"))?;
            Ok((name, level))
        }
        None => Ok((token, 1)),
    }
}
