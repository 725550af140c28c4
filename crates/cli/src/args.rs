//! crates/cli/src/args.rs
//! Command-line parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use access::GroupBufferPolicy;
use clap::{Arg, ArgAction, Command, builder::OsStringValueParser};
use logging::VerbosityConfig;

/// Program name used in usage text and diagnostics.
pub const PROGRAM_NAME: &str = "permcheck";

/// Deterministic help text describing the CLI surface.
pub(crate) const HELP_TEXT: &str = concat!(
    "Usage: permcheck [OPTIONS] USER PATH...\n",
    "\n",
    "Reports whether USER may read each PATH, honouring POSIX access ACLs\n",
    "where the filesystem supports them and permission bits otherwise.\n",
    "\n",
    "Options:\n",
    "  -h, --help              Show this help message and exit.\n",
    "  -V, --version           Output version information and exit.\n",
    "  -v, --verbose           Increase diagnostic output (repeatable).\n",
    "  -q, --quiet             Suppress per-path results and warnings.\n",
    "      --debug=FLAGS       Set subsystem levels, e.g. acl2,identity\n",
    "                          (subsystems: acl, identity, probe, decision, all).\n",
    "      --initial-groups=N  First group buffer capacity (default 10).\n",
    "      --group-increment=N Group buffer growth step (default 100).\n",
    "\n",
    "Exit status: 0 all allowed, 1 any denied, 2 usage error, 3 unknown user,\n",
    "4 file not found, 5 malformed ACL, 6 group list overflow, 7 system error.\n",
    "The highest applicable status wins.\n",
    "\n",
    "The PERMCHECK_LOG environment variable overrides -v and --debug with\n",
    "tracing filter directives.\n",
);

/// Parsed command produced by [`parse_args`].
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs {
    pub show_help: bool,
    pub show_version: bool,
    pub verbosity: VerbosityConfig,
    pub quiet: bool,
    pub policy: GroupBufferPolicy,
    pub user: Option<String>,
    pub paths: Vec<PathBuf>,
}

/// Builds the `clap` command used for parsing.
fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .value_name("FLAGS")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("initial-groups")
                .long("initial-groups")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("group-increment")
                .long("group-increment")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("user")
                .value_name("USER")
                .value_parser(OsStringValueParser::new()),
        )
        .arg(
            Arg::new("paths")
                .value_name("PATH")
                .action(ArgAction::Append)
                .num_args(0..)
                .value_parser(OsStringValueParser::new()),
        )
}

/// Reasons the command line is rejected.
#[derive(Debug, thiserror::Error)]
pub(crate) enum UsageError {
    #[error("{}", clap_message(.0))]
    Clap(#[from] clap::Error),
    #[error("{0}")]
    DebugFlag(String),
    #[error("user name is not valid UTF-8: {0:?}")]
    NonUtf8User(OsString),
    #[error("missing USER operand")]
    MissingUser,
    #[error("missing PATH operand")]
    MissingPath,
}

/// First line of a clap diagnostic without its own `error:` prefix.
fn clap_message(error: &clap::Error) -> String {
    let rendered = error.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_owned()
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
///
/// `--help` and `--version` are accepted without operands.
pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, UsageError>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();

    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    let show_help = matches.get_flag("help");
    let show_version = matches.get_flag("version");
    let quiet = matches.get_flag("quiet");

    let mut verbosity = if quiet {
        VerbosityConfig::quiet()
    } else {
        VerbosityConfig::from_verbose_level(matches.get_count("verbose"))
    };
    if let Some(flags) = matches.remove_many::<String>("debug") {
        for list in flags {
            verbosity
                .apply_debug_flags(&list)
                .map_err(UsageError::DebugFlag)?;
        }
    }

    let mut policy = GroupBufferPolicy::default();
    if let Some(initial) = matches.remove_one::<usize>("initial-groups") {
        policy = policy.initial_capacity(initial);
    }
    if let Some(increment) = matches.remove_one::<usize>("group-increment") {
        policy = policy.increment(increment);
    }

    let user = matches
        .remove_one::<OsString>("user")
        .map(|user| user.into_string().map_err(UsageError::NonUtf8User))
        .transpose()?;
    let paths = matches
        .remove_many::<OsString>("paths")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();

    let parsed = ParsedArgs {
        show_help,
        show_version,
        verbosity,
        quiet,
        policy,
        user,
        paths,
    };

    if parsed.show_help || parsed.show_version {
        return Ok(parsed);
    }
    if parsed.user.is_none() {
        return Err(UsageError::MissingUser);
    }
    if parsed.paths.is_empty() {
        return Err(UsageError::MissingPath);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_user_and_paths() {
        let parsed = parse_args(["permcheck", "alice", "/a", "/b"]).expect("parse");
        assert_eq!(parsed.user.as_deref(), Some("alice"));
        assert_eq!(parsed.paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert!(!parsed.quiet);
        assert_eq!(parsed.policy, GroupBufferPolicy::default());
    }

    #[test]
    fn counts_verbose_flags() {
        let parsed = parse_args(["permcheck", "-vv", "alice", "/a"]).expect("parse");
        assert_eq!(parsed.verbosity, VerbosityConfig::from_verbose_level(2));
    }

    #[test]
    fn quiet_wins_over_verbose() {
        let parsed = parse_args(["permcheck", "-v", "-q", "alice", "/a"]).expect("parse");
        assert!(parsed.quiet);
        assert!(parsed.verbosity.quiet);
    }

    #[test]
    fn debug_flags_accumulate() {
        let parsed = parse_args([
            "permcheck",
            "--debug=acl2",
            "--debug",
            "identity",
            "alice",
            "/a",
        ])
        .expect("parse");
        assert_eq!(parsed.verbosity.subsystems.acl, 2);
        assert_eq!(parsed.verbosity.subsystems.identity, 1);
    }

    #[test]
    fn unknown_debug_flag_is_rejected() {
        let error = parse_args(["permcheck", "--debug=flist", "alice", "/a"]).expect_err("flag");
        assert!(matches!(error, UsageError::DebugFlag(_)));
    }

    #[test]
    fn group_policy_options() {
        let parsed = parse_args([
            "permcheck",
            "--initial-groups=4",
            "--group-increment=0",
            "alice",
            "/a",
        ])
        .expect("parse");
        assert_eq!(parsed.policy.first_capacity(), 4);
        assert_eq!(parsed.policy.growth(), 1);
    }

    #[test]
    fn operands_are_required() {
        assert!(matches!(
            parse_args(["permcheck"]),
            Err(UsageError::MissingUser)
        ));
        assert!(matches!(
            parse_args(["permcheck", "alice"]),
            Err(UsageError::MissingPath)
        ));
    }

    #[test]
    fn help_needs_no_operands() {
        assert!(parse_args(["permcheck", "--help"]).expect("help").show_help);
        assert!(parse_args(["permcheck", "-V"]).expect("version").show_version);
    }

    #[test]
    fn paths_may_start_with_dash_after_separator() {
        let parsed = parse_args(["permcheck", "alice", "--", "-odd"]).expect("parse");
        assert_eq!(parsed.paths, vec![PathBuf::from("-odd")]);
    }

    #[test]
    fn unknown_option_is_usage_error() {
        let error = parse_args(["permcheck", "--frobnicate", "alice", "/a"]).expect_err("option");
        assert!(matches!(error, UsageError::Clap(_)));
        let message = error.to_string();
        assert!(message.contains("--frobnicate"), "{message}");
        assert!(!message.starts_with("error:"), "{message}");
        assert!(!message.contains('\n'), "{message}");
    }
}
