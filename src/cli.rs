//! Command-line parsing.
//!
//! `-config=<path>` and `-D<key>=<value>` may appear anywhere on the command
//! line. They are pulled out before clap sees the rest, so they never count
//! toward a command's positional arguments.
use crate::config::{ConfigLocator, Overrides};
use crate::dispatch::usage;
use crate::error::SmatchError;
use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use std::path::PathBuf;

pub const CONFIG_PREFIX: &str = "-config=";
pub const OVERRIDE_PREFIX: &str = "-D";

/// Root CLI entrypoint: a command name followed by its positional arguments.
#[derive(Parser, Debug)]
#[command(
    name = "smatch",
    version,
    about = "Semantic matching of tree-shaped contexts",
    override_usage = "smatch <COMMAND> <ARGS>... [-config=<file.json>] [-D<key>=<value>]...",
    after_help = usage()
)]
pub struct RootArgs {
    /// Command to run (see Commands below)
    #[arg(value_name = "COMMAND")]
    pub command: Option<String>,

    /// Command arguments, usually file paths
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Flags extracted ahead of positional parsing.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SplitArgs {
    pub locator: ConfigLocator,
    pub overrides: Overrides,
    pub rest: Vec<String>,
}

/// Separate configuration flags from everything else, keeping the order of the
/// remaining arguments. The last `-config=` wins.
pub fn split_args<I>(args: I) -> SplitArgs
where
    I: IntoIterator<Item = String>,
{
    let mut split = SplitArgs::default();
    for arg in args {
        if let Some(path) = arg.strip_prefix(CONFIG_PREFIX) {
            split.locator = ConfigLocator::Named(PathBuf::from(path));
        } else if let Some((key, value)) = arg
            .strip_prefix(OVERRIDE_PREFIX)
            .and_then(|pair| pair.split_once('='))
            .filter(|(key, _)| !key.is_empty())
        {
            split.overrides.insert(key, value);
        } else {
            split.rest.push(arg);
        }
    }
    split
}

/// One command execution as requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub locator: ConfigLocator,
    pub overrides: Overrides,
    pub command: String,
    pub args: Vec<String>,
}

impl Invocation {
    /// An invocation against the embedded default configuration.
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Invocation {
            locator: ConfigLocator::Default,
            overrides: Overrides::new(),
            command: command.into(),
            args,
        }
    }
}

/// Parse a full argument vector, program name first.
///
/// Returns `Ok(None)` when no command was given.
pub fn parse_invocation<I>(argv: I) -> Result<Option<Invocation>, clap::Error>
where
    I: IntoIterator<Item = String>,
{
    let mut argv = argv.into_iter();
    let program = argv.next().unwrap_or_else(|| "smatch".to_string());
    let split = split_args(argv);
    let root = RootArgs::try_parse_from(std::iter::once(program).chain(split.rest))?;
    let Some(command) = root.command else {
        return Ok(None);
    };
    if let ConfigLocator::Named(path) = &split.locator {
        tracing::debug!(path = %path.display(), "configuration named on the command line");
    }
    Ok(Some(Invocation {
        locator: split.locator,
        overrides: split.overrides,
        command,
        args: root.args,
    }))
}

/// The usage error behind a clap failure, or `None` when clap should print
/// help or version text itself.
pub fn usage_error(err: &clap::Error) -> Option<SmatchError> {
    if matches!(
        err.kind(),
        ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    ) {
        return None;
    }
    let rendered = err.to_string();
    let reason = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ");
    Some(SmatchError::usage(format!("invalid command line: {reason}")))
}
