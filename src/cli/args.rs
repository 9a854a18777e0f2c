//! Command-line argument parsing.

use std::path::PathBuf;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Watch for the trigger (default)
    Watch {
        config_path: Option<PathBuf>,
        /// Resolve and print the configuration, then exit
        check_only: bool,
    },
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Arguments could not be parsed
    Invalid(String),
}

/// Usage text for `--help` and argument errors.
pub const USAGE: &str = "\
Usage: trigger-watcher [OPTIONS]

Wait for an upstream trigger file and exit 0 once a fresh one appears.

Options:
  -c, --config <PATH>  JSON settings file (default: $TRIGGER_WATCH_CONFIG)
      --check-config   Print the resolved configuration and exit
  -V, --version        Print version
  -h, --help           Print help

Settings are read from the file, then overridden by environment variables.
Exit status: 0 detected, 1 not detected or configuration error, 130 interrupted.";

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use trigger_watcher::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["trigger-watcher".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut config_path = None;
    let mut check_only = false;

    // Skip the program name
    let mut args = args.skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--check-config" => check_only = true,
            "--config" | "-c" => match args.next() {
                Some(path) if !path.is_empty() => config_path = Some(PathBuf::from(path)),
                _ => return CliCommand::Invalid(format!("{} requires a path", arg)),
            },
            other => match other.strip_prefix("--config=") {
                Some(path) if !path.is_empty() => config_path = Some(PathBuf::from(path)),
                Some(_) => return CliCommand::Invalid("--config requires a path".to_string()),
                None => return CliCommand::Invalid(format!("unexpected argument '{}'", other)),
            },
        }
    }

    CliCommand::Watch {
        config_path,
        check_only,
    }
}
