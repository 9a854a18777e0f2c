//! Command-line interface.
//!
//! - Argument parsing
//! - Version display
//! - Exit status for usage errors

pub mod args;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use version::{version_line, VERSION};

/// Exit status for unparseable arguments.
pub const EXIT_USAGE: i32 = 2;
