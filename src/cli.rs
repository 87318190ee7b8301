use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Restore missing file extensions across archive trees and convert spooled
/// PostScript to PDF.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to the platform
    /// configuration directory.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// More logging; repeat for even more.
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    /// Less logging; repeat for even less.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub quiet: u8,
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Net verbosity: zero is the default `info` level.
    pub fn verbosity(&self) -> i16 {
        i16::from(self.verbose) - i16::from(self.quiet)
    }
}

#[derive(Debug, Default, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Process all roots on a fixed interval until interrupted.
    #[default]
    Run,
    /// Process all roots once, then exit.
    Once,
    /// Run a batch file (Windows) or shell script through the system shell.
    Script {
        script: PathBuf,
        /// Directory to run the script from.
        #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
        working_dir: PathBuf,
        /// Passed through to the script untouched.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}
