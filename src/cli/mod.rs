//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

pub mod commands;

/// Triage Xcode test results: tree listing, failure analysis, activity timelines
#[derive(Parser, Debug)]
#[command(name = "xctriage", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Program used to run xcresulttool
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::CommandName)]
    pub xcrun: Option<String>,

    /// Per-query timeout in seconds for the result-store tool
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a result tree, or analyze one test
    Show(ShowArgs),

    /// Find result bundles under a directory, newest first
    Find(FindArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ShowArgs {
    /// Result bundle, exported-JSON directory, or project directory
    #[arg(value_hint = ValueHint::AnyPath)]
    pub path: PathBuf,

    /// Test identifier or 1-based test-case index from the listing
    pub selector: Option<String>,

    /// Include the activity, attachment and console-log timeline
    #[arg(long, short = 'c')]
    pub console: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FindArgs {
    /// Directory to search
    #[arg(default_value = ".", value_hint = ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Show at most this many bundles
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o', value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}
