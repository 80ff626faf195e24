//! CLI argument definitions for the lookup table checker.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "elt",
    version,
    about = "Embedded lookup tables - check, match and normalize table documents",
    long_about = "Work with embedded lookup table documents.\n\n\
                  A table document is a JSON file holding the configuration, header types,\n\
                  line template, rules and optionally the real attribute combinations."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate the rules and line template of a table document.
    Check(CheckArgs),

    /// Find the rule matching an attribute combination.
    Match(MatchArgs),

    /// Rewrite a table document in canonical storage form.
    Normalize(NormalizeArgs),
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Path to the table document.
    #[arg(value_name = "DOC")]
    pub document: PathBuf,

    /// Skip placeholder materialization checks.
    #[arg(long = "no-materialize")]
    pub no_materialize: bool,

    /// Print the report as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct MatchArgs {
    /// Path to the table document.
    #[arg(value_name = "DOC")]
    pub document: PathBuf,

    /// Attribute of the combination, as `header=value` (repeatable).
    #[arg(long = "attr", value_name = "HEADER=VALUE")]
    pub attributes: Vec<String>,

    /// Print the match as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct NormalizeArgs {
    /// Path to the table document.
    #[arg(value_name = "DOC")]
    pub document: PathBuf,

    /// Write the normalized document here instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
