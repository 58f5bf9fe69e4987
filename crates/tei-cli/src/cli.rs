//! CLI argument definitions for the annotation tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tei-annotate",
    version,
    about = "Schema-constrained annotation for literary texts",
    long_about = "Validate and apply structural annotations against a RELAX NG schema.\n\n\
                  Documents are JSON files holding passages, entities, and relationships.\n\
                  Proposed tags are checked against the schema and the entity graph\n\
                  before any of them touch the document."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
    /// Show the tag and attribute constraints a schema declares.
    Schema(SchemaArgs),

    /// Validate queued tags against a schema and document without applying.
    Validate(ValidateArgs),

    /// Validate queued tags and apply the valid ones to the document.
    Apply(ApplyArgs),
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// Path to the RELAX NG schema file.
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Path to the RELAX NG schema file.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Path to the document JSON file.
    #[arg(long = "document", value_name = "PATH")]
    pub document: PathBuf,

    /// Path to the tags JSON file (an array of tag requests).
    #[arg(long = "tags", value_name = "PATH")]
    pub tags: PathBuf,

    /// Write a machine-readable validation report into this directory.
    #[arg(long = "report-json", value_name = "DIR")]
    pub report_json: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ApplyArgs {
    /// Path to the RELAX NG schema file.
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: PathBuf,

    /// Path to the document JSON file.
    #[arg(long = "document", value_name = "PATH")]
    pub document: PathBuf,

    /// Path to the tags JSON file (an array of tag requests).
    #[arg(long = "tags", value_name = "PATH")]
    pub tags: PathBuf,

    /// Where to write the updated document (default: overwrite the input).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write a machine-readable validation report into this directory.
    #[arg(long = "report-json", value_name = "DIR")]
    pub report_json: Option<PathBuf>,
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
