//! Command-line interface definitions for DupeDoctor.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, error format, config file) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Find byte-identical files
//! dupedoctor scan ~/Pictures
//!
//! # Match by normalized name, size and extension; write a manifest and report
//! dupedoctor scan ~/Documents --strategy metadata --criteria name,size,extension \
//!     --manifest files.csv --report duplicates.txt
//!
//! # Move duplicates into ~/Pictures/_quarantine_Pictures
//! dupedoctor quarantine ~/Pictures --mode move
//!
//! # Put everything back
//! dupedoctor undo ~/Pictures/_quarantine_Pictures
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::actions::MoveMode;
use crate::config::SettingsOverrides;
use crate::duplicates::{Criterion, StrategyKind};
use crate::scanner::IMAGE_EXTENSIONS;

/// Duplicate file finder with reversible quarantine.
///
/// DupeDoctor groups files by content hash or by metadata, keeps one
/// canonical file per group and moves or copies the rest into a quarantine
/// directory that can be restored later.
#[derive(Debug, Parser)]
#[command(name = "dupedoctor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Read settings from this TOML file instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for DupeDoctor.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory and report duplicate groups
    Scan(ScanArgs),
    /// Scan a directory, then quarantine every non-canonical duplicate
    Quarantine(QuarantineArgs),
    /// Restore files from a quarantine directory
    Undo(UndoArgs),
    /// Print the effective configuration as TOML
    Config,
}

/// Matching and filtering options shared by `scan` and `quarantine`.
#[derive(Debug, Clone, Default, Args)]
pub struct MatchArgs {
    /// Fingerprint strategy
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyKind>,

    /// Fields compared by the metadata strategy (comma separated)
    #[arg(long, value_enum, value_delimiter = ',', value_name = "FIELDS")]
    pub criteria: Option<Vec<Criterion>>,

    /// Extensions to skip (comma separated, leading dot optional)
    #[arg(long = "exclude-ext", value_delimiter = ',', value_name = "EXTS")]
    pub exclude_ext: Option<Vec<String>>,

    /// Only walk these extensions (comma separated)
    #[arg(long = "include-ext", value_delimiter = ',', value_name = "EXTS")]
    pub include_ext: Option<Vec<String>>,

    /// Only walk common image formats
    #[arg(long, conflicts_with = "include_ext")]
    pub images_only: bool,
}

impl MatchArgs {
    /// Command-line values as a settings layer.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        let include_extensions = if self.images_only {
            Some(IMAGE_EXTENSIONS.iter().map(|e| (*e).to_string()).collect())
        } else {
            self.include_ext.clone()
        };
        SettingsOverrides {
            strategy: self.strategy,
            criteria: self.criteria.clone(),
            exclude_extensions: self.exclude_ext.clone(),
            include_extensions,
            ..SettingsOverrides::default()
        }
    }
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory path to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub matching: MatchArgs,

    /// Console output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Write a metadata manifest CSV of every walked file
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Write the duplicate report to a text file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

/// Arguments for the quarantine subcommand.
#[derive(Debug, Args)]
pub struct QuarantineArgs {
    /// Directory path to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub matching: MatchArgs,

    /// What to do with duplicates (default: dry-run)
    #[arg(short, long, value_enum)]
    pub mode: Option<MoveMode>,

    /// Quarantine directory (default: <PATH>/_quarantine_<name>)
    #[arg(long, value_name = "DIR")]
    pub quarantine_dir: Option<PathBuf>,
}

impl QuarantineArgs {
    /// Command-line values as a settings layer.
    #[must_use]
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            mode: self.mode,
            quarantine_dir: self.quarantine_dir.clone(),
            ..self.matching.overrides()
        }
    }
}

/// Arguments for the undo subcommand.
#[derive(Debug, Args)]
pub struct UndoArgs {
    /// Quarantine directory to restore from
    #[arg(value_name = "QUARANTINE_DIR")]
    pub quarantine_dir: PathBuf,

    /// Copy the quarantine tree back structurally instead of replaying the move log
    #[arg(long)]
    pub mirror: bool,

    /// Target root for --mirror (default: parent of the quarantine directory)
    #[arg(long, value_name = "DIR", requires = "mirror")]
    pub root: Option<PathBuf>,

    /// Keep the move log after a fully successful replay
    #[arg(long, conflicts_with = "mirror")]
    pub keep_log: bool,
}

/// Console output format for scan results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
