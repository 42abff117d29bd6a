//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, event::EventCommands, import::ImportArgs, init::InitArgs,
    schema::SchemaArgs, validate::ValidateArgs, wizard::WizardCommands,
};

#[derive(Parser)]
#[command(name = "stagecraft")]
#[command(author, version, about = "Step-by-step event creation for cultural listings")]
#[command(long_about = "Create cultural events through validated multi-step wizards and keep them as plain YAML files.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .stagecraft/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new Stagecraft project
    Init(InitArgs),

    /// Create, edit and browse events
    #[command(subcommand)]
    Event(EventCommands),

    /// Inspect wizard definitions and check form files
    #[command(subcommand)]
    Wizard(WizardCommands),

    /// Validate stored events against the record schema
    Validate(ValidateArgs),

    /// Import events from a CSV file
    Import(ImportArgs),

    /// Print an embedded JSON Schema
    Schema(SchemaArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Replace `auto` with the project's configured default, if any
    pub fn or_configured(self, configured: Option<&str>) -> Self {
        match (self, configured) {
            (OutputFormat::Auto, Some(name)) => {
                OutputFormat::from_str(name, true).unwrap_or(OutputFormat::Auto)
            }
            (format, _) => format,
        }
    }
}
