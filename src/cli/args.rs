use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::config_cmd::ConfigArgs;
use super::kb::KbArgs;
use super::patterns::PatternsArgs;
use super::run::RunArgs;

#[derive(Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a test case's steps through the orchestrator
    Run(RunArgs),

    /// Inspect or maintain the knowledge store
    Kb(KbArgs),

    /// Inspect learned action patterns
    Patterns(PatternsArgs),

    /// Manage runner configuration
    Config(ConfigArgs),

    /// Show version and knowledge-store summary
    Info,
}
