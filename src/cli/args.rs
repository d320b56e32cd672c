//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// nginx Cloud Native Buildpack
///
/// Implements the detect and build phases of the buildpack lifecycle.
#[derive(Parser, Debug)]
#[command(name = "nginx-cnb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide whether the app needs nginx and write the build plan
    Detect(DetectArgs),

    /// Install nginx into a layer and declare launch processes
    Build(BuildArgs),

    /// Show which nginx version the current environment would request
    Resolve(ResolveArgs),
}

/// Arguments passed to `bin/detect`
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Platform directory
    pub platform: PathBuf,

    /// Build plan output file
    pub plan: PathBuf,
}

/// Arguments passed to `bin/build`
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Layers directory
    pub layers: PathBuf,

    /// Platform directory
    pub platform: PathBuf,

    /// Resolved buildpack plan
    pub plan: PathBuf,
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// App directory (defaults to current directory)
    #[arg(short, long)]
    pub app: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for listings
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}
