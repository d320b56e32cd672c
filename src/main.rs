//! nginx Cloud Native Buildpack
//!
//! Entry point for `bin/detect`, `bin/build` and the `resolve` diagnostic.

use clap::Parser;
use console::style;
use nginx_cnb::cli::{self, Cli, Commands};
use nginx_cnb::config::vars;
use nginx_cnb::error::BuildpackResult;
use nginx_cnb::log::{debug_requested, init_tracing};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> BuildpackResult<()> {
    let cli = Cli::parse_from(cli::lifecycle_args(std::env::args_os().collect()));

    let level = std::env::var(vars::LOG_LEVEL).ok();
    let verbosity = if debug_requested(level.as_deref()) {
        cli.verbose.max(2)
    } else {
        cli.verbose
    };
    init_tracing(verbosity);

    match cli.command {
        Commands::Detect(args) => cli::commands::detect(args),
        Commands::Build(args) => cli::commands::build(args),
        Commands::Resolve(args) => cli::commands::resolve(args),
    }
}
