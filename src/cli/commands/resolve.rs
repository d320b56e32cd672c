//! Resolve command - show which nginx version the environment requests

use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::config::{parse_buildpack_yml, BuildpackToml, Environment};
use crate::dependency;
use crate::error::{BuildpackError, BuildpackResult};
use crate::plan::{self, version_requests, Priorities, VersionSource};
use crate::NGINX;
use console::style;
use serde::Serialize;
use std::path::Path;

/// One ranked version request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub source: String,
    pub version: String,
    pub priority: i32,
}

/// Everything the resolve command reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Best first
    pub candidates: Vec<Candidate>,

    /// Constraint of the winning request
    pub constraint: String,

    /// Concrete version picked from `buildpack.toml`, if any matches
    pub selected: Option<String>,

    /// Why nothing matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs) -> BuildpackResult<()> {
    let env = Environment::from_process()?;
    let buildpack = BuildpackToml::from_file(&env.buildpack_root()?.join("buildpack.toml"))?;
    let app = match args.app {
        Some(app) => app,
        None => std::env::current_dir()
            .map_err(|e| BuildpackError::io("getting current directory", e))?,
    };

    let report = report(&app, &env, &buildpack)?;
    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Plain => print_plain(&report),
    }
    Ok(())
}

/// Rank the requests visible from `app` and try to select a dependency
pub fn report(app: &Path, env: &Environment, buildpack: &BuildpackToml) -> BuildpackResult<Report> {
    let legacy = parse_buildpack_yml(app)?;
    let requests = version_requests(env, &legacy, buildpack, true);
    let priorities = Priorities::default();

    let Some(resolution) = plan::resolve(NGINX, &requests, &priorities) else {
        return Err(BuildpackError::PlanEntryMissing(NGINX.to_string()));
    };

    let candidates = resolution
        .ranked
        .iter()
        .map(|entry| Candidate {
            source: entry
                .version_source()
                .map(VersionSource::to_string)
                .unwrap_or_default(),
            version: entry.requested_version().unwrap_or_default().to_string(),
            priority: priorities.rank(entry.version_source()),
        })
        .collect();

    let constraint = resolution
        .chosen
        .requested_version()
        .unwrap_or_default()
        .to_string();
    let (selected, error) =
        match dependency::resolve(buildpack, NGINX, &constraint, &env.stack_id) {
            Ok(dep) => (Some(dep.version.to_string()), None),
            Err(e) => (None, Some(e.to_string())),
        };

    Ok(Report {
        candidates,
        constraint,
        selected,
        error,
    })
}

fn print_table(report: &Report) {
    println!(
        "{:<20} {:<15} {:<8}",
        style("SOURCE").bold(),
        style("VERSION").bold(),
        style("PRIORITY").bold()
    );
    println!("{}", "-".repeat(45));

    for (i, candidate) in report.candidates.iter().enumerate() {
        let marker = if i == 0 {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{:<20} {:<15} {:<8} {}",
            candidate.source, candidate.version, candidate.priority, marker
        );
    }

    println!();
    match (&report.selected, &report.error) {
        (Some(version), _) => println!(
            "{} {} ({})",
            style("Selected:").bold(),
            style(version).green(),
            report.constraint
        ),
        (None, Some(error)) => println!("{} {}", style("Unresolved:").red().bold(), error),
        (None, None) => {}
    }
}

fn print_json(report: &Report) -> BuildpackResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(report: &Report) {
    if let Some(version) = &report.selected {
        println!("{}", version);
    }
}
