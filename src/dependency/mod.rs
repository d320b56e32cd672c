//! Dependency selection from the buildpack's catalogue
//!
//! A version constraint plus the current stack picks exactly one artifact:
//! the highest version that satisfies the constraint and is built for the
//! stack (or for any stack, `*`).

pub mod install;

pub use install::{deliver, InstallOutcome};

use crate::config::{BuildpackToml, DependencyEntry};
use crate::error::{BuildpackError, BuildpackResult};
use semver::{Version, VersionReq};
use std::fmt;
use tracing::debug;

/// Stack wildcard in `buildpack.toml`
const ANY_STACK: &str = "*";

/// The concrete artifact chosen for a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub id: String,
    pub name: String,
    pub version: Version,
    pub uri: String,
    pub sha256: String,
    pub stacks: Vec<String>,
    pub strip_components: u32,
}

impl fmt::Display for ResolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        };
        write!(f, "{} {}", name, self.version)
    }
}

/// Parse a constraint.
///
/// A bare version means exactly that version; a bare partial version such
/// as `1.24` means that whole line (`=1.24` matches any `1.24.x`).
fn parse_constraint(constraint: &str) -> BuildpackResult<VersionReq> {
    let trimmed = constraint.trim();
    let parsed = if Version::parse(trimmed).is_ok() || is_partial_version(trimmed) {
        VersionReq::parse(&format!("={}", trimmed))
    } else {
        VersionReq::parse(trimmed)
    };
    parsed.map_err(|e| BuildpackError::VersionConstraint {
        constraint: constraint.to_string(),
        reason: e.to_string(),
    })
}

/// One or two numeric components with no operator
fn is_partial_version(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() <= 2
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

fn supports_stack(entry: &DependencyEntry, stack: &str) -> bool {
    entry.stacks.iter().any(|s| s == ANY_STACK || s == stack)
}

/// Select the best matching dependency for `id` on `stack`
pub fn resolve(
    buildpack: &BuildpackToml,
    id: &str,
    constraint: &str,
    stack: &str,
) -> BuildpackResult<ResolvedDependency> {
    let req = parse_constraint(constraint)?;

    let mut best: Option<(Version, &DependencyEntry)> = None;
    for entry in buildpack.metadata.dependencies.iter().filter(|d| d.id == id) {
        let Ok(version) = Version::parse(&entry.version) else {
            debug!("Skipping {} with unparseable version {}", id, entry.version);
            continue;
        };
        if !req.matches(&version) || !supports_stack(entry, stack) {
            continue;
        }
        if best.as_ref().is_none_or(|(v, _)| version > *v) {
            best = Some((version, entry));
        }
    }

    let Some((version, entry)) = best else {
        let available: Vec<&str> = buildpack
            .metadata
            .dependencies
            .iter()
            .filter(|d| d.id == id)
            .map(|d| d.version.as_str())
            .collect();
        return Err(BuildpackError::DependencyNotFound {
            id: id.to_string(),
            constraint: constraint.to_string(),
            stack: stack.to_string(),
            available: if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            },
        });
    };

    debug!("Resolved {} {} -> {}", id, constraint, version);
    Ok(ResolvedDependency {
        id: entry.id.clone(),
        name: entry.name.clone(),
        version,
        uri: entry.uri.clone(),
        sha256: entry.sha256.clone(),
        stacks: entry.stacks.clone(),
        strip_components: entry.strip_components,
    })
}
