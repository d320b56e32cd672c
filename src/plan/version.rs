//! Version token resolution and candidate requests
//!
//! Users may ask for `mainline` or `stable` instead of a constraint, or say
//! nothing at all. Both are mapped through the tables in `buildpack.toml`
//! before any ranking happens.

use crate::config::{BuildpackToml, Environment, LegacyVersion};
use crate::plan::entry::{PlanEntry, VersionSource};
use crate::NGINX;

/// Constraint used when `buildpack.toml` declares no default
pub const ANY_VERSION: &str = "*";

/// Resolve a raw version token to a constraint.
///
/// Empty maps to the declared default, a known alias to its version line.
/// Anything else passes through untouched; an invalid value fails later at
/// dependency lookup.
pub fn resolve_version(raw: &str, id: &str, buildpack: &BuildpackToml) -> String {
    let token = raw.trim();
    if token.is_empty() {
        return buildpack
            .default_version(id)
            .map(|d| resolve_alias(d, buildpack))
            .unwrap_or_else(|| ANY_VERSION.to_string());
    }
    resolve_alias(token, buildpack)
}

fn resolve_alias(token: &str, buildpack: &BuildpackToml) -> String {
    buildpack
        .version_line(token)
        .unwrap_or(token)
        .to_string()
}

/// Build the nginx version requests visible from the environment.
///
/// Always includes the `buildpack.toml` default, then the legacy file and
/// the environment override when they carry a version.
pub fn version_requests(
    env: &Environment,
    legacy: &LegacyVersion,
    buildpack: &BuildpackToml,
    launch: bool,
) -> Vec<PlanEntry> {
    let mut requests = vec![PlanEntry::new(NGINX)
        .with_version(resolve_version("", NGINX, buildpack), VersionSource::BuildpackToml)
        .with_launch(launch)];

    if let Some(version) = &legacy.version {
        requests.push(
            PlanEntry::new(NGINX)
                .with_version(
                    resolve_version(version, NGINX, buildpack),
                    VersionSource::BuildpackYml,
                )
                .with_launch(launch),
        );
    }

    if let Some(version) = &env.nginx_version {
        requests.push(
            PlanEntry::new(NGINX)
                .with_version(
                    resolve_version(version, NGINX, buildpack),
                    VersionSource::BpEnvVar,
                )
                .with_launch(launch),
        );
    }

    requests
}
