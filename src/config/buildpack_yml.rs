//! Legacy `buildpack.yml` support
//!
//! Older apps pin the nginx version with
//!
//! ```yaml
//! nginx:
//!   version: 1.24.*
//! ```
//!
//! The file is deprecated in favour of `BP_NGINX_VERSION` but still honoured.

use crate::error::{BuildpackError, BuildpackResult};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// File name looked up in the working directory
pub const BUILDPACK_YML: &str = "buildpack.yml";

/// Warning shown whenever `buildpack.yml` supplies the version
pub const DEPRECATION_WARNING: &str =
    "Setting the nginx version through buildpack.yml is deprecated; use BP_NGINX_VERSION instead";

#[derive(Debug, Default, Deserialize)]
struct BuildpackYml {
    #[serde(default)]
    nginx: NginxSection,
}

#[derive(Debug, Default, Deserialize)]
struct NginxSection {
    #[serde(default)]
    version: Option<serde_yaml::Value>,
}

/// Result of looking for a legacy version pin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyVersion {
    /// Whether `buildpack.yml` exists at all
    pub exists: bool,

    /// `nginx.version`, when present and non-empty
    pub version: Option<String>,
}

/// Check for `buildpack.yml` in `dir` and extract its nginx version.
///
/// Absence is reported as `exists: false`, not an error. A file that
/// exists but cannot be parsed is a configuration error.
pub fn parse_version(dir: &Path) -> BuildpackResult<LegacyVersion> {
    let path = dir.join(BUILDPACK_YML);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(LegacyVersion {
                exists: false,
                version: None,
            })
        }
        Err(e) => {
            return Err(BuildpackError::io(
                format!("reading {}", path.display()),
                e,
            ))
        }
    };

    let parsed: BuildpackYml = if content.trim().is_empty() {
        BuildpackYml::default()
    } else {
        serde_yaml::from_str(&content).map_err(|e| BuildpackError::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })?
    };

    // YAML happily reads `version: 1.24` as a float; keep the user's text
    let version = match parsed.nginx.version {
        Some(serde_yaml::Value::String(s)) => Some(s),
        Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
        Some(serde_yaml::Value::Null) | None => None,
        Some(other) => {
            return Err(BuildpackError::ConfigInvalid {
                path,
                reason: format!("nginx.version must be a string, got {:?}", other),
            })
        }
    };

    Ok(LegacyVersion {
        exists: true,
        version: version.filter(|v| !v.trim().is_empty()),
    })
}
