//! Schema for the buildpack's own `buildpack.toml`
//!
//! Holds the dependency catalogue, the default version per dependency and
//! the symbolic version lines (`mainline`, `stable`). Loaded once per
//! invocation and passed by reference.

use crate::error::{BuildpackError, BuildpackResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Root of `buildpack.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildpackToml {
    /// Buildpack identity
    #[serde(default)]
    pub buildpack: BuildpackInfo,

    /// Dependency catalogue and version tables
    #[serde(default)]
    pub metadata: BuildpackMetadata,
}

/// `[buildpack]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildpackInfo {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,
}

/// `[metadata]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildpackMetadata {
    /// Dependency id -> default version constraint
    #[serde(default)]
    pub default_versions: HashMap<String, String>,

    /// Symbolic alias -> version constraint
    #[serde(default)]
    pub version_lines: HashMap<String, String>,

    /// Installable artifacts
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

/// One `[[metadata.dependencies]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencyEntry {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub version: String,

    pub uri: String,

    pub sha256: String,

    /// Compatible stack ids; `*` matches any stack
    #[serde(default)]
    pub stacks: Vec<String>,

    /// Leading path components to drop when extracting
    #[serde(default)]
    pub strip_components: u32,
}

impl BuildpackToml {
    /// Parse `buildpack.toml` from disk
    pub fn from_file(path: &Path) -> BuildpackResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BuildpackError::io(format!("reading {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| BuildpackError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse from a TOML string
    pub fn parse(content: &str) -> BuildpackResult<Self> {
        toml::from_str(content).map_err(|e| BuildpackError::ConfigInvalid {
            path: "buildpack.toml".into(),
            reason: e.to_string(),
        })
    }

    /// Declared default version constraint for a dependency id
    pub fn default_version(&self, id: &str) -> Option<&str> {
        self.metadata.default_versions.get(id).map(String::as_str)
    }

    /// Constraint an alias such as `mainline` stands for
    pub fn version_line(&self, alias: &str) -> Option<&str> {
        self.metadata.version_lines.get(alias).map(String::as_str)
    }

    /// Human-readable title for build output
    pub fn title(&self) -> &str {
        if self.buildpack.name.is_empty() {
            "Nginx Server Buildpack"
        } else {
            &self.buildpack.name
        }
    }
}

#[cfg(test)]
pub(crate) const TEST_BUILDPACK_TOML: &str = r#"
api = "0.7"

[buildpack]
id = "example/nginx"
name = "Nginx Server Buildpack"
version = "0.1.0"

[metadata]
[metadata.default-versions]
nginx = "1.25.*"

[metadata.version-lines]
mainline = "1.25.*"
stable = "1.24.*"

[[metadata.dependencies]]
id = "nginx"
name = "Nginx Server"
version = "1.24.0"
uri = "https://example.org/nginx-1.24.0.tgz"
sha256 = "aaaa"
stacks = ["io.buildpacks.stacks.jammy"]

[[metadata.dependencies]]
id = "nginx"
name = "Nginx Server"
version = "1.25.3"
uri = "https://example.org/nginx-1.25.3.tgz"
sha256 = "bbbb"
stacks = ["io.buildpacks.stacks.jammy"]
strip-components = 1

[[metadata.dependencies]]
id = "nginx"
name = "Nginx Server"
version = "1.25.4"
uri = "https://example.org/nginx-1.25.4.tgz"
sha256 = "cccc"
stacks = ["*"]

[[metadata.dependencies]]
id = "watchexec"
version = "1.25.1"
uri = "https://example.org/watchexec.tgz"
sha256 = "dddd"
stacks = ["*"]
"#;
