//! Build plan entries
//!
//! A plan entry is one buildpack's request for a named dependency. The
//! metadata table on the wire is free-form; here it is a fixed struct with
//! optional fields so nothing downstream needs to inspect dynamic values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a requested version came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VersionSource {
    /// `BP_NGINX_VERSION`
    BpEnvVar,
    /// Legacy `buildpack.yml`
    BuildpackYml,
    /// Default from the buildpack's `buildpack.toml`
    BuildpackToml,
    /// Any other tag, kept verbatim for display
    Unknown(String),
}

impl VersionSource {
    /// Wire tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::BpEnvVar => "BP_NGINX_VERSION",
            Self::BuildpackYml => "buildpack.yml",
            Self::BuildpackToml => "buildpack.toml",
            Self::Unknown(s) => s,
        }
    }
}

impl From<String> for VersionSource {
    fn from(s: String) -> Self {
        match s.as_str() {
            "BP_NGINX_VERSION" => Self::BpEnvVar,
            "buildpack.yml" => Self::BuildpackYml,
            "buildpack.toml" => Self::BuildpackToml,
            _ => Self::Unknown(s),
        }
    }
}

impl From<VersionSource> for String {
    fn from(source: VersionSource) -> Self {
        source.as_str().to_string()
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Typed plan entry metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_source: Option<VersionSource>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub launch: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub build: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A request for a named dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub name: String,

    /// Top-level version, used by older plan formats
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub metadata: EntryMetadata,
}

impl PlanEntry {
    /// Entry with no version or flags
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            metadata: EntryMetadata::default(),
        }
    }

    /// Set the requested version and its source
    pub fn with_version(mut self, version: impl Into<String>, source: VersionSource) -> Self {
        self.metadata.version = Some(version.into());
        self.metadata.version_source = Some(source);
        self
    }

    /// Request the dependency at launch time
    pub fn with_launch(mut self, launch: bool) -> Self {
        self.metadata.launch = launch;
        self
    }

    /// Request the dependency at build time
    pub fn with_build(mut self, build: bool) -> Self {
        self.metadata.build = build;
        self
    }

    /// Requested version; metadata wins over the top-level field
    pub fn requested_version(&self) -> Option<&str> {
        self.metadata
            .version
            .as_deref()
            .or(self.version.as_deref())
            .filter(|v| !v.is_empty())
    }

    /// Source tag, if any
    pub fn version_source(&self) -> Option<&VersionSource> {
        self.metadata.version_source.as_ref()
    }
}
