//! Build plan handling
//!
//! Detect writes a plan of what this buildpack provides and requires;
//! build reads back the entries the lifecycle merged for it.

pub mod entry;
pub mod resolve;
pub mod version;

pub use entry::{EntryMetadata, PlanEntry, VersionSource};
pub use resolve::{resolve, Priorities, Resolution};
pub use version::{resolve_version, version_requests};

use crate::error::{BuildpackError, BuildpackResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A dependency this buildpack can provide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provision {
    pub name: String,
}

/// Plan written by detect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectPlan {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<Provision>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<PlanEntry>,
}

impl DetectPlan {
    /// Write the plan as TOML
    pub fn write(&self, path: &Path) -> BuildpackResult<()> {
        let content = toml::to_string(self)?;
        fs::write(path, content)
            .map_err(|e| BuildpackError::io(format!("writing build plan {}", path.display()), e))
    }
}

/// Plan handed to build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

impl BuildPlan {
    /// Read the plan from TOML
    pub fn from_file(path: &Path) -> BuildpackResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BuildpackError::io(format!("reading build plan {}", path.display()), e))?;
        toml::from_str(&content).map_err(|e| BuildpackError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
