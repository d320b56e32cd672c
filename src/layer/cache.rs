//! Layer reuse decision
//!
//! A cached nginx layer stays valid only while both of these are unchanged:
//! the checksum of the nginx artifact, and the checksum of the `configure`
//! binary shipped with the buildpack. Either can change between buildpack
//! releases independently of the other.

use std::collections::BTreeMap;
use std::fmt;

/// Metadata keys persisted in the layer's TOML
pub mod keys {
    /// SHA-256 of the installed dependency
    pub const DEPENDENCY_SHA: &str = "dependency-sha";
    /// SHA-256 of the configure binary copied into exec.d
    pub const CONFIGURE_BIN_SHA: &str = "configure-bin-sha";
    /// RFC 3339 install time
    pub const BUILT_AT: &str = "built_at";
}

/// The two checksums that key a layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerChecksums {
    pub dependency_sha: String,
    pub configure_bin_sha: String,
}

impl LayerChecksums {
    /// Read both checksums from persisted metadata; `None` if either is
    /// missing or not a string
    pub fn from_metadata(metadata: &BTreeMap<String, toml::Value>) -> Option<Self> {
        let get = |key: &str| metadata.get(key).and_then(|v| v.as_str()).map(str::to_string);
        Some(Self {
            dependency_sha: get(keys::DEPENDENCY_SHA)?,
            configure_bin_sha: get(keys::CONFIGURE_BIN_SHA)?,
        })
    }

    /// Insert both checksums into a metadata map
    pub fn write_into(&self, metadata: &mut BTreeMap<String, toml::Value>) {
        metadata.insert(
            keys::DEPENDENCY_SHA.to_string(),
            toml::Value::String(self.dependency_sha.clone()),
        );
        metadata.insert(
            keys::CONFIGURE_BIN_SHA.to_string(),
            toml::Value::String(self.configure_bin_sha.clone()),
        );
    }
}

/// Why a layer must be reinstalled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReinstallReason {
    /// No usable checksums were persisted
    Miss,
    /// The nginx artifact changed
    DependencyChanged,
    /// The configure binary changed
    ConfigureChanged,
    /// Both changed
    BothChanged,
}

impl fmt::Display for ReinstallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Miss => write!(f, "no cached layer"),
            Self::DependencyChanged => write!(f, "dependency checksum changed"),
            Self::ConfigureChanged => write!(f, "configure binary checksum changed"),
            Self::BothChanged => write!(f, "dependency and configure binary checksums changed"),
        }
    }
}

/// Outcome of comparing persisted and current checksums
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    Reuse,
    Reinstall(ReinstallReason),
}

impl CacheDecision {
    /// Compare persisted layer metadata with the checksums of this build
    pub fn evaluate(persisted: &BTreeMap<String, toml::Value>, current: &LayerChecksums) -> Self {
        let Some(previous) = LayerChecksums::from_metadata(persisted) else {
            return Self::Reinstall(ReinstallReason::Miss);
        };

        let dependency_same = previous.dependency_sha == current.dependency_sha;
        let configure_same = previous.configure_bin_sha == current.configure_bin_sha;

        match (dependency_same, configure_same) {
            (true, true) => Self::Reuse,
            (false, true) => Self::Reinstall(ReinstallReason::DependencyChanged),
            (true, false) => Self::Reinstall(ReinstallReason::ConfigureChanged),
            (false, false) => Self::Reinstall(ReinstallReason::BothChanged),
        }
    }
}
