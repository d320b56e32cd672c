//! Error types for the nginx buildpack
//!
//! All modules use `BuildpackResult<T>` as their return type.

use crate::config::vars;
use std::path::PathBuf;
use thiserror::Error;

const TEMPLATE_HINT: &str =
    "Template actions are {{env \"NAME\"}}, {{port}}, {{tempDir}}, {{module \"name\"}}";

/// Result type alias for buildpack operations
pub type BuildpackResult<T> = Result<T, BuildpackError>;

/// All errors that can occur while detecting, building or configuring
#[derive(Error, Debug)]
pub enum BuildpackError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid value for {name}: {value:?} ({reason})")]
    EnvInvalid {
        name: String,
        value: String,
        reason: String,
    },

    // Resolution errors
    #[error("No {id} dependency matches version {constraint:?} on stack {stack} (available: {available})")]
    DependencyNotFound {
        id: String,
        constraint: String,
        stack: String,
        available: String,
    },

    #[error("Invalid version constraint {constraint:?}: {reason}")]
    VersionConstraint { constraint: String, reason: String },

    #[error("Build plan has no entry for {0}")]
    PlanEntryMissing(String),

    // Layer errors
    #[error("Layer {name} cannot be retrieved: {reason}")]
    LayerUnreadable { name: String, reason: String },

    // Install errors
    #[error("Download failed for {uri}: {reason}")]
    Download { uri: String, reason: String },

    #[error("Checksum mismatch for {uri}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        uri: String,
        expected: String,
        actual: String,
    },

    // Render errors
    #[error("Failed to parse include pattern {pattern:?} in {source_file}: {reason}")]
    IncludePattern {
        pattern: String,
        source_file: PathBuf,
        reason: String,
    },

    #[error("Failed to render template {path}: {reason}")]
    Template { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl BuildpackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a template error for a file
    pub fn template(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Template {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DependencyNotFound { .. } => {
                Some("Set BP_NGINX_VERSION to one of the available versions, or to mainline/stable")
            }
            Self::EnvInvalid { name, .. } if name == vars::STUB_STATUS_PORT => {
                Some("Ports are whole numbers from 0 to 65535")
            }
            Self::EnvInvalid { .. } => Some("Boolean variables accept true/false or 1/0"),
            Self::LayerUnreadable { .. } => Some("Clear the build cache and rebuild"),
            Self::Template { .. } => Some(TEMPLATE_HINT),
            _ => None,
        }
    }
}
