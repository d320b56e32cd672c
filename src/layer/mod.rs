//! Layer directories
//!
//! A layer is `<layers>/<name>/` plus a sibling `<layers>/<name>.toml`
//! describing how the lifecycle should treat it (`[types]`) and arbitrary
//! buildpack metadata (`[metadata]`). The metadata persists across builds
//! and drives the reuse decision in [`cache`].

pub mod cache;

pub use cache::{CacheDecision, LayerChecksums, ReinstallReason};

use crate::error::{BuildpackError, BuildpackResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// How the lifecycle exposes a layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTypes {
    #[serde(default)]
    pub launch: bool,

    #[serde(default)]
    pub build: bool,

    #[serde(default)]
    pub cache: bool,
}

/// Contents of `<layers>/<name>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerContent {
    #[serde(default)]
    pub types: LayerTypes,

    #[serde(default)]
    pub metadata: BTreeMap<String, toml::Value>,
}

/// A named layer under the layers directory
#[derive(Debug, Clone)]
pub struct Layer {
    name: String,
    path: PathBuf,
    metadata_path: PathBuf,
}

impl Layer {
    pub fn new(layers_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: layers_dir.join(name),
            metadata_path: layers_dir.join(format!("{}.toml", name)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    /// Read persisted layer content.
    ///
    /// A missing file is an empty layer. A file that cannot be read or
    /// parsed means the layer cannot be retrieved, which is fatal.
    pub fn read_content(&self) -> BuildpackResult<LayerContent> {
        let raw = match fs::read_to_string(&self.metadata_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(LayerContent::default()),
            Err(e) => {
                return Err(BuildpackError::LayerUnreadable {
                    name: self.name.clone(),
                    reason: format!("{}: {}", self.metadata_path.display(), e),
                })
            }
        };

        toml::from_str(&raw).map_err(|e| BuildpackError::LayerUnreadable {
            name: self.name.clone(),
            reason: format!("{}: {}", self.metadata_path.display(), e),
        })
    }

    /// Persist layer content
    pub fn write_content(&self, content: &LayerContent) -> BuildpackResult<()> {
        let raw = toml::to_string(content)?;
        fs::write(&self.metadata_path, raw).map_err(|e| {
            BuildpackError::io(
                format!("writing layer metadata {}", self.metadata_path.display()),
                e,
            )
        })
    }

    /// Discard everything in the layer and start empty
    pub fn reset(&self) -> BuildpackResult<()> {
        debug!("Resetting layer {}", self.path.display());
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BuildpackError::io(
                    format!("removing layer {}", self.path.display()),
                    e,
                ))
            }
        }
        match fs::remove_file(&self.metadata_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BuildpackError::io(
                    format!("removing {}", self.metadata_path.display()),
                    e,
                ))
            }
        }
        fs::create_dir_all(&self.path)
            .map_err(|e| BuildpackError::io(format!("creating layer {}", self.path.display()), e))
    }

    /// Set a launch-time environment variable, replacing any prior value
    pub fn launch_env_override(&self, name: &str, value: &str) -> BuildpackResult<()> {
        self.write_env_file("env.launch", &format!("{}.override", name), value)
    }

    /// Prepend to a variable for build and launch, joined with `delim`
    pub fn shared_env_prepend(&self, name: &str, value: &str, delim: &str) -> BuildpackResult<()> {
        self.write_env_file("env", &format!("{}.prepend", name), value)?;
        self.write_env_file("env", &format!("{}.delim", name), delim)
    }

    fn write_env_file(&self, dir: &str, file: &str, value: &str) -> BuildpackResult<()> {
        let dir = self.path.join(dir);
        fs::create_dir_all(&dir)
            .map_err(|e| BuildpackError::io(format!("creating {}", dir.display()), e))?;
        let path = dir.join(file);
        fs::write(&path, value)
            .map_err(|e| BuildpackError::io(format!("writing {}", path.display()), e))
    }

    /// Copy an executable into `exec.d/` so the launcher runs it before
    /// the process starts
    pub fn install_exec_d(&self, source: &Path, name: &str) -> BuildpackResult<PathBuf> {
        let dir = self.path.join("exec.d");
        fs::create_dir_all(&dir)
            .map_err(|e| BuildpackError::io(format!("creating {}", dir.display()), e))?;
        let target = dir.join(name);
        fs::copy(source, &target).map_err(|e| {
            BuildpackError::io(
                format!("copying {} to {}", source.display(), target.display()),
                e,
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(0o755))
                .map_err(|e| BuildpackError::io(format!("chmod {}", target.display()), e))?;
        }

        Ok(target)
    }
}
