//! The functions nginx configuration templates may call

use crate::render::template::FuncTable;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// Inputs the template functions read
pub struct RenderContext {
    /// App-provided modules, checked first
    pub local_modules: PathBuf,

    /// Buildpack-provided modules, the fallback
    pub global_modules: PathBuf,

    /// Value of `{{tempDir}}`
    pub temp_dir: PathBuf,

    /// Environment lookup for `{{env}}` and `{{port}}`
    pub lookup: Box<dyn Fn(&str) -> Option<String>>,
}

impl RenderContext {
    /// Context reading the process environment and system temp directory
    pub fn from_process(local_modules: PathBuf, global_modules: PathBuf) -> Self {
        Self {
            local_modules,
            global_modules,
            temp_dir: std::env::temp_dir(),
            lookup: Box::new(|name| std::env::var(name).ok()),
        }
    }

    fn var(&self, name: &str) -> String {
        (self.lookup)(name).unwrap_or_default()
    }

    /// The function table for this context
    pub fn functions(&self) -> FuncTable<'_> {
        FuncTable::new()
            .register("env", 1, |args| Ok(self.var(&args[0])))
            .register("port", 0, |_| Ok(self.var("PORT")))
            .register("tempDir", 0, |_| Ok(self.temp_dir.display().to_string()))
            .register("module", 1, |args| {
                let path = resolve_module(&args[0], &self.local_modules, &self.global_modules)
                    .map_err(|e| format!("resolving module {}: {}", args[0], e))?;
                Ok(format!("load_module {};", path.display()))
            })
    }
}

/// Find `<name>.so`, preferring the local directory.
///
/// Falls back to the global directory whenever the local file is absent,
/// without checking that the global file exists. Errors other than
/// not-found on the local path are returned.
pub fn resolve_module(name: &str, local: &Path, global: &Path) -> io::Result<PathBuf> {
    let file = format!("{}.so", name);
    let local_path = local.join(&file);
    match fs::metadata(&local_path) {
        Ok(_) => Ok(local_path),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(global.join(file)),
        Err(e) => Err(e),
    }
}
