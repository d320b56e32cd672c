//! Configuration for the nginx buildpack
//!
//! Three sources feed a build: the process environment (`BP_*` and `CNB_*`
//! variables), the buildpack's own `buildpack.toml`, and the app's legacy
//! `buildpack.yml`. Each is parsed once into a typed struct.

pub mod buildpack_yml;
pub mod schema;

pub use buildpack_yml::{parse_version as parse_buildpack_yml, LegacyVersion};
pub use schema::{BuildpackToml, DependencyEntry};

use crate::error::{BuildpackError, BuildpackResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable names
pub mod vars {
    pub const CONF_LOCATION: &str = "BP_NGINX_CONF_LOCATION";
    pub const NGINX_VERSION: &str = "BP_NGINX_VERSION";
    pub const LIVE_RELOAD: &str = "BP_LIVE_RELOAD_ENABLED";
    pub const WEB_SERVER: &str = "BP_WEB_SERVER";
    pub const FORCE_HTTPS: &str = "BP_WEB_SERVER_FORCE_HTTPS";
    pub const PUSH_STATE: &str = "BP_WEB_SERVER_ENABLE_PUSH_STATE";
    pub const WEB_ROOT: &str = "BP_WEB_SERVER_ROOT";
    pub const LOCATION_PATH: &str = "BP_WEB_SERVER_LOCATION_PATH";
    pub const STUB_STATUS_PORT: &str = "BP_NGINX_STUB_STATUS_PORT";
    pub const LOG_LEVEL: &str = "BP_LOG_LEVEL";
    pub const STACK_ID: &str = "CNB_STACK_ID";
    pub const BUILDPACK_DIR: &str = "CNB_BUILDPACK_DIR";
    pub const BINDING_ROOT: &str = "SERVICE_BINDING_ROOT";
}

/// Default configuration file location, relative to the app
pub const DEFAULT_CONF_LOCATION: &str = "./nginx.conf";

/// Default served directory in web-server mode
pub const DEFAULT_WEB_ROOT: &str = "public";

/// Typed view of the environment variables the buildpack reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Configuration file location as given (may be relative)
    pub conf_location: String,

    /// Explicit version request
    pub nginx_version: Option<String>,

    /// Wrap the launch process in a file watcher
    pub live_reload: bool,

    /// `BP_WEB_SERVER=nginx` generates the configuration
    pub web_server: bool,

    pub force_https: bool,

    pub push_state: bool,

    pub web_root: String,

    pub location_path: String,

    pub stub_status_port: Option<u16>,

    pub log_level: Option<String>,

    pub stack_id: String,

    pub buildpack_dir: Option<PathBuf>,

    pub binding_root: Option<PathBuf>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            conf_location: DEFAULT_CONF_LOCATION.to_string(),
            nginx_version: None,
            live_reload: false,
            web_server: false,
            force_https: false,
            push_state: false,
            web_root: DEFAULT_WEB_ROOT.to_string(),
            location_path: "/".to_string(),
            stub_status_port: None,
            log_level: None,
            stack_id: String::new(),
            buildpack_dir: None,
            binding_root: None,
        }
    }
}

impl Environment {
    /// Read from the process environment
    pub fn from_process() -> BuildpackResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read from `<platform>/env/<NAME>` files, falling back to the process
    /// environment
    pub fn from_platform(platform_dir: &Path) -> BuildpackResult<Self> {
        let env_dir = platform_dir.join("env");
        Self::from_lookup(|name| {
            std::fs::read_to_string(env_dir.join(name))
                .ok()
                .or_else(|| std::env::var(name).ok())
        })
    }

    /// Read through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> BuildpackResult<Self> {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let web_server = match get(vars::WEB_SERVER) {
            None => false,
            Some(v) if v == "nginx" => true,
            Some(v) => {
                debug!("{}={} selects another web server; ignoring", vars::WEB_SERVER, v);
                false
            }
        };

        let stub_status_port = get(vars::STUB_STATUS_PORT)
            .map(|v| {
                v.parse::<u16>().map_err(|e| BuildpackError::EnvInvalid {
                    name: vars::STUB_STATUS_PORT.to_string(),
                    value: v.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            conf_location: get(vars::CONF_LOCATION).unwrap_or(defaults.conf_location),
            nginx_version: get(vars::NGINX_VERSION),
            live_reload: parse_bool(vars::LIVE_RELOAD, get(vars::LIVE_RELOAD))?,
            web_server,
            force_https: parse_bool(vars::FORCE_HTTPS, get(vars::FORCE_HTTPS))?,
            push_state: parse_bool(vars::PUSH_STATE, get(vars::PUSH_STATE))?,
            web_root: get(vars::WEB_ROOT).unwrap_or(defaults.web_root),
            location_path: get(vars::LOCATION_PATH).unwrap_or(defaults.location_path),
            stub_status_port,
            log_level: get(vars::LOG_LEVEL),
            stack_id: get(vars::STACK_ID).unwrap_or_default(),
            buildpack_dir: get(vars::BUILDPACK_DIR).map(PathBuf::from),
            binding_root: get(vars::BINDING_ROOT).map(PathBuf::from),
        })
    }

    /// Absolute path of the configuration file for an app rooted at `working_dir`
    pub fn conf_path(&self, working_dir: &Path) -> PathBuf {
        let location = Path::new(&self.conf_location);
        if location.is_absolute() {
            location.to_path_buf()
        } else {
            working_dir.join(location.strip_prefix(".").unwrap_or(location))
        }
    }

    /// Directory holding the buildpack (`CNB_BUILDPACK_DIR`, else the
    /// parent of the running executable's `bin/`)
    pub fn buildpack_root(&self) -> BuildpackResult<PathBuf> {
        if let Some(dir) = &self.buildpack_dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe()
            .map_err(|e| BuildpackError::io("locating current executable", e))?;
        exe.parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                BuildpackError::User(format!(
                    "{} is not set and {} has no buildpack root",
                    vars::BUILDPACK_DIR,
                    exe.display()
                ))
            })
    }
}

/// Parse a boolean flag: 1/t/true or 0/f/false, in the usual casings
pub fn parse_bool(name: &str, value: Option<String>) -> BuildpackResult<bool> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.as_str() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(BuildpackError::EnvInvalid {
            name: name.to_string(),
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}
