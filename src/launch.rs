//! Launch process definitions and `launch.toml`

use crate::error::{BuildpackError, BuildpackResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default process type
pub const WEB: &str = "web";

/// Non-reloading variant offered alongside a live-reload `web`
pub const NO_RELOAD: &str = "no-reload";

/// PID file location passed inline with `-g`
pub const PID_DIRECTIVE: &str = "pid /tmp/nginx.pid;";

/// One process the launcher can start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "type")]
    pub kind: String,

    pub command: Vec<String>,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub default: bool,
}

/// Contents of `<layers>/launch.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Launch {
    #[serde(default)]
    pub processes: Vec<Process>,
}

impl Launch {
    pub fn write(&self, layers_dir: &Path) -> BuildpackResult<()> {
        let path = layers_dir.join("launch.toml");
        let content = toml::to_string(self)?;
        fs::write(&path, content)
            .map_err(|e| BuildpackError::io(format!("writing {}", path.display()), e))
    }
}

/// `nginx -p <workdir> -c <conf> -g "pid ...;"`
fn nginx_args(working_dir: &Path, conf: &Path) -> Vec<String> {
    vec![
        "-p".to_string(),
        working_dir.display().to_string(),
        "-c".to_string(),
        conf.display().to_string(),
        "-g".to_string(),
        PID_DIRECTIVE.to_string(),
    ]
}

/// Processes for serving `conf` from `working_dir`.
///
/// With live reload the default `web` process restarts nginx on file
/// changes (ignoring the rendered config itself) and `no-reload` runs
/// nginx directly.
pub fn processes(working_dir: &Path, conf: &Path, live_reload: bool) -> Vec<Process> {
    let direct = Process {
        kind: WEB.to_string(),
        command: vec!["nginx".to_string()],
        args: nginx_args(working_dir, conf),
        default: true,
    };

    if !live_reload {
        return vec![direct];
    }

    let mut watch_args: Vec<String> = [
        "--restart",
        "--shell",
        "none",
        "--watch",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    watch_args.push(working_dir.display().to_string());
    watch_args.push("--ignore".to_string());
    watch_args.push(conf.display().to_string());
    watch_args.push("--".to_string());
    watch_args.push("nginx".to_string());
    watch_args.extend(nginx_args(working_dir, conf));

    vec![
        Process {
            kind: WEB.to_string(),
            command: vec!["watchexec".to_string()],
            args: watch_args,
            default: true,
        },
        Process {
            kind: NO_RELOAD.to_string(),
            default: false,
            ..direct
        },
    ]
}
