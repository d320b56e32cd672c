//! Launch-time configuration renderer
//!
//! Installed as `exec.d/0-configure` in the nginx layer. Rewrites the
//! app's `nginx.conf` and its includes in place before nginx starts.

use clap::{ArgAction, Parser};
use console::style;
use nginx_cnb::error::{BuildpackError, BuildpackResult};
use nginx_cnb::log::init_tracing;
use nginx_cnb::render::{self, RenderContext};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Render nginx configuration templates
#[derive(Parser, Debug)]
#[command(name = "configure")]
#[command(version, about, long_about = None)]
struct Args {
    /// Application root
    #[arg(long, env = "APP_ROOT")]
    app_root: Option<PathBuf>,

    /// Main configuration file (relative paths are under the app root)
    #[arg(long, env = "NGINX_CONF_LOCATION")]
    conf: Option<PathBuf>,

    /// App-provided modules directory [default: <app-root>/modules]
    #[arg(long, env = "NGINX_LOCAL_MODULES_PATH")]
    local_modules: Option<PathBuf>,

    /// Buildpack-provided modules directory [default: <layer>/modules]
    #[arg(long, env = "NGINX_GLOBAL_MODULES_PATH")]
    global_modules: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> BuildpackResult<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let app_root = match args.app_root {
        Some(root) => root,
        None => std::env::current_dir()
            .map_err(|e| BuildpackError::io("getting current directory", e))?,
    };
    let conf = match args.conf {
        Some(conf) if conf.is_relative() => app_root.join(conf),
        Some(conf) => conf,
        None => app_root.join("nginx.conf"),
    };
    let local_modules = args
        .local_modules
        .unwrap_or_else(|| app_root.join("modules"));
    let global_modules = match args.global_modules {
        Some(dir) => dir,
        None => layer_modules()?,
    };

    render::run(&conf, &RenderContext::from_process(local_modules, global_modules))?;
    Ok(())
}

/// `<layer>/modules` for an executable at `<layer>/exec.d/0-configure`
fn layer_modules() -> BuildpackResult<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| BuildpackError::io("locating current executable", e))?;
    let layer = exe.parent().and_then(Path::parent).unwrap_or(Path::new("/"));
    Ok(layer.join("modules"))
}
