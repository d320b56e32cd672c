//! Detect command - decide whether the app needs nginx

use crate::cli::args::DetectArgs;
use crate::config::buildpack_yml::DEPRECATION_WARNING;
use crate::config::{parse_buildpack_yml, BuildpackToml, Environment};
use crate::error::{BuildpackError, BuildpackResult};
use crate::log::{debug_requested, Emitter};
use crate::plan::{version_requests, DetectPlan, PlanEntry, Provision};
use crate::{NGINX, WATCHEXEC};
use std::path::Path;
use tracing::debug;

/// Execute the detect command
pub fn execute(args: DetectArgs) -> BuildpackResult<()> {
    let env = Environment::from_platform(&args.platform)?;
    let buildpack = BuildpackToml::from_file(&env.buildpack_root()?.join("buildpack.toml"))?;
    let working_dir = std::env::current_dir()
        .map_err(|e| BuildpackError::io("getting current directory", e))?;
    let emitter = Emitter::new(debug_requested(env.log_level.as_deref()));

    let plan = detect(&working_dir, &env, &buildpack, &emitter)?;
    plan.write(&args.plan)
}

/// Compute the build plan for the app in `working_dir`.
///
/// Always passes and provides nginx. Requires it (for launch) only when
/// the app ships a configuration file or asks for a generated one.
pub fn detect(
    working_dir: &Path,
    env: &Environment,
    buildpack: &BuildpackToml,
    emitter: &Emitter,
) -> BuildpackResult<DetectPlan> {
    let mut plan = DetectPlan {
        provides: vec![Provision {
            name: NGINX.to_string(),
        }],
        requires: Vec::new(),
    };

    let conf = env.conf_path(working_dir);
    if !env.web_server && !conf.is_file() {
        debug!(
            "No {} and {} unset; providing only",
            conf.display(),
            crate::config::vars::WEB_SERVER
        );
        return Ok(plan);
    }

    let legacy = parse_buildpack_yml(working_dir)?;
    if legacy.version.is_some() {
        emitter.warning(DEPRECATION_WARNING);
    }

    plan.requires = version_requests(env, &legacy, buildpack, true);

    if env.live_reload {
        plan.requires.push(PlanEntry::new(WATCHEXEC).with_launch(true));
    }

    Ok(plan)
}
