//! Build command - install nginx into a cached layer

use crate::checksum::sha256_file;
use crate::cli::args::BuildArgs;
use crate::config::buildpack_yml::DEPRECATION_WARNING;
use crate::config::{BuildpackToml, Environment};
use crate::dependency::{self, ResolvedDependency};
use crate::error::{BuildpackError, BuildpackResult};
use crate::launch::{self, Launch};
use crate::layer::cache::keys;
use crate::layer::{CacheDecision, Layer, LayerChecksums, LayerContent, LayerTypes};
use crate::log::{debug_requested, Emitter};
use crate::plan::{self, resolve_version, BuildPlan, Priorities, VersionSource};
use crate::webserver::{self, Generated, WebServerConfig};
use crate::NGINX;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Layer holding the nginx installation
pub const NGINX_LAYER: &str = "nginx";

/// Launch-only layer with per-build environment
pub const CONFIG_LAYER: &str = "nginx-config";

/// Name of the configure helper inside `exec.d`
pub const EXEC_D_CONFIGURE: &str = "0-configure";

/// Everything a build reads
pub struct BuildContext {
    pub layers_dir: PathBuf,
    pub working_dir: PathBuf,
    pub env: Environment,
    pub buildpack: BuildpackToml,
    pub plan: BuildPlan,

    /// The `configure` binary shipped with the buildpack
    pub configure_bin: PathBuf,
}

/// What a build did
#[derive(Debug)]
pub struct BuildOutcome {
    pub dependency: ResolvedDependency,
    pub reused: bool,
    pub launch: Option<Launch>,
}

/// Execute the build command
pub fn execute(args: BuildArgs) -> BuildpackResult<()> {
    let env = Environment::from_platform(&args.platform)?;
    let root = env.buildpack_root()?;
    let ctx = BuildContext {
        layers_dir: args.layers,
        working_dir: std::env::current_dir()
            .map_err(|e| BuildpackError::io("getting current directory", e))?,
        buildpack: BuildpackToml::from_file(&root.join("buildpack.toml"))?,
        plan: BuildPlan::from_file(&args.plan)?,
        configure_bin: root.join("bin").join("configure"),
        env,
    };
    let emitter = Emitter::new(debug_requested(ctx.env.log_level.as_deref()));

    build(&ctx, &emitter)?;
    Ok(())
}

/// Run the build phase against an already loaded context
pub fn build(ctx: &BuildContext, emitter: &Emitter) -> BuildpackResult<BuildOutcome> {
    emitter.title(ctx.buildpack.title(), &ctx.buildpack.buildpack.version);

    let resolution = plan::resolve(NGINX, &ctx.plan.entries, &Priorities::default())
        .ok_or_else(|| BuildpackError::PlanEntryMissing(NGINX.to_string()))?;

    emitter.process("Resolving Nginx Server version");
    emitter.subprocess("Candidate version sources (in priority order):");
    for entry in &resolution.ranked {
        emitter.subprocess(format!(
            "  {:<20} -> {:?}",
            entry
                .version_source()
                .map(VersionSource::as_str)
                .unwrap_or("<unknown>"),
            entry.requested_version().unwrap_or("")
        ));
    }

    let source = resolution.chosen.version_source();
    if source == Some(&VersionSource::BuildpackYml) {
        emitter.warning(DEPRECATION_WARNING);
    }

    let constraint = resolve_version(
        resolution.chosen.requested_version().unwrap_or(""),
        NGINX,
        &ctx.buildpack,
    );
    let dependency = dependency::resolve(&ctx.buildpack, NGINX, &constraint, &ctx.env.stack_id)?;
    emitter.break_line();
    emitter.process(format!(
        "Selected {} version (using {}): {}",
        dependency.name,
        source.map(VersionSource::as_str).unwrap_or("<unknown>"),
        dependency.version
    ));
    emitter.break_line();

    let conf = ctx.env.conf_path(&ctx.working_dir);
    if ctx.env.web_server {
        let htpasswd = webserver::find_htpasswd(ctx.env.binding_root.as_deref())?;
        let config = WebServerConfig::from_env(&ctx.env, htpasswd);
        match webserver::write_config(&conf, &config)? {
            Generated::Kept => emitter.process(format!(
                "Using existing {} instead of generating one",
                conf.display()
            )),
            Generated::Written { conf, .. } => {
                emitter.process(format!("Generated {}", conf.display()))
            }
        }
    }

    let current = LayerChecksums {
        dependency_sha: dependency.sha256.clone(),
        configure_bin_sha: sha256_file(&ctx.configure_bin)?,
    };
    let types = LayerTypes {
        launch: resolution.launch,
        build: resolution.build,
        cache: resolution.build,
    };

    let layer = Layer::new(&ctx.layers_dir, NGINX_LAYER);
    let persisted = layer.read_content()?;
    let reused = match CacheDecision::evaluate(&persisted.metadata, &current) {
        CacheDecision::Reuse => {
            emitter.process(format!("Reusing cached layer {}", layer.path().display()));
            layer.write_content(&LayerContent {
                types,
                metadata: persisted.metadata,
            })?;
            true
        }
        CacheDecision::Reinstall(reason) => {
            debug!("Reinstalling {}: {}", layer.name(), reason);
            emitter.detail_debug(format!("Layer {} is stale: {}", NGINX_LAYER, reason));
            install(&layer, &dependency, &ctx.configure_bin, &current, types, emitter)?;
            false
        }
    };

    let launch = if resolution.launch {
        write_config_layer(ctx, &conf)?;
        let launch = Launch {
            processes: launch::processes(&ctx.working_dir, &conf, ctx.env.live_reload),
        };
        launch.write(&ctx.layers_dir)?;
        Some(launch)
    } else {
        None
    };

    Ok(BuildOutcome {
        dependency,
        reused,
        launch,
    })
}

fn install(
    layer: &Layer,
    dependency: &ResolvedDependency,
    configure_bin: &Path,
    checksums: &LayerChecksums,
    types: LayerTypes,
    emitter: &Emitter,
) -> BuildpackResult<()> {
    emitter.process("Executing build process");
    emitter.subprocess(format!("Installing {} {}", dependency.name, dependency.version));

    layer.reset()?;
    let outcome = dependency::deliver(dependency, layer.path())?;
    emitter.action_completed(outcome.elapsed);
    emitter.break_line();

    layer.install_exec_d(configure_bin, EXEC_D_CONFIGURE)?;
    layer.shared_env_prepend("PATH", &layer.path().join("sbin").display().to_string(), ":")?;
    layer.launch_env_override(
        "NGINX_GLOBAL_MODULES_PATH",
        &layer.path().join("modules").display().to_string(),
    )?;

    let mut content = LayerContent {
        types,
        ..LayerContent::default()
    };
    checksums.write_into(&mut content.metadata);
    content.metadata.insert(
        keys::BUILT_AT.to_string(),
        toml::Value::String(Utc::now().to_rfc3339()),
    );
    layer.write_content(&content)
}

fn write_config_layer(ctx: &BuildContext, conf: &Path) -> BuildpackResult<()> {
    let layer = Layer::new(&ctx.layers_dir, CONFIG_LAYER);
    layer.reset()?;
    layer.launch_env_override("APP_ROOT", &ctx.working_dir.display().to_string())?;
    layer.launch_env_override("NGINX_CONF_LOCATION", &conf.display().to_string())?;
    layer.write_content(&LayerContent {
        types: LayerTypes {
            launch: true,
            build: false,
            cache: false,
        },
        ..LayerContent::default()
    })
}
