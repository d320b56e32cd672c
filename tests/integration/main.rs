//! Integration tests for the nginx buildpack

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a minimal buildpack directory and return its root
fn buildpack_dir(root: &Path, dependencies: &str) -> PathBuf {
    let dir = root.join("buildpack");
    fs::create_dir_all(dir.join("bin")).unwrap();
    fs::write(
        dir.join("buildpack.toml"),
        format!(
            r#"
api = "0.7"

[buildpack]
id = "example/nginx"
name = "Nginx Server Buildpack"
version = "0.1.0"

[metadata.default-versions]
nginx = "1.25.*"

[metadata.version-lines]
mainline = "1.25.*"
stable = "1.24.*"
{}
"#,
            dependencies
        ),
    )
    .unwrap();
    fs::write(dir.join("bin").join("configure"), "configure").unwrap();
    dir
}

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn nginx_cnb() -> Command {
        cargo_bin_cmd!("nginx-cnb")
    }

    #[test]
    fn help_displays() {
        nginx_cnb()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("detect"))
            .stdout(predicate::str::contains("build"));
    }

    #[test]
    fn version_displays() {
        nginx_cnb()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("nginx-cnb"));
    }

    #[test]
    fn build_requires_arguments() {
        nginx_cnb().arg("build").assert().failure();
    }
}

mod detect_tests {
    use super::*;
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;

    #[test]
    fn writes_requirement_when_config_present() {
        let temp = TempDir::new().unwrap();
        let bp = buildpack_dir(temp.path(), "");
        let app = temp.path().join("app");
        fs::create_dir_all(&app).unwrap();
        fs::write(app.join("nginx.conf"), "events {}\n").unwrap();
        let platform = temp.path().join("platform");
        fs::create_dir_all(platform.join("env")).unwrap();
        fs::write(platform.join("env").join("BP_NGINX_VERSION"), "stable").unwrap();
        let plan = temp.path().join("plan.toml");

        cargo_bin_cmd!("nginx-cnb")
            .current_dir(&app)
            .env("CNB_BUILDPACK_DIR", &bp)
            .env_remove("BP_NGINX_VERSION")
            .arg("detect")
            .arg(&platform)
            .arg(&plan)
            .assert()
            .success();

        let written = fs::read_to_string(&plan).unwrap();
        assert!(written.contains("[[provides]]"));
        assert!(written.contains("version-source = \"BP_NGINX_VERSION\""));
        assert!(written.contains("version = \"1.24.*\""));
    }

    #[test]
    fn provides_only_without_config() {
        let temp = TempDir::new().unwrap();
        let bp = buildpack_dir(temp.path(), "");
        let platform = temp.path().join("platform");
        fs::create_dir_all(&platform).unwrap();
        let plan = temp.path().join("plan.toml");

        cargo_bin_cmd!("nginx-cnb")
            .current_dir(temp.path())
            .env("CNB_BUILDPACK_DIR", &bp)
            .env_remove("BP_WEB_SERVER")
            .env_remove("BP_NGINX_CONF_LOCATION")
            .arg("detect")
            .arg(&platform)
            .arg(&plan)
            .assert()
            .success();

        let written = fs::read_to_string(&plan).unwrap();
        assert!(written.contains("[[provides]]"));
        assert!(!written.contains("[[requires]]"));
    }

    #[test]
    fn malformed_flag_fails_with_variable_name() {
        let temp = TempDir::new().unwrap();
        let bp = buildpack_dir(temp.path(), "");
        fs::write(temp.path().join("nginx.conf"), "").unwrap();

        cargo_bin_cmd!("nginx-cnb")
            .current_dir(temp.path())
            .env("CNB_BUILDPACK_DIR", &bp)
            .env("BP_LIVE_RELOAD_ENABLED", "maybe")
            .arg("detect")
            .arg(temp.path())
            .arg(temp.path().join("plan.toml"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("BP_LIVE_RELOAD_ENABLED"));
    }
}

mod build_tests {
    use super::*;
    use assert_cmd::cargo::cargo_bin_cmd;
    use nginx_cnb::checksum::sha256_file;
    use predicates::prelude::*;
    use std::process::Command;

    #[test]
    fn installs_layer_and_writes_launch_toml() {
        let temp = TempDir::new().unwrap();

        let content = temp.path().join("content");
        fs::create_dir_all(content.join("sbin")).unwrap();
        fs::write(content.join("sbin").join("nginx"), "#!/bin/sh\n").unwrap();
        let archive = temp.path().join("nginx.tgz");
        let status = Command::new("tar")
            .arg("-czf")
            .arg(&archive)
            .arg("-C")
            .arg(&content)
            .arg("sbin")
            .status()
            .unwrap();
        assert!(status.success());
        let sha = sha256_file(&archive).unwrap();

        let bp = buildpack_dir(
            temp.path(),
            &format!(
                r#"
[[metadata.dependencies]]
id = "nginx"
name = "Nginx Server"
version = "1.25.3"
uri = "file://{}"
sha256 = "{}"
stacks = ["*"]
"#,
                archive.display(),
                sha
            ),
        );

        let app = temp.path().join("app");
        fs::create_dir_all(&app).unwrap();
        let layers = temp.path().join("layers");
        fs::create_dir_all(&layers).unwrap();
        let platform = temp.path().join("platform");
        fs::create_dir_all(&platform).unwrap();
        let plan = temp.path().join("plan.toml");
        fs::write(
            &plan,
            r#"
[[entries]]
name = "nginx"
[entries.metadata]
version = "1.25.*"
version-source = "buildpack.toml"
launch = true
"#,
        )
        .unwrap();

        cargo_bin_cmd!("nginx-cnb")
            .current_dir(&app)
            .env("CNB_BUILDPACK_DIR", &bp)
            .env("CNB_STACK_ID", "io.buildpacks.stacks.jammy")
            .env_remove("BP_NGINX_VERSION")
            .env_remove("BP_LIVE_RELOAD_ENABLED")
            .env_remove("BP_WEB_SERVER")
            .arg("build")
            .arg(&layers)
            .arg(&platform)
            .arg(&plan)
            .assert()
            .success()
            .stdout(predicate::str::contains("Nginx Server Buildpack 0.1.0"))
            .stdout(predicate::str::contains("1.25.3"));

        assert!(layers.join("nginx").join("sbin").join("nginx").is_file());
        assert!(layers
            .join("nginx")
            .join("exec.d")
            .join("0-configure")
            .is_file());
        let metadata = fs::read_to_string(layers.join("nginx.toml")).unwrap();
        assert!(metadata.contains("dependency-sha"));
        assert!(metadata.contains("configure-bin-sha"));

        let launch = fs::read_to_string(layers.join("launch.toml")).unwrap();
        assert!(launch.contains("type = \"web\""));
        assert!(launch.contains("pid /tmp/nginx.pid;"));
    }
}

mod configure_tests {
    use super::*;
    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;

    #[test]
    fn missing_config_is_a_noop() {
        let temp = TempDir::new().unwrap();

        cargo_bin_cmd!("configure")
            .env("APP_ROOT", temp.path())
            .env_remove("NGINX_CONF_LOCATION")
            .assert()
            .success();

        assert!(!temp.path().join("nginx.conf").exists());
    }

    #[test]
    fn renders_main_and_included_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("conf.d")).unwrap();
        fs::write(
            temp.path().join("nginx.conf"),
            "http {\n  include conf.d/*.conf;\n  listen {{port}};\n}\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("conf.d").join("site.conf"),
            "root {{env \"APP_ROOT\"}}/public;\n",
        )
        .unwrap();

        cargo_bin_cmd!("configure")
            .env("APP_ROOT", temp.path())
            .env("PORT", "8080")
            .env_remove("NGINX_CONF_LOCATION")
            .assert()
            .success();

        let main = fs::read_to_string(temp.path().join("nginx.conf")).unwrap();
        assert!(main.contains("listen 8080;"));
        let site = fs::read_to_string(temp.path().join("conf.d").join("site.conf")).unwrap();
        assert_eq!(site, format!("root {}/public;\n", temp.path().display()));
    }

    #[test]
    fn module_directive_prefers_local() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("modules")).unwrap();
        fs::write(temp.path().join("modules").join("ngx_http_geoip_module.so"), "").unwrap();
        fs::write(
            temp.path().join("custom.conf"),
            "{{module \"ngx_http_geoip_module\"}}\n",
        )
        .unwrap();

        cargo_bin_cmd!("configure")
            .env("APP_ROOT", temp.path())
            .env("NGINX_CONF_LOCATION", "custom.conf")
            .env("NGINX_GLOBAL_MODULES_PATH", "/layers/nginx/modules")
            .env_remove("NGINX_LOCAL_MODULES_PATH")
            .assert()
            .success();

        let rendered = fs::read_to_string(temp.path().join("custom.conf")).unwrap();
        assert_eq!(
            rendered,
            format!(
                "load_module {};\n",
                temp.path()
                    .join("modules")
                    .join("ngx_http_geoip_module.so")
                    .display()
            )
        );
    }

    #[test]
    fn malformed_template_names_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("nginx.conf"), "listen {{port;\n").unwrap();

        cargo_bin_cmd!("configure")
            .env("APP_ROOT", temp.path())
            .env_remove("NGINX_CONF_LOCATION")
            .assert()
            .failure()
            .stderr(predicate::str::contains("nginx.conf"));
    }
}
