//! Generated configuration for `BP_WEB_SERVER=nginx`
//!
//! Apps that only ship static files get a ready-made `nginx.conf`. The
//! generated file still uses `{{port}}`, `{{tempDir}}` and `{{env}}` so the
//! launch-time render step fills in runtime values.

use crate::config::Environment;
use crate::error::{BuildpackError, BuildpackResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const MIME_TYPES: &str = include_str!("../assets/mime.types");

/// Service binding type carrying basic-auth credentials
pub const HTPASSWD_BINDING: &str = "htpasswd";

/// Options for the generated server block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebServerConfig {
    pub root: String,
    pub location_path: String,
    pub force_https: bool,
    pub push_state: bool,
    pub stub_status_port: Option<u16>,
    pub htpasswd: Option<PathBuf>,
}

impl WebServerConfig {
    pub fn from_env(env: &Environment, htpasswd: Option<PathBuf>) -> Self {
        Self {
            root: env.web_root.clone(),
            location_path: env.location_path.clone(),
            force_https: env.force_https,
            push_state: env.push_state,
            stub_status_port: env.stub_status_port,
            htpasswd,
        }
    }

    /// Served directory as an nginx expression; relative roots hang off
    /// `APP_ROOT`
    fn root_expr(&self) -> String {
        if Path::new(&self.root).is_absolute() {
            self.root.clone()
        } else {
            format!("{{{{env \"APP_ROOT\"}}}}/{}", self.root.trim_start_matches("./"))
        }
    }

    /// Render the configuration template text
    pub fn render(&self) -> String {
        let mut conf = format!(
            r#"worker_processes 1;
daemon off;

error_log stderr;
events {{ worker_connections 1024; }}

http {{
  client_body_temp_path "{{{{tempDir}}}}/client_body_temp";
  proxy_temp_path "{{{{tempDir}}}}/proxy_temp";
  fastcgi_temp_path "{{{{tempDir}}}}/fastcgi_temp";

  charset utf-8;
  include mime.types;
  default_type application/octet-stream;

  log_format cloudfoundry 'NginxLog "$request" $status $body_bytes_sent';
  access_log /dev/stdout cloudfoundry;

  sendfile on;
  tcp_nopush on;
  keepalive_timeout 30;
  port_in_redirect off;
  server_tokens off;

  gzip on;
  gzip_comp_level 6;
  gzip_min_length 1100;
  gzip_types text/plain text/css application/json application/javascript text/xml application/xml application/xml+rss text/javascript;
  gzip_vary on;

  server {{
    listen {{{{port}}}} default_server;
    server_name _;
    root {root};
    index index.html index.htm Default.htm;
"#,
            root = self.root_expr()
        );

        if self.force_https {
            conf.push_str(
                r#"
    set $updated_host $host;
    if ($http_x_forwarded_host != "") {
      set $updated_host $http_x_forwarded_host;
    }
    if ($http_x_forwarded_proto != "https") {
      return 301 https://$updated_host$request_uri;
    }
"#,
            );
        }

        if let Some(path) = &self.htpasswd {
            conf.push_str(&format!(
                "\n    auth_basic \"Password Protected\";\n    auth_basic_user_file {};\n",
                path.display()
            ));
        }

        conf.push_str(&format!("\n    location {} {{\n", self.location_path));
        if self.push_state {
            conf.push_str("      try_files $uri $uri/ /index.html;\n");
        }
        conf.push_str("    }\n");

        conf.push_str(
            r#"
    location ~ /\. {
      deny all;
      return 404;
    }
  }
"#,
        );

        if let Some(port) = self.stub_status_port {
            conf.push_str(&format!(
                r#"
  server {{
    listen {port};
    location /stub_status {{
      stub_status;
    }}
  }}
"#
            ));
        }

        conf.push_str("}\n");
        conf
    }
}

/// Find a `.htpasswd` file from a service binding of type `htpasswd`.
///
/// No binding root, or no such binding, yields `None`.
pub fn find_htpasswd(binding_root: Option<&Path>) -> BuildpackResult<Option<PathBuf>> {
    let Some(root) = binding_root else {
        return Ok(None);
    };
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(BuildpackError::io(
                format!("reading service bindings in {}", root.display()),
                e,
            ))
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        let kind = fs::read_to_string(dir.join("type")).unwrap_or_default();
        if kind.trim() != HTPASSWD_BINDING {
            continue;
        }
        let file = dir.join(".htpasswd");
        if file.is_file() {
            debug!("Using htpasswd binding {}", dir.display());
            return Ok(Some(file));
        }
        return Err(BuildpackError::User(format!(
            "binding {} of type {} has no .htpasswd entry",
            dir.display(),
            HTPASSWD_BINDING
        )));
    }
    Ok(None)
}

/// Files written by [`write_config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    /// The app already had a configuration file
    Kept,
    Written { conf: PathBuf, mime_types: PathBuf },
}

/// Write the generated `nginx.conf` and `mime.types` unless `conf_path`
/// already exists
pub fn write_config(conf_path: &Path, config: &WebServerConfig) -> BuildpackResult<Generated> {
    if conf_path.exists() {
        debug!("{} exists; not generating", conf_path.display());
        return Ok(Generated::Kept);
    }

    let dir = conf_path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dir)
        .map_err(|e| BuildpackError::io(format!("creating {}", dir.display()), e))?;

    fs::write(conf_path, config.render())
        .map_err(|e| BuildpackError::io(format!("writing {}", conf_path.display()), e))?;

    let mime_types = dir.join("mime.types");
    if !mime_types.exists() {
        fs::write(&mime_types, MIME_TYPES)
            .map_err(|e| BuildpackError::io(format!("writing {}", mime_types.display()), e))?;
    }

    Ok(Generated::Written {
        conf: conf_path.to_path_buf(),
        mime_types,
    })
}
