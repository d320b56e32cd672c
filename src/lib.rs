//! nginx Cloud Native Buildpack
//!
//! Detects apps that need nginx, resolves and installs an nginx build into
//! a cached layer, and renders the app's templated `nginx.conf` when the
//! container starts.

pub mod checksum;
pub mod cli;
pub mod config;
pub mod dependency;
pub mod error;
pub mod launch;
pub mod layer;
pub mod log;
pub mod plan;
pub mod render;
pub mod webserver;

pub use error::{BuildpackError, BuildpackResult};

/// Dependency id and plan entry name for nginx
pub const NGINX: &str = "nginx";

/// File watcher used for live reload
pub const WATCHEXEC: &str = "watchexec";
