//! Build output formatting and diagnostic logging setup
//!
//! The lifecycle shows buildpack stdout to the user, so progress is written
//! there in a fixed indentation scheme: a title line per buildpack, process
//! lines indented two spaces, detail lines indented four. Diagnostics go
//! through `tracing` and are off unless `BP_LOG_LEVEL=DEBUG` or `-v`.

use console::style;
use std::fmt::Display;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Writes buildpack progress lines to stdout
#[derive(Debug, Clone, Default)]
pub struct Emitter {
    debug: bool,
}

impl Emitter {
    /// Create an emitter; `debug` enables `detail_debug` lines
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Buildpack title line, e.g. "Nginx Server Buildpack 0.1.0"
    pub fn title(&self, name: &str, version: &str) {
        println!("{} {}", style(name).bold(), version);
    }

    /// Top-level step
    pub fn process(&self, message: impl Display) {
        println!("  {}", message);
    }

    /// Nested detail under a step
    pub fn subprocess(&self, message: impl Display) {
        println!("    {}", message);
    }

    /// Detail line shown only in debug mode
    pub fn detail_debug(&self, message: impl Display) {
        if self.debug {
            println!("    {}", style(message).dim());
        }
    }

    /// Warning line
    pub fn warning(&self, message: impl Display) {
        println!("  {} {}", style("WARNING:").yellow().bold(), message);
    }

    /// Step duration
    pub fn action_completed(&self, elapsed: Duration) {
        println!("      Completed in {}", format_duration(elapsed));
    }

    /// Blank separator
    pub fn break_line(&self) {
        println!();
    }
}

/// Format a duration the way build logs show it (e.g. "1.234s", "250ms")
pub fn format_duration(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis >= 1000 {
        format!("{:.3}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", millis)
    }
}

/// Whether `BP_LOG_LEVEL` requests debug output
pub fn debug_requested(level: Option<&str>) -> bool {
    level.is_some_and(|l| l.eq_ignore_ascii_case("debug"))
}

/// Initialize the tracing subscriber.
///
/// 0 = warn, 1 = info, 2+ = debug. `RUST_LOG` wins when set.
pub fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "nginx_cnb=warn",
        1 => "nginx_cnb=info",
        _ => "nginx_cnb=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_duration_units() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn debug_level_detection() {
        assert!(debug_requested(Some("DEBUG")));
        assert!(debug_requested(Some("debug")));
        assert!(!debug_requested(Some("INFO")));
        assert!(!debug_requested(None));
    }
}
