//! `include` directive discovery
//!
//! Only the main configuration file is scanned. Files it includes are
//! rendered, but their own `include` lines are not followed.

use crate::error::{BuildpackError, BuildpackResult};
use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

const INCLUDE_PATTERN: &str = r"\binclude\s+([^\s;]+)\s*;";

fn include_regex() -> &'static Regex {
    static INCLUDE: OnceLock<Regex> = OnceLock::new();
    INCLUDE.get_or_init(|| Regex::new(INCLUDE_PATTERN).expect("include pattern must be valid"))
}

/// Raw `include` tokens in document order
pub fn include_patterns(content: &str) -> Vec<&str> {
    include_regex()
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Drop `.` components so equal paths compare equal
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Expand every `include` in `main`'s content to existing files.
///
/// Relative tokens are taken relative to `main`'s directory. The result is
/// deduplicated, keeps first-seen order, and never contains `main` itself.
pub fn discover(main: &Path, content: &str) -> BuildpackResult<Vec<PathBuf>> {
    let base = main.parent().unwrap_or(Path::new("/"));
    let main = normalize(main);

    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for token in include_patterns(content) {
        let pattern = normalize(&base.join(token));
        let pattern_str = pattern.to_string_lossy();

        let paths = glob::glob(&pattern_str).map_err(|e| BuildpackError::IncludePattern {
            pattern: token.to_string(),
            source_file: main.clone(),
            reason: e.to_string(),
        })?;

        for entry in paths {
            let path = entry.map_err(|e| {
                BuildpackError::io(
                    format!("expanding include {} in {}", token, main.display()),
                    e.into_error(),
                )
            })?;
            let path = normalize(&path);
            if path == main || !path.is_file() {
                continue;
            }
            if seen.insert(path.clone()) {
                debug!("Include {} -> {}", token, path.display());
                found.push(path);
            }
        }
    }

    Ok(found)
}
