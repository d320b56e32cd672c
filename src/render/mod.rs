//! Launch-time configuration rendering
//!
//! Runs inside the container just before nginx starts. The main
//! configuration file and every file it includes are treated as templates
//! and rewritten in place.
//!
//! Rewrites are not transactional: when a later file fails, files earlier
//! in the worklist stay rewritten.

pub mod functions;
pub mod include;
pub mod template;

pub use functions::{resolve_module, RenderContext};
pub use template::{FuncTable, Template, TemplateError};

use crate::error::{BuildpackError, BuildpackResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Files rewritten by a render pass, in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub rendered: Vec<PathBuf>,
}

/// Render `main` and everything it includes.
///
/// A missing `main` is not an error; nothing is rendered.
pub fn run(main: &Path, ctx: &RenderContext) -> BuildpackResult<RenderReport> {
    let main = include::normalize(main);
    let content = match fs::read(&main) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No configuration at {}; nothing to render", main.display());
            return Ok(RenderReport::default());
        }
        Err(e) => {
            return Err(BuildpackError::io(
                format!("reading {}", main.display()),
                e,
            ))
        }
    };
    let content = String::from_utf8_lossy(&content);

    let mut worklist = include::discover(&main, &content)?;
    worklist.push(main);

    let funcs = ctx.functions();
    let mut report = RenderReport::default();
    for path in worklist {
        render_file(&path, &funcs)?;
        report.rendered.push(path);
    }

    info!("Rendered {} configuration file(s)", report.rendered.len());
    Ok(report)
}

/// Render one file in place
pub fn render_file(path: &Path, funcs: &FuncTable<'_>) -> BuildpackResult<()> {
    let bytes =
        fs::read(path).map_err(|e| BuildpackError::io(format!("reading {}", path.display()), e))?;
    let source = String::from_utf8(bytes)
        .map_err(|_| BuildpackError::template(path, "file is not valid UTF-8"))?;

    let rendered = Template::parse(&source)
        .and_then(|t| t.render(funcs))
        .map_err(|e| BuildpackError::template(path, e.to_string()))?;

    fs::write(path, rendered)
        .map_err(|e| BuildpackError::io(format!("writing {}", path.display()), e))?;
    debug!("Rendered {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn context(root: &Path) -> RenderContext {
        let vars: HashMap<&str, &str> = [("PORT", "8080"), ("FOO", "BAR")].into_iter().collect();
        RenderContext {
            local_modules: root.join("modules"),
            global_modules: root.join("global"),
            temp_dir: PathBuf::from("/tmp"),
            lookup: Box::new(move |name| vars.get(name).map(|v| v.to_string())),
        }
    }

    #[test]
    fn missing_main_is_noop() {
        let temp = TempDir::new().unwrap();
        let report = run(&temp.path().join("nginx.conf"), &context(temp.path())).unwrap();
        assert!(report.rendered.is_empty());
    }

    #[test]
    fn renders_main_and_includes_only() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("subdir")).unwrap();

        fs::write(
            root.join("nginx.conf"),
            "listen {{port}};\ninclude custom.conf;\ninclude ./subdir/*.conf;\n",
        )
        .unwrap();
        fs::write(root.join("custom.conf"), "set $foo {{env \"FOO\"}};").unwrap();
        fs::write(root.join("subdir/custom1.conf"), "# {{port}}").unwrap();
        fs::write(root.join("subdir/custom2.conf"), "# {{tempDir}}").unwrap();
        fs::write(root.join("unrelated.conf"), "# {{port}}").unwrap();

        let report = run(&root.join("nginx.conf"), &context(root)).unwrap();

        assert_eq!(report.rendered.len(), 4);
        assert_eq!(report.rendered.last().unwrap(), &root.join("nginx.conf"));

        let read = |p: &str| fs::read_to_string(root.join(p)).unwrap();
        assert_eq!(
            read("nginx.conf"),
            "listen 8080;\ninclude custom.conf;\ninclude ./subdir/*.conf;\n"
        );
        assert_eq!(read("custom.conf"), "set $foo BAR;");
        assert_eq!(read("subdir/custom1.conf"), "# 8080");
        assert_eq!(read("subdir/custom2.conf"), "# /tmp");
        assert_eq!(read("unrelated.conf"), "# {{port}}");
    }

    #[test]
    fn nested_includes_are_not_followed() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("nginx.conf"), "include first.conf;").unwrap();
        fs::write(root.join("first.conf"), "include second.conf; {{port}}").unwrap();
        fs::write(root.join("second.conf"), "{{port}}").unwrap();

        run(&root.join("nginx.conf"), &context(root)).unwrap();

        assert_eq!(
            fs::read_to_string(root.join("first.conf")).unwrap(),
            "include second.conf; 8080"
        );
        assert_eq!(
            fs::read_to_string(root.join("second.conf")).unwrap(),
            "{{port}}"
        );
    }

    #[test]
    fn template_error_names_file_and_keeps_earlier_rewrites() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("nginx.conf"), "include a.conf;\ninclude b.conf;").unwrap();
        fs::write(root.join("a.conf"), "{{port}}").unwrap();
        fs::write(root.join("b.conf"), "{{port \"extra\"}}").unwrap();

        let err = run(&root.join("nginx.conf"), &context(root)).unwrap_err();

        assert!(err.to_string().contains("b.conf"));
        assert_eq!(fs::read_to_string(root.join("a.conf")).unwrap(), "8080");
        assert_eq!(
            fs::read_to_string(root.join("nginx.conf")).unwrap(),
            "include a.conf;\ninclude b.conf;"
        );
    }

    #[test]
    fn malformed_include_fails() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("nginx.conf"), "include [-;").unwrap();

        let err = run(&root.join("nginx.conf"), &context(root)).unwrap_err();
        assert!(matches!(err, BuildpackError::IncludePattern { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_main_is_fatal() {
        let temp = TempDir::new().unwrap();
        // A directory where the file should be
        fs::create_dir_all(temp.path().join("nginx.conf")).unwrap();

        assert!(run(&temp.path().join("nginx.conf"), &context(temp.path())).is_err());
    }
}
