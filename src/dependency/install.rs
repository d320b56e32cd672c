//! Download, verify and extract a resolved dependency

use crate::checksum::sha256_file;
use crate::dependency::ResolvedDependency;
use crate::error::{BuildpackError, BuildpackResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What a delivery did
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Verified checksum of the fetched archive
    pub sha256: String,

    /// Wall-clock time spent fetching and extracting
    pub elapsed: Duration,
}

/// Fetch `dependency` and extract it into `dest`.
///
/// `dest` must exist. The archive is staged in the system temp directory
/// and removed afterwards, whether or not extraction succeeds.
pub fn deliver(dependency: &ResolvedDependency, dest: &Path) -> BuildpackResult<InstallOutcome> {
    let start = Instant::now();
    let archive = staging_path(dependency);

    let result = fetch(&dependency.uri, &archive)
        .and_then(|()| verify(&dependency.uri, &archive, &dependency.sha256))
        .and_then(|sha| {
            extract(&archive, dest, dependency.strip_components)?;
            Ok(sha)
        });

    if let Err(e) = fs::remove_file(&archive) {
        if e.kind() != io::ErrorKind::NotFound {
            debug!("Could not remove {}: {}", archive.display(), e);
        }
    }

    let sha256 = result?;
    let elapsed = start.elapsed();
    info!("Delivered {} in {:?}", dependency, elapsed);
    Ok(InstallOutcome { sha256, elapsed })
}

fn staging_path(dependency: &ResolvedDependency) -> PathBuf {
    let short = dependency.sha256.get(..12).unwrap_or(&dependency.sha256);
    std::env::temp_dir().join(format!(
        "nginx-cnb-{}-{}-{}",
        dependency.id,
        dependency.version,
        short
    ))
}

/// Copy `uri` to `target`. Supports http(s), `file://` and plain paths.
fn fetch(uri: &str, target: &Path) -> BuildpackResult<()> {
    let mut out = File::create(target)
        .map_err(|e| BuildpackError::io(format!("creating {}", target.display()), e))?;

    if uri.starts_with("https://") || uri.starts_with("http://") {
        debug!("Downloading {}", uri);
        let response = ureq::get(uri).call().map_err(|e| BuildpackError::Download {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        let mut reader = response.into_body().into_reader();
        io::copy(&mut reader, &mut out).map_err(|e| BuildpackError::Download {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        return Ok(());
    }

    let source = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    debug!("Copying {}", source.display());
    let mut input = File::open(source).map_err(|e| BuildpackError::Download {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;
    io::copy(&mut input, &mut out)
        .map_err(|e| BuildpackError::io(format!("copying {}", source.display()), e))?;
    Ok(())
}

fn verify(uri: &str, archive: &Path, expected: &str) -> BuildpackResult<String> {
    let actual = sha256_file(archive)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(BuildpackError::ChecksumMismatch {
            uri: uri.to_string(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(actual)
}

fn extract(archive: &Path, dest: &Path, strip_components: u32) -> BuildpackResult<()> {
    let mut cmd = Command::new("tar");
    cmd.arg("-xf").arg(archive).arg("-C").arg(dest);
    if strip_components > 0 {
        cmd.arg(format!("--strip-components={}", strip_components));
    }
    debug!("Executing: {:?}", cmd);

    let output = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| BuildpackError::command_failed("tar", e))?;

    if !output.status.success() {
        return Err(BuildpackError::command_exec(
            format!("tar -xf {}", archive.display()),
            String::from_utf8_lossy(&output.stderr).trim(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::sha256_bytes;
    use semver::Version;
    use tempfile::TempDir;

    fn dependency(uri: String, sha256: String) -> ResolvedDependency {
        ResolvedDependency {
            id: "nginx".to_string(),
            name: "Nginx Server".to_string(),
            version: Version::new(1, 25, 3),
            uri,
            sha256,
            stacks: vec!["*".to_string()],
            strip_components: 0,
        }
    }

    /// Build a tarball with `tar` containing sbin/nginx
    fn make_archive(dir: &Path) -> PathBuf {
        let content = dir.join("content");
        fs::create_dir_all(content.join("sbin")).unwrap();
        fs::write(content.join("sbin").join("nginx"), "#!/bin/sh\n").unwrap();

        let archive = dir.join("nginx.tgz");
        let status = Command::new("tar")
            .arg("-czf")
            .arg(&archive)
            .arg("-C")
            .arg(&content)
            .arg("sbin")
            .status()
            .unwrap();
        assert!(status.success());
        archive
    }

    #[test]
    fn delivers_local_archive() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(temp.path());
        let sha = sha256_file(&archive).unwrap();
        let dest = temp.path().join("layer");
        fs::create_dir_all(&dest).unwrap();

        let dep = dependency(format!("file://{}", archive.display()), sha.clone());
        let outcome = deliver(&dep, &dest).unwrap();

        assert_eq!(outcome.sha256, sha);
        assert!(dest.join("sbin").join("nginx").is_file());
    }

    #[test]
    fn checksum_mismatch_fails() {
        let temp = TempDir::new().unwrap();
        let archive = make_archive(temp.path());
        let dest = temp.path().join("layer");
        fs::create_dir_all(&dest).unwrap();

        let dep = dependency(archive.display().to_string(), sha256_bytes(b"other"));
        let err = deliver(&dep, &dest).unwrap_err();

        assert!(matches!(err, BuildpackError::ChecksumMismatch { .. }));
        assert!(!dest.join("sbin").exists());
        assert!(!staging_path(&dep).exists());
    }

    #[test]
    fn missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let dep = dependency(
            temp.path().join("absent.tgz").display().to_string(),
            "00".to_string(),
        );
        let err = deliver(&dep, temp.path()).unwrap_err();
        assert!(err.to_string().contains("absent.tgz"));
    }
}
