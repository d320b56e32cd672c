//! SHA-256 content hashing used for change detection

use crate::error::{BuildpackError, BuildpackResult};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Hash a file's contents using SHA256, returning the full hex digest
pub fn sha256_file(path: &Path) -> BuildpackResult<String> {
    let file = File::open(path)
        .map_err(|e| BuildpackError::io(format!("opening {}", path.display()), e))?;
    sha256_reader(file).map_err(|e| BuildpackError::io(format!("reading {}", path.display()), e))
}

/// Hash everything readable from `reader`
pub fn sha256_reader(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hash an in-memory byte slice
#[cfg(test)]
pub(crate) fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
