//! Input file integrity checks.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{PipelineError, PipelineResult};

const CHUNK_SIZE: usize = 4096;

/// Compute the hex-encoded SHA-256 digest of a file, reading it in 4 KiB chunks.
pub fn hash_file(path: impl AsRef<Path>) -> PipelineResult<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Check that `path` is a regular file and, if `expected_hash` is given, that its SHA-256 matches.
///
/// The digest comparison ignores case and surrounding whitespace.
pub fn verify_file(path: impl AsRef<Path>, expected_hash: Option<&str>) -> PipelineResult<()> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PipelineError::NotAFile {
            path: path.to_path_buf(),
        });
    }

    if let Some(expected) = expected_hash {
        let actual = hash_file(path)?;
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(PipelineError::HashMismatch {
                path: path.to_path_buf(),
                expected: expected.trim().to_owned(),
                actual,
            });
        }
    }
    Ok(())
}
