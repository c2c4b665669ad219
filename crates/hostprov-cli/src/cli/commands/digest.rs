//! Digest command: hash a file with the chosen algorithm.

use anyhow::Result;
use hostprov_core::checksum::{self, DigestAlgorithm};
use std::path::Path;

/// Compute and print the digest of the given file.
pub fn run_digest(path: &Path, algorithm: DigestAlgorithm) -> Result<()> {
    let digest = checksum::digest_path(path, algorithm)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
