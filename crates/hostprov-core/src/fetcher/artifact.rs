//! Verified artifact handed to the caller.

use super::FetchError;
use crate::checksum::DigestAlgorithm;
use std::path::{Path, PathBuf};

/// A downloaded file whose digest matched the pinned value.
///
/// Only `VerifiedFetcher` constructs these, so holding one means the bytes at
/// `path` were checked. The caller owns the file from here on.
#[derive(Debug)]
pub struct ReadyArtifact {
    path: PathBuf,
    algorithm: DigestAlgorithm,
    digest: String,
}

impl ReadyArtifact {
    pub(crate) fn new(path: PathBuf, algorithm: DigestAlgorithm, digest: String) -> Self {
        Self {
            path,
            algorithm,
            digest,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Keep the file and give up the handle.
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// Remove the file after it has been used.
    pub fn discard(self) -> Result<(), FetchError> {
        std::fs::remove_file(&self.path).map_err(|e| FetchError::filesystem("remove", &self.path, e))?;
        tracing::debug!(path = %self.path.display(), "discarded artifact");
        Ok(())
    }
}
