//! Error taxonomy for a verified fetch.

use crate::checksum::DigestAlgorithm;
use crate::transfer::TransferError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The download itself failed; nothing was left on disk.
    #[error("download of {url} failed: {source}")]
    Transfer {
        url: String,
        #[source]
        source: TransferError,
    },

    /// The downloaded bytes do not match the pinned digest. The file has
    /// already been removed when this is returned.
    #[error("{algorithm} digest of {} is {actual}, expected {expected}", .path.display())]
    Mismatch {
        path: PathBuf,
        algorithm: DigestAlgorithm,
        expected: String,
        actual: String,
    },

    /// Local storage failed (create, write, rename, read or remove).
    #[error("failed to {op} {}: {source}", .path.display())]
    Filesystem {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub(crate) fn filesystem(op: &'static str, path: &Path, source: io::Error) -> Self {
        FetchError::Filesystem {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self, FetchError::Mismatch { .. })
    }
}

/// True if `err` (or anything it wraps) is a digest mismatch.
pub fn is_verification_failure(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<FetchError>()
            .map(FetchError::is_mismatch)
            .unwrap_or(false)
    })
}
