//! Verified download of an installer.
//!
//! `Start -> Downloaded -> {Verified, Mismatched}`. The body is streamed to
//! `<local_path>.part`, renamed onto `local_path`, hashed, and compared to the
//! pinned digest by exact string equality. On mismatch the file is deleted
//! before the error is returned. Nothing is retried.

mod artifact;
mod error;

pub use artifact::ReadyArtifact;
pub use error::{is_verification_failure, FetchError};

use crate::checksum::{self, DigestAlgorithm};
use crate::transfer::{self, TransferError, TransferOptions};
use std::fs::{self, File};
use std::path::Path;

/// Outcome of comparing a computed digest with the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Mismatched,
}

impl Verification {
    /// Exact, case-sensitive comparison. No trimming, no case folding.
    pub fn compare(expected: &str, actual: &str) -> Self {
        if expected == actual {
            Verification::Verified
        } else {
            Verification::Mismatched
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerifiedFetcher {
    opts: TransferOptions,
}

impl VerifiedFetcher {
    pub fn new(opts: TransferOptions) -> Self {
        Self { opts }
    }

    /// Download `source_url` to `local_path` and verify it against `expected_digest`.
    ///
    /// On success the file stays at `local_path` and is returned as a
    /// [`ReadyArtifact`]. On any failure no file is left at `local_path` or
    /// at its `.part` sibling.
    pub fn fetch_and_verify(
        &self,
        source_url: &str,
        local_path: &Path,
        expected_digest: &str,
        algorithm: DigestAlgorithm,
    ) -> Result<ReadyArtifact, FetchError> {
        let part = transfer::temp_path(local_path);
        let bytes = self.download(source_url, &part)?;

        if let Err(e) = fs::rename(&part, local_path) {
            remove_quietly(&part);
            return Err(FetchError::filesystem("rename", &part, e));
        }
        tracing::info!(url = source_url, path = %local_path.display(), bytes, "downloaded");

        let actual = match File::open(local_path)
            .and_then(|f| checksum::digest_reader(f, algorithm))
        {
            Ok(d) => d,
            Err(e) => {
                remove_quietly(local_path);
                return Err(FetchError::filesystem("read", local_path, e));
            }
        };

        match Verification::compare(expected_digest, &actual) {
            Verification::Verified => {
                tracing::info!(%algorithm, digest = %actual, "installer verified");
                Ok(ReadyArtifact::new(local_path.to_path_buf(), algorithm, actual))
            }
            Verification::Mismatched => {
                Err(reject(local_path, algorithm, expected_digest, actual))
            }
        }
    }

    /// Stream the body into `part`. Removes `part` on any failure.
    fn download(&self, url: &str, part: &Path) -> Result<u64, FetchError> {
        let mut file = File::create(part).map_err(|e| FetchError::filesystem("create", part, e))?;
        let res = transfer::fetch_into(url, &mut file, &self.opts)
            .and_then(|n| file.sync_all().map(|()| n).map_err(TransferError::Write));
        drop(file);
        res.map_err(|e| {
            remove_quietly(part);
            match e {
                TransferError::Write(io) => FetchError::filesystem("write", part, io),
                other => {
                    tracing::warn!(url, error = %other, "download failed");
                    FetchError::Transfer {
                        url: url.to_string(),
                        source: other,
                    }
                }
            }
        })
    }
}

/// Remove a mismatched download and build the error for it.
///
/// Always yields `Mismatch`; a failed removal is only logged.
fn reject(
    local_path: &Path,
    algorithm: DigestAlgorithm,
    expected_digest: &str,
    actual: String,
) -> FetchError {
    tracing::error!(
        %algorithm,
        expected = expected_digest,
        actual = %actual,
        path = %local_path.display(),
        "installer digest mismatch; removing download"
    );
    if let Err(e) = fs::remove_file(local_path) {
        tracing::error!(
            path = %local_path.display(),
            error = %e,
            "failed to remove mismatched download; delete it by hand"
        );
    }
    FetchError::Mismatch {
        path: local_path.to_path_buf(),
        algorithm,
        expected: expected_digest.to_string(),
        actual,
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial file");
        }
    }
}
