//! `hostprov fetch` – one-shot verified download.

use anyhow::{Context, Result};
use hostprov_core::checksum::DigestAlgorithm;
use hostprov_core::fetcher::VerifiedFetcher;
use hostprov_core::transfer::filename_from_url;
use std::path::PathBuf;

pub fn run_fetch(
    url: &str,
    digest: &str,
    algorithm: DigestAlgorithm,
    out: Option<PathBuf>,
) -> Result<()> {
    let local = match out {
        Some(p) => p,
        None => {
            let name = filename_from_url(url)
                .with_context(|| format!("cannot derive a file name from {}; pass --out", url))?;
            std::env::current_dir()?.join(name)
        }
    };
    let artifact = VerifiedFetcher::default().fetch_and_verify(url, &local, digest, algorithm)?;
    println!("{}  {}", artifact.digest(), artifact.path().display());
    Ok(())
}
