//! `hostprov run` – execute the provisioning steps.

use super::load_pipeline;
use anyhow::Result;
use hostprov_core::fetcher::VerifiedFetcher;
use hostprov_core::pipeline::SystemRunner;
use hostprov_core::transfer::TransferOptions;
use std::path::{Path, PathBuf};

pub fn run_pipeline(config_path: Option<&Path>, base_dir: Option<PathBuf>) -> Result<()> {
    let (cfg, pipeline) = load_pipeline(config_path, base_dir)?;
    let fetcher = VerifiedFetcher::new(TransferOptions::from(&cfg.transfer));
    let mut runner = SystemRunner::new(fetcher);

    println!(
        "Provisioning in {} ({} steps)",
        pipeline.base_dir().display(),
        pipeline.steps().len()
    );
    let summary = pipeline.run(&mut runner)?;
    println!("Done: {} steps completed.", summary.steps_run);
    Ok(())
}
