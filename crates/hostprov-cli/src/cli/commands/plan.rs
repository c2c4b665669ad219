//! `hostprov plan` – show the resolved steps.

use super::load_pipeline;
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn run_plan(config_path: Option<&Path>, base_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let (_, pipeline) = load_pipeline(config_path, base_dir)?;
    let steps = pipeline.describe();
    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }
    println!("base dir: {}", pipeline.base_dir().display());
    for s in steps {
        println!("{:>2}. {:<32} {}", s.index, s.name, s.argv.join(" "));
        if let (Some(src), Some(digest)) = (&s.source, &s.digest) {
            println!("    fetch {} ({})", src, digest);
        }
    }
    Ok(())
}
