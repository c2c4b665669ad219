//! CLI command handlers. Each command is in its own file.

mod completions;
mod digest;
mod fetch;
mod plan;
mod run;

pub use completions::{run_completions, run_man};
pub use digest::run_digest;
pub use fetch::run_fetch;
pub use plan::run_plan;
pub use run::run_pipeline;

use anyhow::{Context, Result};
use hostprov_core::config::{self, ProvisionConfig};
use hostprov_core::pipeline::Pipeline;
use std::path::{Path, PathBuf};

/// Load the config (explicit path or XDG default) and build the pipeline.
/// Base directory precedence: `--base-dir`, then `base_dir` in the config, then cwd.
pub(crate) fn load_pipeline(
    config_path: Option<&Path>,
    base_dir: Option<PathBuf>,
) -> Result<(ProvisionConfig, Pipeline)> {
    let cfg = match config_path {
        Some(p) => config::load_from(p)?,
        None => config::load_or_init()?,
    };
    tracing::debug!("loaded config: {:?}", cfg);
    let base_dir = match base_dir.or_else(|| cfg.base_dir.clone()) {
        Some(d) => d,
        None => std::env::current_dir().context("current directory")?,
    };
    let pipeline = Pipeline::from_config(&cfg, base_dir)?;
    Ok((cfg, pipeline))
}
