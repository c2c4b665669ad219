//! Fixed-order, fail-fast provisioning pipeline.
//!
//! Steps are resolved once from the configuration (units and placeholders
//! expanded), then run one after another in a single base directory. The
//! first failing step ends the run; later steps never start.

mod runner;

pub use runner::{StepContext, StepRunner, SystemRunner};

use crate::checksum::DigestAlgorithm;
use crate::config::{ProvisionConfig, StepConfig};
use crate::unit::ResolvedUnits;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Installer with placeholders already expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSpec {
    pub url: String,
    pub file_name: String,
    pub algorithm: DigestAlgorithm,
    pub expected_digest: String,
    pub interpreter: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Command { program: String, args: Vec<String> },
    VerifiedInstaller(InstallerSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub action: StepAction,
}

/// One line of `hostprov plan`.
#[derive(Debug, Clone, Serialize)]
pub struct StepDescription {
    pub index: usize,
    pub name: String,
    pub kind: &'static str,
    pub argv: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub steps_run: usize,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    base_dir: PathBuf,
    steps: Vec<Step>,
}

impl Pipeline {
    /// Validate `cfg` and resolve every step against `base_dir`.
    ///
    /// A relative `base_dir` is anchored to the current directory here, once:
    /// steps spawn inside it, so paths handed to them must not be relative to it.
    pub fn from_config(cfg: &ProvisionConfig, base_dir: PathBuf) -> Result<Self> {
        cfg.validate()?;
        let base_dir = absolute_base_dir(base_dir)?;
        let units = ResolvedUnits::resolve(&cfg.units, &cfg.runtime_version)?;
        let expand_all = |args: &[String]| -> Result<Vec<String>> {
            args.iter()
                .map(|a| units.expand(a).map_err(anyhow::Error::from))
                .collect()
        };

        let mut steps = Vec::with_capacity(cfg.steps.len());
        for step in &cfg.steps {
            let action = match step {
                StepConfig::Command { program, args, .. } => StepAction::Command {
                    program: units.expand(program)?,
                    args: expand_all(args)?,
                },
                StepConfig::VerifiedInstaller { .. } => {
                    let inst = &cfg.installer;
                    StepAction::VerifiedInstaller(InstallerSpec {
                        url: inst.url.clone(),
                        file_name: inst.file_name.clone(),
                        algorithm: inst.algorithm,
                        expected_digest: inst.expected_digest.clone(),
                        interpreter: units.expand(&inst.interpreter)?,
                        args: expand_all(&inst.args)?,
                    })
                }
            };
            steps.push(Step {
                name: step.name().to_string(),
                action,
            });
        }
        Ok(Self { base_dir, steps })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Resolved steps, as they would run.
    pub fn describe(&self) -> Vec<StepDescription> {
        self.steps
            .iter()
            .enumerate()
            .map(|(i, step)| match &step.action {
                StepAction::Command { program, args } => StepDescription {
                    index: i + 1,
                    name: step.name.clone(),
                    kind: "command",
                    argv: std::iter::once(program.clone()).chain(args.iter().cloned()).collect(),
                    source: None,
                    digest: None,
                },
                StepAction::VerifiedInstaller(inst) => StepDescription {
                    index: i + 1,
                    name: step.name.clone(),
                    kind: "verified_installer",
                    argv: [
                        inst.interpreter.clone(),
                        self.base_dir.join(&inst.file_name).to_string_lossy().into_owned(),
                    ]
                    .into_iter()
                    .chain(inst.args.iter().cloned())
                    .collect(),
                    source: Some(inst.url.clone()),
                    digest: Some(format!("{}:{}", inst.algorithm, inst.expected_digest)),
                },
            })
            .collect()
    }

    /// Run every step in order, stopping at the first failure.
    pub fn run(&self, runner: &mut dyn StepRunner) -> Result<RunSummary> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("create base directory {}", self.base_dir.display()))?;
        let ctx = StepContext {
            base_dir: &self.base_dir,
        };
        let total = self.steps.len();
        let mut summary = RunSummary::default();
        for (i, step) in self.steps.iter().enumerate() {
            let started = Instant::now();
            tracing::info!(step = i + 1, total, name = %step.name, "starting step");
            if let Err(e) = run_step(step, &ctx, runner) {
                tracing::error!(step = i + 1, name = %step.name, error = %format!("{:#}", e), "step failed; stopping");
                return Err(e).with_context(|| format!("step {} ({}) failed", i + 1, step.name));
            }
            tracing::info!(
                step = i + 1,
                name = %step.name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "step done"
            );
            summary.steps_run += 1;
        }
        Ok(summary)
    }
}

fn absolute_base_dir(base_dir: PathBuf) -> Result<PathBuf> {
    if base_dir.is_absolute() {
        return Ok(base_dir);
    }
    let cwd = std::env::current_dir().context("current directory")?;
    Ok(cwd.join(base_dir))
}

fn run_step(step: &Step, ctx: &StepContext<'_>, runner: &mut dyn StepRunner) -> Result<()> {
    match &step.action {
        StepAction::Command { program, args } => runner.run_command(ctx, program, args),
        StepAction::VerifiedInstaller(inst) => {
            let artifact = runner.fetch_verified(ctx, inst)?;
            let mut argv = Vec::with_capacity(inst.args.len() + 1);
            argv.push(artifact.path().to_string_lossy().into_owned());
            argv.extend(inst.args.iter().cloned());
            let ran = runner.run_command(ctx, &inst.interpreter, &argv);
            // The installer is single-use: remove it whether or not it succeeded.
            let discarded = artifact.discard();
            ran?;
            discarded?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
