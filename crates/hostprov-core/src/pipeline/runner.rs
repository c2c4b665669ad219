//! Executes individual steps against the real system.

use super::InstallerSpec;
use crate::fetcher::{FetchError, ReadyArtifact, VerifiedFetcher};
use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Per-run state passed to every step instead of changing the process cwd.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub base_dir: &'a Path,
}

/// Seam between the pipeline and the outside world.
pub trait StepRunner {
    /// Run `program` with `args` in `ctx.base_dir`; Err unless it exits successfully.
    fn run_command(&mut self, ctx: &StepContext<'_>, program: &str, args: &[String]) -> Result<()>;

    /// Download and verify the installer into `ctx.base_dir`.
    fn fetch_verified(
        &mut self,
        ctx: &StepContext<'_>,
        installer: &InstallerSpec,
    ) -> Result<ReadyArtifact, FetchError>;
}

/// Spawns real processes and performs real downloads.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    fetcher: VerifiedFetcher,
}

impl SystemRunner {
    pub fn new(fetcher: VerifiedFetcher) -> Self {
        Self { fetcher }
    }
}

impl StepRunner for SystemRunner {
    fn run_command(&mut self, ctx: &StepContext<'_>, program: &str, args: &[String]) -> Result<()> {
        tracing::debug!(program, ?args, dir = %ctx.base_dir.display(), "spawning");
        let status = Command::new(program)
            .args(args)
            .current_dir(ctx.base_dir)
            .status()
            .with_context(|| format!("failed to start {}", program))?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", program, status);
        }
        Ok(())
    }

    fn fetch_verified(
        &mut self,
        ctx: &StepContext<'_>,
        installer: &InstallerSpec,
    ) -> Result<ReadyArtifact, FetchError> {
        let local = ctx.base_dir.join(&installer.file_name);
        self.fetcher.fetch_and_verify(
            &installer.url,
            &local,
            &installer.expected_digest,
            installer.algorithm,
        )
    }
}
