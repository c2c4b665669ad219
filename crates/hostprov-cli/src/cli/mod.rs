//! CLI for the hostprov provisioning tool.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hostprov_core::checksum::DigestAlgorithm;
use hostprov_core::fetcher::is_verification_failure;
use std::path::PathBuf;

use commands::{run_completions, run_digest, run_fetch, run_man, run_pipeline, run_plan};

/// Exit code for any failure other than a digest mismatch.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code when a downloaded installer does not match its pinned digest.
pub const EXIT_VERIFICATION_FAILED: i32 = 3;

/// Top-level CLI for hostprov.
#[derive(Debug, Parser)]
#[command(name = "hostprov")]
#[command(about = "hostprov: provision a web server, runtime and dependency manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run every configured step in order, stopping at the first failure.
    Run {
        /// Config file (default: ~/.config/hostprov/config.toml, created if missing).
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Directory the steps run in (overrides `base_dir` from the config).
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,
    },

    /// Show the resolved steps without running them.
    Plan {
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,
        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Download a file and keep it only if its digest matches.
    Fetch {
        /// Direct HTTP/HTTPS URL.
        url: String,
        /// Expected hex digest (compared exactly, case-sensitive).
        #[arg(long)]
        digest: String,
        #[arg(long, default_value = "sha384")]
        algorithm: DigestAlgorithm,
        /// Output path (default: last URL path segment in the current directory).
        #[arg(long, short = 'o', value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Print the digest of a file.
    Digest {
        /// Path to the file.
        path: PathBuf,
        #[arg(long, default_value = "sha384")]
        algorithm: DigestAlgorithm,
    },

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },

    /// Print the man page (roff).
    Man,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run { config, base_dir } => run_pipeline(config.as_deref(), base_dir)?,
            CliCommand::Plan {
                config,
                base_dir,
                json,
            } => run_plan(config.as_deref(), base_dir, json)?,
            CliCommand::Fetch {
                url,
                digest,
                algorithm,
                out,
            } => run_fetch(&url, &digest, algorithm, out)?,
            CliCommand::Digest { path, algorithm } => run_digest(&path, algorithm)?,
            CliCommand::Completions { shell } => run_completions(shell)?,
            CliCommand::Man => run_man()?,
        }

        Ok(())
    }
}

/// Process exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if is_verification_failure(err) {
        EXIT_VERIFICATION_FAILED
    } else {
        EXIT_FAILURE
    }
}

#[cfg(test)]
mod tests;
