use crate::checksum::DigestAlgorithm;
use crate::unit::InstallableUnit;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Curl limits for the installer download (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    pub connect_timeout_secs: u64,
    /// Upper bound on the whole transfer.
    pub timeout_secs: u64,
    /// Abort when throughput stays below this many bytes/sec ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 300,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
        }
    }
}

/// The installer fetched and verified by a `verified_installer` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallerConfig {
    pub url: String,
    /// File name inside the base directory.
    pub file_name: String,
    #[serde(default)]
    pub algorithm: DigestAlgorithm,
    /// Pinned hex digest. Compared exactly, so case matters.
    #[serde(default)]
    pub expected_digest: String,
    /// Program that runs the installer, e.g. `php`.
    pub interpreter: String,
    /// Arguments passed after the installer path.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            url: "https://getcomposer.org/installer".to_string(),
            file_name: "composer-setup.php".to_string(),
            algorithm: DigestAlgorithm::Sha384,
            expected_digest: String::new(),
            interpreter: "php".to_string(),
            args: vec![
                "--install-dir=/usr/local/bin".to_string(),
                "--filename=composer".to_string(),
            ],
        }
    }
}

/// One entry of the ordered `[[steps]]` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepConfig {
    /// Run an external program in the base directory.
    Command {
        name: String,
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Fetch, verify, run and discard the `[installer]`.
    VerifiedInstaller { name: String },
}

impl StepConfig {
    pub fn name(&self) -> &str {
        match self {
            StepConfig::Command { name, .. } | StepConfig::VerifiedInstaller { name } => name.as_str(),
        }
    }
}

/// Global configuration loaded from `~/.config/hostprov/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Directory every step runs in. `None` = current directory at startup.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Runtime version substituted for `{version}`.
    pub runtime_version: String,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub installer: InstallerConfig,
    #[serde(default)]
    pub units: Vec<InstallableUnit>,
    pub steps: Vec<StepConfig>,
}

fn command(name: &str, program: &str, args: &[&str]) -> StepConfig {
    StepConfig::Command {
        name: name.to_string(),
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

fn unit(name: &str, template: &str) -> InstallableUnit {
    InstallableUnit {
        name: name.to_string(),
        template: template.to_string(),
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            runtime_version: "8.2".to_string(),
            transfer: TransferConfig::default(),
            installer: InstallerConfig::default(),
            units: vec![
                unit("web-server", "nginx"),
                unit("php-cli", "php{version}-cli"),
                unit("php-fpm", "php{version}-fpm"),
                unit("php-mbstring", "php{version}-mbstring"),
                unit("php-xml", "php{version}-xml"),
                unit("php-curl", "php{version}-curl"),
                unit("php-zip", "php{version}-zip"),
            ],
            steps: vec![
                command("refresh package index", "apt-get", &["update"]),
                command(
                    "install prerequisites",
                    "apt-get",
                    &["install", "-y", "software-properties-common", "curl", "unzip"],
                ),
                command(
                    "register runtime repository",
                    "add-apt-repository",
                    &["-y", "ppa:ondrej/php"],
                ),
                command("refresh package index", "apt-get", &["update"]),
                command(
                    "install web server",
                    "apt-get",
                    &["install", "-y", "{unit:web-server}"],
                ),
                command(
                    "install runtime",
                    "apt-get",
                    &[
                        "install",
                        "-y",
                        "{unit:php-cli}",
                        "{unit:php-fpm}",
                        "{unit:php-mbstring}",
                        "{unit:php-xml}",
                        "{unit:php-curl}",
                        "{unit:php-zip}",
                    ],
                ),
                StepConfig::VerifiedInstaller {
                    name: "install dependency manager".to_string(),
                },
                command("web server version", "nginx", &["-v"]),
                command("runtime version", "php", &["-v"]),
                command("dependency manager version", "composer", &["--version"]),
            ],
        }
    }
}

impl ProvisionConfig {
    /// Check the parts a run depends on before any step executes.
    pub fn validate(&self) -> Result<()> {
        if self.runtime_version.trim().is_empty() {
            anyhow::bail!("runtime_version must not be empty");
        }
        let mut seen = HashSet::new();
        for u in &self.units {
            if !seen.insert(u.name.as_str()) {
                anyhow::bail!("duplicate unit name {:?}", u.name);
            }
        }
        if self.steps.is_empty() {
            anyhow::bail!("no steps configured");
        }
        for (i, step) in self.steps.iter().enumerate() {
            if step.name().trim().is_empty() {
                anyhow::bail!("step {} has an empty name", i + 1);
            }
        }
        if self
            .steps
            .iter()
            .any(|s| matches!(s, StepConfig::VerifiedInstaller { .. }))
        {
            self.validate_installer()?;
        }
        Ok(())
    }

    fn validate_installer(&self) -> Result<()> {
        let inst = &self.installer;
        if inst.expected_digest.is_empty() {
            anyhow::bail!(
                "installer.expected_digest is not set; pin the {} digest published for {}",
                inst.algorithm,
                inst.url
            );
        }
        if inst.expected_digest.len() != inst.algorithm.hex_len() {
            anyhow::bail!(
                "installer.expected_digest has {} characters; a {} digest has {}",
                inst.expected_digest.len(),
                inst.algorithm,
                inst.algorithm.hex_len()
            );
        }
        if inst.expected_digest.bytes().any(|b| b.is_ascii_uppercase()) {
            // Computed digests are lowercase, so this pin can never match.
            tracing::warn!("installer.expected_digest contains upper-case characters");
        }
        if inst.file_name.trim().is_empty() || inst.file_name.contains('/') {
            anyhow::bail!("installer.file_name must be a plain file name");
        }
        if inst.interpreter.trim().is_empty() {
            anyhow::bail!("installer.interpreter must not be empty");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hostprov")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from `path`.
pub fn load_from(path: &Path) -> Result<ProvisionConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: ProvisionConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

pub fn to_toml_string(cfg: &ProvisionConfig) -> Result<String> {
    Ok(toml::to_string_pretty(cfg)?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ProvisionConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ProvisionConfig::default();
        let toml = to_toml_string(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}
