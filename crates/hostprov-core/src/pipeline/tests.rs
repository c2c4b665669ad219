use super::*;
use crate::checksum::digest_bytes;
use crate::fetcher::{is_verification_failure, FetchError, ReadyArtifact};
use crate::unit::InstallableUnit;

const SHA384_HELLO: &str = "59e1748777448c69de6b800d7a33bbfb9ff1b463e44354c3553bcdb9c666fa90125a3c79f90397bdf5f6a13de828684f";

/// Records calls; serves `payload` for the installer and fails programs in `failing`.
struct RecordingRunner {
    calls: Vec<String>,
    payload: &'static [u8],
    failing: Vec<&'static str>,
}

impl RecordingRunner {
    fn new(payload: &'static [u8]) -> Self {
        Self {
            calls: Vec::new(),
            payload,
            failing: Vec::new(),
        }
    }
}

impl StepRunner for RecordingRunner {
    fn run_command(&mut self, ctx: &StepContext<'_>, program: &str, args: &[String]) -> Result<()> {
        assert!(ctx.base_dir.is_dir());
        self.calls.push(format!("{} {}", program, args.join(" ")).trim_end().to_string());
        if self.failing.contains(&program) {
            anyhow::bail!("{} exited with exit status: 1", program);
        }
        Ok(())
    }

    fn fetch_verified(
        &mut self,
        ctx: &StepContext<'_>,
        installer: &InstallerSpec,
    ) -> Result<ReadyArtifact, FetchError> {
        self.calls.push(format!("fetch {}", installer.url));
        let path = ctx.base_dir.join(&installer.file_name);
        let actual = digest_bytes(self.payload, installer.algorithm);
        if actual != installer.expected_digest {
            return Err(FetchError::Mismatch {
                path,
                algorithm: installer.algorithm,
                expected: installer.expected_digest.clone(),
                actual,
            });
        }
        std::fs::write(&path, self.payload).unwrap();
        Ok(ReadyArtifact::new(path, installer.algorithm, actual))
    }
}

fn config() -> ProvisionConfig {
    ProvisionConfig {
        base_dir: None,
        runtime_version: "8.2".into(),
        transfer: Default::default(),
        installer: crate::config::InstallerConfig {
            expected_digest: SHA384_HELLO.into(),
            ..Default::default()
        },
        units: vec![InstallableUnit {
            name: "php-fpm".into(),
            template: "php{version}-fpm".into(),
        }],
        steps: vec![
            StepConfig::Command {
                name: "install runtime".into(),
                program: "apt-get".into(),
                args: vec!["install".into(), "-y".into(), "{unit:php-fpm}".into()],
            },
            StepConfig::VerifiedInstaller {
                name: "install composer".into(),
            },
            StepConfig::Command {
                name: "print version".into(),
                program: "composer".into(),
                args: vec!["--version".into()],
            },
        ],
    }
}

#[test]
fn resolves_units_once() {
    let p = Pipeline::from_config(&config(), PathBuf::from("/srv/app")).unwrap();
    assert_eq!(
        p.steps()[0].action,
        StepAction::Command {
            program: "apt-get".into(),
            args: vec!["install".into(), "-y".into(), "php8.2-fpm".into()],
        }
    );
    match &p.steps()[1].action {
        StepAction::VerifiedInstaller(inst) => {
            assert_eq!(inst.url, "https://getcomposer.org/installer");
            assert_eq!(inst.expected_digest, SHA384_HELLO);
        }
        other => panic!("expected installer, got {:?}", other),
    }
}

#[test]
fn unknown_unit_is_plan_error() {
    let mut cfg = config();
    cfg.steps[0] = StepConfig::Command {
        name: "x".into(),
        program: "apt-get".into(),
        args: vec!["{unit:mysql}".into()],
    };
    let err = Pipeline::from_config(&cfg, PathBuf::from("/srv")).unwrap_err();
    assert!(err.to_string().contains("mysql"));
}

#[test]
fn runs_in_order_and_discards_installer() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("app");
    let p = Pipeline::from_config(&config(), base.clone()).unwrap();
    let mut runner = RecordingRunner::new(b"hello");
    let summary = p.run(&mut runner).unwrap();
    assert_eq!(summary.steps_run, 3);

    let installer = base.join("composer-setup.php");
    assert_eq!(
        runner.calls,
        vec![
            "apt-get install -y php8.2-fpm".to_string(),
            "fetch https://getcomposer.org/installer".to_string(),
            format!(
                "php {} --install-dir=/usr/local/bin --filename=composer",
                installer.display()
            ),
            "composer --version".to_string(),
        ]
    );
    assert!(!installer.exists(), "installer must be discarded after use");
}

#[test]
fn mismatch_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let p = Pipeline::from_config(&config(), dir.path().to_path_buf()).unwrap();
    let mut runner = RecordingRunner::new(b"world");
    let err = p.run(&mut runner).unwrap_err();
    assert!(is_verification_failure(&err));
    assert!(format!("{:#}", err).contains("step 2 (install composer) failed"));
    // Neither the installer nor any later step ran.
    assert_eq!(runner.calls.len(), 2);
    assert!(!dir.path().join("composer-setup.php").exists());
}

#[test]
fn command_failure_is_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    let p = Pipeline::from_config(&config(), dir.path().to_path_buf()).unwrap();
    let mut runner = RecordingRunner::new(b"hello");
    runner.failing.push("apt-get");
    let err = p.run(&mut runner).unwrap_err();
    assert!(!is_verification_failure(&err));
    assert!(err.to_string().contains("step 1 (install runtime) failed"));
    assert_eq!(runner.calls, vec!["apt-get install -y php8.2-fpm".to_string()]);
}

#[test]
fn installer_removed_even_when_it_fails() {
    let dir = tempfile::tempdir().unwrap();
    let p = Pipeline::from_config(&config(), dir.path().to_path_buf()).unwrap();
    let mut runner = RecordingRunner::new(b"hello");
    runner.failing.push("php");
    let err = p.run(&mut runner).unwrap_err();
    assert!(err.to_string().contains("step 2"));
    assert!(!dir.path().join("composer-setup.php").exists());
}

#[test]
fn describe_lists_resolved_steps() {
    let p = Pipeline::from_config(&config(), PathBuf::from("/srv/app")).unwrap();
    let d = p.describe();
    assert_eq!(d.len(), 3);
    assert_eq!(d[0].kind, "command");
    assert_eq!(d[0].argv, vec!["apt-get", "install", "-y", "php8.2-fpm"]);
    assert_eq!(d[1].kind, "verified_installer");
    assert_eq!(d[1].argv[1], "/srv/app/composer-setup.php");
    assert_eq!(d[1].source.as_deref(), Some("https://getcomposer.org/installer"));
    assert_eq!(d[1].digest, Some(format!("sha384:{}", SHA384_HELLO)));
    assert_eq!(d[2].index, 3);
}

#[test]
fn relative_base_dir_is_anchored_once() {
    let p = Pipeline::from_config(&config(), PathBuf::from("work")).unwrap();
    let cwd = std::env::current_dir().unwrap();
    assert_eq!(p.base_dir(), cwd.join("work").as_path());
    let d = p.describe();
    assert_eq!(
        d[1].argv[1],
        cwd.join("work").join("composer-setup.php").to_string_lossy()
    );
}
