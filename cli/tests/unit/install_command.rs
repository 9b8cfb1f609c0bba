//! End-to-end tests for `commands::install::run` against the spy runner.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use kiro_bootstrap::application::services::pipeline::Invocation;
use kiro_bootstrap::commands::install;
use kiro_bootstrap::domain::config::BootstrapConfig;
use kiro_bootstrap::domain::error::{ConfigError, FetchError, IntegrityError};
use kiro_bootstrap::infra::fs::{LocalFs, sha256_file};
use tempfile::TempDir;

use crate::mocks::{
    CloneBehavior, FixedEnvironment, RecordingReporter, SpyRunner, entry_count, script_with_body,
    valid_installer,
};

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

async fn run_with(
    config: &BootstrapConfig,
    runner: &SpyRunner,
    guard: &FixedEnvironment,
    reporter: &RecordingReporter,
    args: &[String],
    stdin_is_tty: bool,
) -> anyhow::Result<i32> {
    let invocation = Invocation { args, stdin_is_tty };
    install::run(config, guard, runner, &LocalFs, reporter, &invocation).await
}

#[tokio::test]
async fn test_install_success_forwards_args_and_removes_workspace() {
    let scratch = TempDir::new().expect("tempdir");
    let runner = SpyRunner::with_installer(valid_installer(), 0o644);
    let guard = FixedEnvironment::new(scratch.path());
    let reporter = RecordingReporter::default();

    let code = run_with(
        &BootstrapConfig::builtin(),
        &runner,
        &guard,
        &reporter,
        &strings(&["--user"]),
        false,
    )
    .await
    .expect("install should succeed");

    assert_eq!(code, 0);
    assert_eq!(entry_count(scratch.path()), 0, "workspace must be removed");

    let status_calls = runner.status_calls();
    assert_eq!(status_calls.len(), 1);
    let call = &status_calls[0];
    assert_eq!(call[0], "/bin/bash");
    assert!(call[1].ends_with("/install-kiro.sh"), "{call:?}");
    assert!(call[1].starts_with('/'), "installer path must be absolute");
    assert_eq!(&call[2..], ["--user"]);
    assert_eq!(runner.observed_modes(), vec![0o755]);
}

#[tokio::test]
async fn test_install_propagates_installer_exit_code() {
    let scratch = TempDir::new().expect("tempdir");
    let mut runner = SpyRunner::with_installer(valid_installer(), 0o755);
    runner.installer_exit = 42;
    let guard = FixedEnvironment::new(scratch.path());

    let code = run_with(
        &BootstrapConfig::builtin(),
        &runner,
        &guard,
        &RecordingReporter::default(),
        &[],
        true,
    )
    .await
    .unwrap();

    assert_eq!(code, 42);
    assert_eq!(entry_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_install_clone_failure_is_fetch_error_and_cleans_up() {
    let scratch = TempDir::new().expect("tempdir");
    let runner = SpyRunner::new(CloneBehavior::Fail(
        128,
        "Cloning into '.'...\nfatal: repository not found\n".to_string(),
    ));
    let guard = FixedEnvironment::new(scratch.path());

    let err = run_with(
        &BootstrapConfig::builtin(),
        &runner,
        &guard,
        &RecordingReporter::default(),
        &[],
        true,
    )
    .await
    .expect_err("clone failure must abort");

    match err.downcast_ref::<FetchError>() {
        Some(FetchError::CloneFailed { reason, .. }) => {
            assert_eq!(reason, "fatal: repository not found");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(runner.status_calls().is_empty());
    assert_eq!(entry_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_install_clone_timeout_is_reported() {
    let scratch = TempDir::new().expect("tempdir");
    let runner = SpyRunner::new(CloneBehavior::TimeOut);
    let guard = FixedEnvironment::new(scratch.path());

    let err = run_with(
        &BootstrapConfig::builtin(),
        &runner,
        &guard,
        &RecordingReporter::default(),
        &[],
        true,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<FetchError>(),
        Some(FetchError::TimedOut { seconds: 300, .. })
    ));
    assert_eq!(entry_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_install_missing_shebang_never_runs() {
    let scratch = TempDir::new().expect("tempdir");
    let content = valid_installer()[b"#!/bin/sh\n".len()..].to_vec();
    let runner = SpyRunner::with_installer(content, 0o755);
    let guard = FixedEnvironment::new(scratch.path());

    let err = run_with(
        &BootstrapConfig::builtin(),
        &runner,
        &guard,
        &RecordingReporter::default(),
        &[],
        true,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<IntegrityError>(),
        Some(IntegrityError::MissingShebang)
    ));
    assert!(
        err.to_string()
            .contains("Installer is missing a shebang ('#!') on its first line")
    );
    assert!(runner.status_calls().is_empty());
    assert_eq!(entry_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_invalid_locator_spawns_nothing() {
    let scratch = TempDir::new().expect("tempdir");
    let runner = SpyRunner::with_installer(valid_installer(), 0o755);
    let guard = FixedEnvironment::new(scratch.path());
    let config = BootstrapConfig {
        locator: "https://github.com/org/repo;rm -rf ~".to_string(),
        ..BootstrapConfig::builtin()
    };

    let err = run_with(
        &config,
        &runner,
        &guard,
        &RecordingReporter::default(),
        &[],
        true,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::LocatorMetachar { ch: ';', .. })
    ));
    assert_eq!(guard.prepared(), 0, "environment must not be touched");
    assert!(runner.calls().is_empty());
    assert!(runner.status_calls().is_empty());
    assert_eq!(entry_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_origin_mismatch_aborts_before_verification() {
    let scratch = TempDir::new().expect("tempdir");
    let mut runner = SpyRunner::with_installer(valid_installer(), 0o755);
    runner.origin = "https://github.com/evil/kiro-installer".to_string();
    let guard = FixedEnvironment::new(scratch.path());

    let err = run_with(
        &BootstrapConfig::builtin(),
        &runner,
        &guard,
        &RecordingReporter::default(),
        &[],
        true,
    )
    .await
    .unwrap_err();

    match err.downcast_ref::<FetchError>() {
        Some(FetchError::OriginMismatch { expected, actual }) => {
            assert_eq!(expected, "https://github.com/kirodotdev/kiro-installer");
            assert_eq!(actual, "https://github.com/evil/kiro-installer");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(runner.status_calls().is_empty());
}

#[tokio::test]
async fn test_pinned_digest_match_and_mismatch() {
    let content = script_with_body("exit 0\n");
    let reference = {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("marker");
        std::fs::write(&path, &content).unwrap();
        sha256_file(&path).unwrap()
    };

    let scratch = TempDir::new().expect("tempdir");
    let guard = FixedEnvironment::new(scratch.path());
    let pinned = BootstrapConfig {
        reference_digest: Some(reference.clone()),
        ..BootstrapConfig::builtin()
    };
    let runner = SpyRunner::with_installer(content.clone(), 0o755);
    let reporter = RecordingReporter::default();
    let code = run_with(&pinned, &runner, &guard, &reporter, &[], true)
        .await
        .unwrap();
    assert_eq!(code, 0);
    assert!(
        reporter.warnings().iter().all(|w| !w.contains("digest")),
        "{:?}",
        reporter.warnings()
    );

    let mut tampered = content;
    tampered[20] ^= 0x01;
    let runner = SpyRunner::with_installer(tampered, 0o755);
    let err = run_with(
        &pinned,
        &runner,
        &guard,
        &RecordingReporter::default(),
        &[],
        true,
    )
    .await
    .unwrap_err();
    match err.downcast_ref::<IntegrityError>() {
        Some(IntegrityError::TamperDetected { expected, actual }) => {
            assert_eq!(expected, &reference);
            assert_ne!(actual, &reference);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(runner.status_calls().is_empty());
    assert_eq!(entry_count(scratch.path()), 0);
}

#[tokio::test]
async fn test_reporter_sees_summary_and_notices() {
    let scratch = TempDir::new().expect("tempdir");
    let runner = SpyRunner::with_installer(valid_installer(), 0o644);
    let guard = FixedEnvironment::new(scratch.path());
    let reporter = RecordingReporter::default();

    run_with(
        &BootstrapConfig::builtin(),
        &runner,
        &guard,
        &reporter,
        &strings(&["--install"]),
        false,
    )
    .await
    .unwrap();

    let events = reporter.events();
    assert!(
        events
            .iter()
            .any(|e| e.starts_with("success: Verified install-kiro.sh") && e.contains("mode 644")),
        "{events:?}"
    );
    let warnings = reporter.warnings();
    assert!(warnings.iter().any(|w| w.contains("No reference digest")));
    assert!(warnings.iter().any(|w| w.contains("root privileges")));
}

#[tokio::test]
async fn test_clone_command_is_shallow_and_separated() {
    let scratch = TempDir::new().expect("tempdir");
    let runner = SpyRunner::with_installer(valid_installer(), 0o755);
    let guard = FixedEnvironment::new(scratch.path());

    run_with(
        &BootstrapConfig::builtin(),
        &runner,
        &guard,
        &RecordingReporter::default(),
        &[],
        true,
    )
    .await
    .unwrap();

    let clone = runner
        .calls()
        .into_iter()
        .find(|c| c.get(1).map(String::as_str) == Some("clone"))
        .expect("clone call");
    assert_eq!(clone[0], "git");
    assert!(clone.contains(&"--depth".to_string()));
    assert!(clone.contains(&"--single-branch".to_string()));
    let sep = clone.iter().position(|a| a == "--").expect("-- separator");
    assert_eq!(clone[sep + 1], "https://github.com/kirodotdev/kiro-installer");
}
