
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use std::time::Duration;

use jobrunner::config::RunnerConfig;
use jobrunner::error::{JobError, LookupError};
use jobrunner::job::{JobDescriptor, JobLoader, JobOrigin, JobRegistry, Runnable};
use jobrunner::plugin::PluginLoader;
use jobrunner::runner::Runner;
use jobrunner::worker::ExecutionOutcome;
use test_harness::{no_signal, test_context};

/// Build the workspace plugin crates once, into a target directory of their
/// own, and return the directory holding the artifacts.
fn plugin_build_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let target_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("plugins");
        let output = Command::new(env!("CARGO"))
            .arg("build")
            .arg("--manifest-path")
            .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml"))
            .arg("--target-dir")
            .arg(&target_dir)
            .args(["-p", "plugin-demo"])
            .args(["-p", "plugin-fixture-abi-v2"])
            .args(["-p", "plugin-fixture-no-run"])
            .output()
            .expect("failed to run cargo");
        assert!(
            output.status.success(),
            "building plugin crates failed:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
        target_dir.join("debug")
    })
}

/// Path of the built cdylib for the library named `lib_name`.
fn built_plugin(lib_name: &str) -> PathBuf {
    plugin_build_dir().join(format!(
        "{}{}{}",
        std::env::consts::DLL_PREFIX,
        lib_name,
        std::env::consts::DLL_SUFFIX
    ))
}

/// A shared library that exists on common Linux systems and exports no `Run`.
fn system_library() -> Option<PathBuf> {
    [
        "/lib/x86_64-linux-gnu/libm.so.6",
        "/usr/lib/x86_64-linux-gnu/libm.so.6",
        "/lib/aarch64-linux-gnu/libm.so.6",
        "/usr/lib/aarch64-linux-gnu/libm.so.6",
        "/lib64/libm.so.6",
        "/usr/lib64/libm.so.6",
        "/lib/libm.so.6",
    ]
    .iter()
    .map(PathBuf::from)
    .find(|p| p.exists())
}

fn place_artifact(dir: &Path, loader: &PluginLoader, name: &str, source: &Path) -> PathBuf {
    let target = loader.artifact_path(name);
    assert_eq!(target.parent(), Some(dir));
    std::fs::copy(source, &target).unwrap();
    target
}

#[test]
fn test_missing_artifact_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());

    let err = loader.load("Unknown").err().expect("load should fail");

    match err {
        LookupError::ArtifactNotFound { path, .. } => {
            assert_eq!(path, loader.artifact_path("Unknown"));
        }
        other => panic!("expected ArtifactNotFound, got {:?}", other),
    }
}

#[test]
fn test_unloadable_artifact_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());
    std::fs::write(loader.artifact_path("Garbage"), b"definitely not an ELF file").unwrap();

    let err = loader.load("Garbage").err().expect("load should fail");

    assert!(
        matches!(err, LookupError::ArtifactNotFound { .. }),
        "got {:?}",
        err
    );
}

#[test]
fn test_library_without_entry_point_is_mismatch() {
    let Some(libm) = system_library() else {
        eprintln!("no system libm found, skipping");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());
    let artifact = place_artifact(dir.path(), &loader, "NoRunJob", &libm);

    let err = loader.load("NoRunJob").err().expect("load should fail");

    match err {
        LookupError::EntryPointMismatch { path, reason } => {
            assert_eq!(path, artifact);
            assert!(reason.contains("RUN_ABI_VERSION"), "reason: {}", reason);
        }
        other => panic!("expected EntryPointMismatch, got {:?}", other),
    }
}

#[test]
fn test_artifact_path_uses_job_name_verbatim() {
    let loader = PluginLoader::new("/srv/jobs");
    let path = loader.artifact_path("Nightly.Report");
    assert_eq!(
        path,
        PathBuf::from(format!(
            "/srv/jobs/Nightly.Report.{}",
            std::env::consts::DLL_EXTENSION
        ))
    );
}

#[test]
fn test_unsupported_abi_version_is_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());
    let artifact = place_artifact(
        dir.path(),
        &loader,
        "AbiV2Job",
        &built_plugin("fixture_abi_v2"),
    );

    let err = loader.load("AbiV2Job").err().expect("load should fail");

    match err {
        LookupError::EntryPointMismatch { path, reason } => {
            assert_eq!(path, artifact);
            assert!(reason.contains("RUN_ABI_VERSION is 2"), "reason: {}", reason);
        }
        other => panic!("expected EntryPointMismatch, got {:?}", other),
    }
}

#[test]
fn test_missing_run_symbol_is_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());
    let artifact = place_artifact(
        dir.path(),
        &loader,
        "NoRunJob",
        &built_plugin("fixture_no_run"),
    );

    let err = loader.load("NoRunJob").err().expect("load should fail");

    match err {
        LookupError::EntryPointMismatch { path, reason } => {
            assert_eq!(path, artifact);
            assert!(reason.starts_with("missing Run"), "reason: {}", reason);
        }
        other => panic!("expected EntryPointMismatch, got {:?}", other),
    }
}

#[test]
fn test_demo_plugin_reports_invalid_arguments_status() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());
    place_artifact(
        dir.path(),
        &loader,
        "PluginDemoJob",
        &built_plugin("plugin_demo"),
    );

    let job = loader.load("PluginDemoJob").unwrap();
    let result = job.run(
        &test_context("PluginDemoJob"),
        "PluginDemoJob",
        &["Ada".to_string()],
    );

    assert_eq!(result, Err(JobError::PluginStatus(2)));
}

#[tokio::test]
async fn test_demo_plugin_completes_through_runner() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());
    let artifact = place_artifact(
        dir.path(),
        &loader,
        "PluginDemoJob",
        &built_plugin("plugin_demo"),
    );
    let config = RunnerConfig::default()
        .with_deadline(Duration::from_secs(30))
        .with_liveness_interval(Duration::from_secs(1))
        .with_plugin_dir(dir.path())
        .without_diagnostics();
    let runner = Runner::with_plugins(config, JobRegistry::builder().build());
    let descriptor = JobDescriptor::from_cli("PluginDemoJob", "Ada;extra").unwrap();

    let report = runner.run(descriptor, no_signal()).await.unwrap();

    assert_eq!(report.origin, JobOrigin::Plugin(artifact));
    assert!(report.outcome.is_success(), "outcome: {}", report.outcome);
    assert_eq!(report.exit_code, 0);
}

#[tokio::test]
async fn test_demo_plugin_failure_status_through_runner() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());
    place_artifact(
        dir.path(),
        &loader,
        "PluginDemoJob",
        &built_plugin("plugin_demo"),
    );
    let config = RunnerConfig::default()
        .with_deadline(Duration::from_secs(30))
        .with_plugin_dir(dir.path())
        .without_diagnostics();
    let runner = Runner::with_plugins(config, JobRegistry::builder().build());
    let descriptor = JobDescriptor::from_cli("PluginDemoJob", "Ada").unwrap();

    let report = runner.run(descriptor, no_signal()).await.unwrap();

    assert_eq!(
        report.outcome,
        ExecutionOutcome::Failed(JobError::PluginStatus(2))
    );
    assert_eq!(report.exit_code, 1);
}
