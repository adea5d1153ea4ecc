
use std::path::PathBuf;
use std::time::Duration;

use jobrunner::error::{LookupError, RegistryError};
use jobrunner::job::{JobLoader, JobOrigin, JobRegistry, Resolver};
use jobrunner::jobs::{builtin_registry, HelloWorldJob};
use jobrunner::plugin::PluginLoader;
use test_harness::{CountingLoader, EchoJob};

fn registry_with_echo() -> JobRegistry {
    JobRegistry::builder()
        .register("EchoJob", EchoJob)
        .unwrap()
        .build()
}

#[test]
fn test_registered_name_never_loads_plugin() {
    let loader = CountingLoader::succeeding();
    let calls = loader.calls.clone();
    let resolver = Resolver::new(registry_with_echo(), loader);

    for _ in 0..3 {
        let job = resolver.resolve("EchoJob").unwrap();
        assert_eq!(job.origin, JobOrigin::Registered);
        assert_eq!(job.name, "EchoJob");
    }

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn test_missing_name_loads_plugin_once() {
    let resolver = Resolver::new(registry_with_echo(), CountingLoader::succeeding());

    let job = resolver.resolve("NightlyReport").unwrap();

    assert_eq!(
        job.origin,
        JobOrigin::Plugin(PathBuf::from("/nonexistent/plugins/NightlyReport.so"))
    );
    assert_eq!(resolver.loader().call_count(), 1);
    assert_eq!(
        *resolver.loader().requested.lock().unwrap(),
        vec!["NightlyReport".to_string()]
    );
}

#[test]
fn test_lookup_is_case_sensitive() {
    let resolver = Resolver::new(registry_with_echo(), CountingLoader::failing());

    let err = resolver.resolve("echojob").unwrap_err();

    assert!(matches!(err, LookupError::ArtifactNotFound { .. }));
    assert_eq!(resolver.loader().call_count(), 1);
}

#[test]
fn test_loader_failure_is_returned_unchanged() {
    let resolver = Resolver::new(registry_with_echo(), CountingLoader::failing());

    let err = resolver.resolve("Unknown").unwrap_err();

    assert_eq!(
        err.path(),
        &PathBuf::from("/nonexistent/plugins/Unknown.so")
    );
}

#[test]
fn test_unknown_job_without_artifact_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let loader = PluginLoader::new(dir.path());
    let expected = loader.artifact_path("Unknown");
    let resolver = Resolver::new(builtin_registry().unwrap(), loader);

    let err = resolver.resolve("Unknown").unwrap_err();

    match err {
        LookupError::ArtifactNotFound { path, .. } => assert_eq!(path, expected),
        other => panic!("expected ArtifactNotFound, got {:?}", other),
    }
}

#[test]
fn test_registry_rejects_duplicates() {
    let result = JobRegistry::builder()
        .register("EchoJob", EchoJob)
        .unwrap()
        .register("EchoJob", EchoJob);

    assert_eq!(
        result.err(),
        Some(RegistryError::Duplicate("EchoJob".to_string()))
    );
}

#[test]
fn test_registry_rejects_empty_name() {
    let result = JobRegistry::builder().register("", EchoJob);
    assert_eq!(result.err(), Some(RegistryError::EmptyName));
}

#[test]
fn test_registry_lists_sorted_names() {
    let registry = JobRegistry::builder()
        .register("Zeta", EchoJob)
        .unwrap()
        .register("Alpha", HelloWorldJob::with_delay(Duration::ZERO))
        .unwrap()
        .build();

    assert_eq!(registry.names(), vec!["Alpha", "Zeta"]);
    assert_eq!(registry.len(), 2);
    assert!(registry.contains("Zeta"));
    assert!(!registry.contains("zeta"));
}

#[test]
fn test_empty_registry() {
    let registry = JobRegistry::default();
    assert!(registry.is_empty());
    assert!(registry.lookup("HelloWorldJob").is_none());
}
