use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::error::LookupError;
use crate::job::{JobRegistry, Runnable};

/// Source of jobs that are not compiled into the binary.
pub trait JobLoader: Send + Sync {
    /// Where the artifact for `name` is expected to live.
    fn artifact_path(&self, name: &str) -> PathBuf;

    /// Load the job called `name`. Called at most once per process.
    fn load(&self, name: &str) -> Result<Arc<dyn Runnable>, LookupError>;
}

/// Which path a job name was resolved through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "artifact", rename_all = "snake_case")]
pub enum JobOrigin {
    Registered,
    Plugin(PathBuf),
}

impl std::fmt::Display for JobOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobOrigin::Registered => write!(f, "registered"),
            JobOrigin::Plugin(path) => write!(f, "plugin:{}", path.display()),
        }
    }
}

/// A job name bound to runnable code.
#[derive(Clone)]
pub struct ResolvedJob {
    pub name: String,
    pub origin: JobOrigin,
    pub runnable: Arc<dyn Runnable>,
}

impl std::fmt::Debug for ResolvedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedJob")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Maps a job name to code: registry first, plugin loader only on a miss.
pub struct Resolver<L> {
    registry: JobRegistry,
    loader: L,
}

impl<L: JobLoader> Resolver<L> {
    pub fn new(registry: JobRegistry, loader: L) -> Self {
        Self { registry, loader }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedJob, LookupError> {
        if let Some(runnable) = self.registry.lookup(name) {
            tracing::info!(job_name = %name, "Resolved job from registry");
            return Ok(ResolvedJob {
                name: name.to_string(),
                origin: JobOrigin::Registered,
                runnable,
            });
        }

        let path = self.loader.artifact_path(name);
        tracing::info!(job_name = %name, artifact = %path.display(), "Job not registered, loading plugin");
        let runnable = self.loader.load(name)?;
        Ok(ResolvedJob {
            name: name.to_string(),
            origin: JobOrigin::Plugin(path),
            runnable,
        })
    }
}
