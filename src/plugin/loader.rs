use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};

use crate::error::LookupError;
use crate::job::{JobLoader, Runnable};
use crate::plugin::abi::{RunFn, ABI_VERSION, ABI_VERSION_SYMBOL, RUN_SYMBOL};
use crate::plugin::PluginJob;

/// Loads `<dir>/<job_name>.<dll extension>` and binds its `Run` entry point.
///
/// Libraries are leaked once loaded: a plugin job may still be running on its
/// own thread when the process commits to exiting, so its code must never be
/// unmapped.
#[derive(Debug, Clone)]
pub struct PluginLoader {
    dir: PathBuf,
}

impl PluginLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open(path: &Path) -> Result<&'static Library, LookupError> {
        // SAFETY: loading runs the library's initialisers; plugins are trusted
        // code placed next to the binary by the operator.
        let library = unsafe { Library::new(path) }.map_err(|e| LookupError::ArtifactNotFound {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Box::leak(Box::new(library)))
    }

    fn entry_point(library: &'static Library, path: &Path) -> Result<RunFn, LookupError> {
        let mismatch = |reason: String| LookupError::EntryPointMismatch {
            path: path.to_path_buf(),
            reason,
        };

        // SAFETY: the symbol is only read as a u32 after it has been found.
        let version = unsafe {
            let symbol: Symbol<*const u32> = library
                .get(ABI_VERSION_SYMBOL)
                .map_err(|e| mismatch(format!("missing RUN_ABI_VERSION: {}", e)))?;
            **symbol
        };
        if version != ABI_VERSION {
            return Err(mismatch(format!(
                "RUN_ABI_VERSION is {}, expected {}",
                version, ABI_VERSION
            )));
        }

        // SAFETY: a matching ABI version guarantees `Run` has the RunFn signature.
        let run = unsafe {
            let symbol: Symbol<RunFn> = library
                .get(RUN_SYMBOL)
                .map_err(|e| mismatch(format!("missing Run: {}", e)))?;
            *symbol
        };
        Ok(run)
    }
}

impl Default for PluginLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl JobLoader for PluginLoader {
    fn artifact_path(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", name, std::env::consts::DLL_EXTENSION))
    }

    fn load(&self, name: &str) -> Result<Arc<dyn Runnable>, LookupError> {
        let path = self.artifact_path(name);
        let library = Self::open(&path).inspect_err(|e| {
            tracing::error!(job_name = %name, error = %e, "Failed to open plugin");
        })?;
        let entry = Self::entry_point(library, &path).inspect_err(|e| {
            tracing::error!(job_name = %name, error = %e, "Plugin entry point mismatch");
        })?;
        tracing::info!(job_name = %name, artifact = %path.display(), "Loaded plugin");
        Ok(Arc::new(PluginJob::from_entry(path, entry)))
    }
}
