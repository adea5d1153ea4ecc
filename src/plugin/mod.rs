//! Jobs loaded at runtime from shared-library artifacts.
//!
//! A plugin is a `cdylib` named after the job (`<job_name>.so` on Linux) that
//! exports two symbols, both generated by [`export_job!`](crate::export_job):
//!
//! - `RUN_ABI_VERSION`: a `u32` that must equal [`abi::ABI_VERSION`]
//! - `Run`: an `extern "C"` function with the [`abi::RunFn`] signature
//!
//! The version check is what makes a signature mismatch a typed
//! [`LookupError::EntryPointMismatch`](crate::error::LookupError) rather than
//! undefined behaviour.

pub mod abi;
pub mod loader;

use std::ffi::CString;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};

use crate::error::JobError;
use crate::job::{JobContext, JobOutput, Runnable};

pub use abi::{RunFn, ABI_VERSION};
pub use loader::PluginLoader;

/// A job backed by the `Run` entry point of a loaded plugin.
#[derive(Debug, Clone)]
pub struct PluginJob {
    artifact: PathBuf,
    entry: RunFn,
}

impl PluginJob {
    /// Wrap an already-resolved entry point.
    ///
    /// `entry` must stay callable for the life of the process; the loader
    /// guarantees this by never unloading libraries.
    pub fn from_entry(artifact: impl Into<PathBuf>, entry: RunFn) -> Self {
        Self {
            artifact: artifact.into(),
            entry,
        }
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }
}

fn to_c_string(value: &str) -> Result<CString, JobError> {
    CString::new(value).map_err(|_| {
        JobError::InvalidArguments(format!("parameter contains a NUL byte: {:?}", value))
    })
}

impl Runnable for PluginJob {
    fn run(&self, _ctx: &JobContext, name: &str, params: &[String]) -> Result<JobOutput, JobError> {
        let c_name = to_c_string(name)?;
        let c_params = params
            .iter()
            .map(|p| to_c_string(p))
            .collect::<Result<Vec<_>, _>>()?;
        let argv: Vec<*const c_char> = c_params.iter().map(|p| p.as_ptr()).collect();

        // SAFETY: the ABI version was checked at load time, the library is
        // never unloaded, and every pointer outlives the call.
        let status = unsafe { (self.entry)(c_name.as_ptr(), argv.as_ptr(), argv.len()) };

        if status == 0 {
            Ok(JobOutput::empty())
        } else {
            Err(JobError::PluginStatus(status))
        }
    }
}
