use std::path::PathBuf;

use thiserror::Error;

/// Raised while the job registry is still open for registration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Job name must not be empty")]
    EmptyName,

    #[error("Job already registered: {0}")]
    Duplicate(String),
}

/// A job name that could not be turned into runnable code.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Job artifact not found at {}: {reason}", path.display())]
    ArtifactNotFound { path: PathBuf, reason: String },

    #[error("Job artifact {} has no usable Run entry point: {reason}", path.display())]
    EntryPointMismatch { path: PathBuf, reason: String },
}

impl LookupError {
    pub fn path(&self) -> &PathBuf {
        match self {
            LookupError::ArtifactNotFound { path, .. } => path,
            LookupError::EntryPointMismatch { path, .. } => path,
        }
    }
}

/// Failure reported by a job implementation while it runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("Invalid job arguments: {0}")]
    InvalidArguments(String),

    #[error("Job failed: {0}")]
    Failed(String),

    #[error("Job panicked: {0}")]
    Panicked(String),

    #[error("Plugin Run returned status {0}")]
    PluginStatus(i32),

    #[error("Job cancelled")]
    Cancelled,
}

/// Errors that stop the runner before or outside supervised execution.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Job name must not be empty")]
    EmptyJobName,

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

impl RunnerError {
    /// Process exit code for a runner that never reached `Running`.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::EmptyJobName | RunnerError::Lookup(_) => 2,
            RunnerError::Signal(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;
