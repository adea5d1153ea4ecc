//! Jobs compiled into the binary.

pub mod demo;
pub mod hello_world;

use crate::error::RegistryError;
use crate::job::JobRegistry;

pub use demo::DemoJob;
pub use hello_world::HelloWorldJob;

/// Build the process registry with every built-in job.
pub fn builtin_registry() -> Result<JobRegistry, RegistryError> {
    Ok(JobRegistry::builder()
        .register(HelloWorldJob::NAME, HelloWorldJob::default())?
        .register(DemoJob::NAME, DemoJob::default())?
        .build())
}
