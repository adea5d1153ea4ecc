//! Job model shared by built-in and plugin jobs.
//!
//! - [`JobDescriptor`]: the job name and ordered parameters given on the command line
//! - [`Runnable`]: the one capability every job implementation provides
//! - [`JobRegistry`]: statically linked jobs, frozen after startup
//! - [`Resolver`]: registry first, plugin loader on a miss
//!
//! Built-in jobs and plugin jobs are both handed around as `Arc<dyn Runnable>`,
//! so nothing downstream of resolution needs to know where a job came from.

pub mod descriptor;
pub mod registry;
pub mod resolver;

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::JobError;

pub use descriptor::{split_params, JobDescriptor};
pub use registry::{JobRegistry, JobRegistryBuilder};
pub use resolver::{JobLoader, JobOrigin, ResolvedJob, Resolver};

/// Granularity of [`JobContext::sleep`] cancellation checks.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// What a job produced when it finished successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobOutput {
    pub message: Option<String>,
}

impl JobOutput {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Per-invocation context handed to every job.
///
/// The cancellation token is cancelled once the supervisor has committed to an
/// outcome (deadline, signal, or completion). Jobs may observe it to stop early;
/// nothing forces them to.
#[derive(Debug, Clone)]
pub struct JobContext {
    run_id: Uuid,
    job_name: String,
    cancel: CancellationToken,
}

impl JobContext {
    pub fn new(run_id: Uuid, job_name: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            run_id,
            job_name: job_name.into(),
            cancel,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Block the calling thread for `duration`, returning
    /// [`JobError::Cancelled`] as soon as the context is cancelled.
    ///
    /// A duration too large to represent as an `Instant` sleeps until
    /// cancellation.
    pub fn sleep(&self, duration: Duration) -> Result<(), JobError> {
        let until = Instant::now().checked_add(duration);
        loop {
            if self.is_cancelled() {
                return Err(JobError::Cancelled);
            }
            let pause = match until {
                Some(until) => {
                    let now = Instant::now();
                    if now >= until {
                        return Ok(());
                    }
                    CANCEL_POLL.min(until - now)
                }
                None => CANCEL_POLL,
            };
            std::thread::sleep(pause);
        }
    }
}

/// A unit of work that can be run by name with an ordered list of parameters.
///
/// Implementations run on a dedicated thread and may block. Parameter
/// validation belongs to the implementation: return
/// [`JobError::InvalidArguments`] instead of running with partial input.
pub trait Runnable: Send + Sync {
    fn run(&self, ctx: &JobContext, name: &str, params: &[String]) -> Result<JobOutput, JobError>;
}

impl<F> Runnable for F
where
    F: Fn(&JobContext, &str, &[String]) -> Result<JobOutput, JobError> + Send + Sync,
{
    fn run(&self, ctx: &JobContext, name: &str, params: &[String]) -> Result<JobOutput, JobError> {
        self(ctx, name, params)
    }
}
