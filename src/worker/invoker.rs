use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::JobError;
use crate::job::{JobContext, JobDescriptor, ResolvedJob};
use crate::worker::ExecutionOutcome;

/// Calls a resolved job with its name and parameters.
///
/// Registered and plugin jobs go through the same call; only `Completed` or
/// `Failed` come out of here. Nothing is retried.
#[derive(Debug, Default, Clone, Copy)]
pub struct Invoker;

impl Invoker {
    pub fn invoke(
        job: &ResolvedJob,
        descriptor: &JobDescriptor,
        ctx: &JobContext,
    ) -> ExecutionOutcome {
        tracing::info!(
            job_name = %descriptor.name(),
            run_id = %ctx.run_id(),
            origin = %job.origin,
            params = ?descriptor.params(),
            "Invoking job"
        );

        let result = catch_unwind(AssertUnwindSafe(|| {
            job.runnable.run(ctx, descriptor.name(), descriptor.params())
        }))
        .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(output) => {
                tracing::info!(
                    job_name = %descriptor.name(),
                    params = ?descriptor.params(),
                    output = ?output.message,
                    "Job execution finished"
                );
                ExecutionOutcome::Completed(output)
            }
            Err(error) => {
                tracing::error!(
                    job_name = %descriptor.name(),
                    params = ?descriptor.params(),
                    origin = %job.origin,
                    error = %error,
                    "Job execution failed"
                );
                ExecutionOutcome::Failed(error)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
