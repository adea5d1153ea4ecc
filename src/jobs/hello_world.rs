use std::time::Duration;

use crate::error::JobError;
use crate::job::{JobContext, JobOutput, Runnable};

/// Greets the first parameter after a simulated stretch of work.
///
/// Expects at least two parameters: `<name>;<anything>`.
#[derive(Debug, Clone)]
pub struct HelloWorldJob {
    delay: Duration,
}

impl HelloWorldJob {
    pub const NAME: &'static str = "HelloWorldJob";

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for HelloWorldJob {
    fn default() -> Self {
        Self::with_delay(Duration::from_secs(6))
    }
}

impl Runnable for HelloWorldJob {
    fn run(&self, ctx: &JobContext, name: &str, params: &[String]) -> Result<JobOutput, JobError> {
        if params.len() < 2 {
            return Err(JobError::InvalidArguments(format!(
                "{} expects at least 2 parameters, got {}",
                name,
                params.len()
            )));
        }

        ctx.sleep(self.delay)?;

        let greeting = format!("hello {}", params[0]);
        tracing::info!(job_name = %name, run_id = %ctx.run_id(), "{}", greeting);
        tracing::info!(job_name = %name, "Job finished");
        Ok(JobOutput::message(greeting))
    }
}
