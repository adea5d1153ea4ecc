use std::time::{Duration, Instant};

use crate::error::JobError;
use crate::job::{JobContext, JobOutput, Runnable};

const DEFAULT_NAME: &str = "jobrunner";
const DEFAULT_GREETING: &str = "welcome!~";

/// Repeats a greeting once per interval for a fixed duration.
///
/// Parameters are optional: `[<name>[;<greeting>]]`. Empty values fall back
/// to the defaults.
#[derive(Debug, Clone)]
pub struct DemoJob {
    duration: Duration,
    interval: Duration,
}

impl DemoJob {
    pub const NAME: &'static str = "DemoJob";

    pub fn with_timing(duration: Duration, interval: Duration) -> Self {
        Self { duration, interval }
    }
}

impl Default for DemoJob {
    fn default() -> Self {
        Self::with_timing(Duration::from_secs(5), Duration::from_secs(1))
    }
}

fn param_or<'a>(params: &'a [String], index: usize, default: &'a str) -> &'a str {
    match params.get(index) {
        Some(value) if !value.is_empty() => value.as_str(),
        _ => default,
    }
}

impl Runnable for DemoJob {
    fn run(&self, ctx: &JobContext, name: &str, params: &[String]) -> Result<JobOutput, JobError> {
        let who = param_or(params, 0, DEFAULT_NAME);
        let greeting = param_or(params, 1, DEFAULT_GREETING);

        let started = Instant::now();
        let mut count = 0u32;
        while started.elapsed() < self.duration {
            tracing::info!(job_name = %name, "{} {}", greeting, who);
            count += 1;
            ctx.sleep(self.interval.min(self.duration.saturating_sub(started.elapsed())))?;
        }

        Ok(JobOutput::message(format!("greeted {} {} times", who, count)))
    }
}
