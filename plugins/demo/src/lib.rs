//! Demo job built as a loadable plugin.
//!
//! Build it and place the artifact next to the runner under the job name:
//!
//! ```text
//! cargo build -p plugin-demo --release
//! cp target/release/libplugin_demo.so ./PluginDemoJob.so
//! jobrunner --job_name PluginDemoJob --job_params 'Ada;extra'
//! ```

use std::time::Duration;

use jobrunner::error::JobError;
use jobrunner::job::{JobContext, JobOutput, Runnable};

#[derive(Default)]
pub struct PluginDemoJob;

impl Runnable for PluginDemoJob {
    fn run(&self, ctx: &JobContext, name: &str, params: &[String]) -> Result<JobOutput, JobError> {
        if params.len() < 2 {
            return Err(JobError::InvalidArguments(format!(
                "{} expects at least 2 parameters, got {}",
                name,
                params.len()
            )));
        }

        ctx.sleep(Duration::from_secs(6))?;

        tracing::info!(job_name = %name, "This is a plugin job demo {}", params[0]);
        tracing::info!(job_name = %name, "Job finished");
        Ok(JobOutput::message(format!("plugin demo greeted {}", params[0])))
    }
}

jobrunner::export_job!(PluginDemoJob);
