use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::diagnostics::run_diagnostics;
use crate::error::{LookupError, RunnerError};
use crate::job::{JobContext, JobDescriptor, JobLoader, JobOrigin, JobRegistry, ResolvedJob, Resolver};
use crate::plugin::PluginLoader;
use crate::shutdown::TerminationSignal;
use crate::worker::{ExecutionOutcome, SupervisedExecutor};

/// Summary of one process run, logged as JSON on exit.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub run_id: Uuid,
    pub job_name: String,
    pub params: Vec<String>,
    pub origin: JobOrigin,
    pub status: &'static str,
    pub detail: Option<String>,
    pub exit_code: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(skip)]
    pub outcome: ExecutionOutcome,
}

impl ExecutionReport {
    fn new(
        run_id: Uuid,
        descriptor: &JobDescriptor,
        origin: JobOrigin,
        outcome: ExecutionOutcome,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            job_name: descriptor.name().to_string(),
            params: descriptor.params().to_vec(),
            origin,
            status: outcome.kind(),
            detail: outcome.detail(),
            exit_code: outcome.exit_code(),
            started_at,
            finished_at: Utc::now(),
            outcome,
        }
    }
}

/// Resolves and supervises exactly one job per process.
///
/// Starts the diagnostics listener (when enabled) alongside the job; the
/// listener never affects the outcome.
pub struct Runner<L = PluginLoader> {
    config: RunnerConfig,
    resolver: Resolver<L>,
}

impl Runner<PluginLoader> {
    /// Runner that falls back to plugins in `config.plugin_dir`.
    pub fn with_plugins(config: RunnerConfig, registry: JobRegistry) -> Self {
        let loader = PluginLoader::new(config.plugin_dir.clone());
        Self::new(config, registry, loader)
    }
}

impl<L: JobLoader> Runner<L> {
    pub fn new(config: RunnerConfig, registry: JobRegistry, loader: L) -> Self {
        Self {
            config,
            resolver: Resolver::new(registry, loader),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Resolver<L> {
        &self.resolver
    }

    pub fn resolve(&self, descriptor: &JobDescriptor) -> Result<ResolvedJob, LookupError> {
        self.resolver.resolve(descriptor.name())
    }

    /// Resolve `descriptor` and supervise it to an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Lookup`] when the job cannot be resolved; the job
    /// never starts in that case.
    pub async fn run<S>(
        &self,
        descriptor: JobDescriptor,
        signal: S,
    ) -> Result<ExecutionReport, RunnerError>
    where
        S: Future<Output = TerminationSignal> + Send + 'static,
    {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(
            run_id = %run_id,
            pid = std::process::id(),
            job_name = %descriptor.name(),
            "Starting job runner"
        );

        if self.config.diagnostics.enabled {
            tokio::spawn(run_diagnostics(self.config.diagnostics.clone()));
        }

        let job = self.resolve(&descriptor).inspect_err(|e| {
            tracing::error!(job_name = %descriptor.name(), error = %e, "Job could not be resolved");
        })?;
        let origin = job.origin.clone();

        let executor = SupervisedExecutor::from_config(&self.config);
        let ctx = JobContext::new(run_id, descriptor.name(), CancellationToken::new());
        let outcome = executor
            .supervise(job, descriptor.clone(), ctx, signal)
            .await;

        Ok(ExecutionReport::new(
            run_id, &descriptor, origin, outcome, started_at,
        ))
    }
}
