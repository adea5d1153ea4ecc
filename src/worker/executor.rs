use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::RunnerConfig;
use crate::error::JobError;
use crate::job::{JobContext, JobDescriptor, JobOutput, ResolvedJob};
use crate::shutdown::TerminationSignal;
use crate::worker::heartbeat::LivenessLogger;
use crate::worker::Invoker;

/// Exit code used when the deadline elapses, matching coreutils `timeout`.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// How one supervised invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed(JobOutput),
    Failed(JobError),
    TimedOut { deadline: Duration },
    Interrupted(TerminationSignal),
}

impl ExecutionOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionOutcome::Completed(_) => "completed",
            ExecutionOutcome::Failed(_) => "failed",
            ExecutionOutcome::TimedOut { .. } => "timed_out",
            ExecutionOutcome::Interrupted(_) => "interrupted",
        }
    }

    /// Human-readable detail: job output, error, deadline, or signal.
    pub fn detail(&self) -> Option<String> {
        match self {
            ExecutionOutcome::Completed(output) => output.message.clone(),
            ExecutionOutcome::Failed(error) => Some(error.to_string()),
            ExecutionOutcome::TimedOut { deadline } => {
                Some(format!("deadline of {:?} exceeded", deadline))
            }
            ExecutionOutcome::Interrupted(signal) => Some(signal.to_string()),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutionOutcome::Completed(_) => 0,
            ExecutionOutcome::Failed(_) => 1,
            ExecutionOutcome::TimedOut { .. } => TIMEOUT_EXIT_CODE,
            ExecutionOutcome::Interrupted(signal) => 128 + signal.number(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed(_))
    }
}

impl std::fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.kind(), detail),
            None => f.write_str(self.kind()),
        }
    }
}

/// Lifecycle of the supervisor. The last three states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Running,
    Completed,
    TimedOut,
    Interrupted,
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SupervisorState::Completed | SupervisorState::TimedOut | SupervisorState::Interrupted
        )
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SupervisorState::Idle => write!(f, "idle"),
            SupervisorState::Running => write!(f, "running"),
            SupervisorState::Completed => write!(f, "completed"),
            SupervisorState::TimedOut => write!(f, "timed_out"),
            SupervisorState::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Messages racing into the outcome channel.
#[derive(Debug)]
enum Terminal {
    Finished(ExecutionOutcome),
    DeadlineElapsed,
    Signal(TerminationSignal),
}

/// Runs one job to an outcome under a deadline and termination signals.
///
/// `supervise` consumes the executor, so one executor drives at most one job.
pub struct SupervisedExecutor {
    deadline: Duration,
    liveness_interval: Duration,
    state: watch::Sender<SupervisorState>,
}

impl SupervisedExecutor {
    pub fn new(deadline: Duration, liveness_interval: Duration) -> Self {
        let (state, _) = watch::channel(SupervisorState::Idle);
        Self {
            deadline,
            liveness_interval,
            state,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(config.deadline, config.liveness_interval)
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Watch state transitions. The receiver keeps the final state after the
    /// executor is consumed.
    pub fn subscribe(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Move to `next` unless a terminal state has already been reached.
    fn transition(&self, next: SupervisorState) -> bool {
        self.state.send_if_modified(|current| {
            if current.is_terminal() || *current == next {
                return false;
            }
            tracing::debug!(from = %current, to = %next, "Supervisor transition");
            *current = next;
            true
        })
    }

    /// Run `job` and return the first of: its result, the deadline elapsing,
    /// or `signal` resolving.
    ///
    /// The invocation runs on its own thread and is never awaited once an
    /// outcome is chosen. `ctx` is cancelled as soon as the outcome is
    /// committed.
    pub async fn supervise<S>(
        self,
        job: ResolvedJob,
        descriptor: JobDescriptor,
        ctx: JobContext,
        signal: S,
    ) -> ExecutionOutcome
    where
        S: Future<Output = TerminationSignal> + Send + 'static,
    {
        let job_name = descriptor.name().to_string();
        self.transition(SupervisorState::Running);
        tracing::info!(
            job_name = %job_name,
            run_id = %ctx.run_id(),
            pid = std::process::id(),
            deadline = ?self.deadline,
            "Job running"
        );

        // Capacity covers one message from each path, so no sender blocks.
        let (tx, mut rx) = mpsc::channel::<Terminal>(3);

        let job_tx = tx.clone();
        let job_ctx = ctx.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("job-{}", job_name))
            .spawn(move || {
                let outcome = Invoker::invoke(&job, &descriptor, &job_ctx);
                let _ = job_tx.blocking_send(Terminal::Finished(outcome));
            });
        if let Err(e) = spawned {
            tracing::error!(job_name = %job_name, error = %e, "Failed to spawn job thread");
            let outcome = ExecutionOutcome::Failed(JobError::Failed(format!(
                "failed to spawn job thread: {}",
                e
            )));
            self.transition(SupervisorState::Completed);
            ctx.cancellation_token().cancel();
            return outcome;
        }

        let deadline = self.deadline;
        let deadline_tx = tx.clone();
        let deadline_task = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            let _ = deadline_tx.send(Terminal::DeadlineElapsed).await;
        });

        let signal_tx = tx;
        let signal_task = tokio::spawn(async move {
            let received = signal.await;
            let _ = signal_tx.send(Terminal::Signal(received)).await;
        });

        let stop_liveness = CancellationToken::new();
        let liveness = LivenessLogger::new(self.liveness_interval);
        let liveness_name = job_name.clone();
        let liveness_stop = stop_liveness.clone();
        let liveness_task = tokio::spawn(async move {
            liveness.run(&liveness_name, liveness_stop).await;
        });

        // First arrival wins; the channel is closed so later arrivals are dropped.
        let first = rx.recv().await;
        rx.close();

        let outcome = match first {
            Some(Terminal::Finished(outcome)) => {
                self.transition(SupervisorState::Completed);
                outcome
            }
            Some(Terminal::DeadlineElapsed) => {
                tracing::warn!(
                    job_name = %job_name,
                    deadline = ?deadline,
                    "Job exceeded its deadline, exiting without waiting for it"
                );
                self.transition(SupervisorState::TimedOut);
                ExecutionOutcome::TimedOut { deadline }
            }
            Some(Terminal::Signal(received)) => {
                tracing::warn!(job_name = %job_name, signal = %received, "Received termination signal");
                self.transition(SupervisorState::Interrupted);
                ExecutionOutcome::Interrupted(received)
            }
            None => {
                self.transition(SupervisorState::Completed);
                ExecutionOutcome::Failed(JobError::Failed(
                    "supervision channel closed without an outcome".to_string(),
                ))
            }
        };

        ctx.cancellation_token().cancel();
        stop_liveness.cancel();
        deadline_task.abort();
        signal_task.abort();
        if let Err(e) = liveness_task.await {
            tracing::warn!(job_name = %job_name, error = %e, "Liveness task ended abnormally");
        }

        tracing::info!(
            job_name = %job_name,
            state = %self.state(),
            outcome = %outcome,
            "Supervisor committed to exit"
        );
        outcome
    }
}
