//! Supervised execution of a single resolved job.
//!
//! - [`Invoker`]: calls a [`Runnable`](crate::job::Runnable) and turns its
//!   result (or panic) into an [`ExecutionOutcome`]
//! - [`SupervisedExecutor`]: runs the invocation on its own thread and races it
//!   against the deadline and termination signals
//! - [`heartbeat`]: the "still running" liveness log
//!
//! # Execution Flow
//!
//! 1. The executor moves from `Idle` to `Running` and spawns the job thread
//! 2. The deadline timer, signal listener and liveness logger are armed
//! 3. Every terminal path sends into one channel; the first message wins
//! 4. The job's cancellation token is cancelled and helper tasks are aborted
//!
//! The job thread is never joined. A job that ignores cancellation keeps
//! running until the process exits.

pub mod executor;
pub mod heartbeat;
pub mod invoker;

pub use executor::{ExecutionOutcome, SupervisedExecutor, SupervisorState};
pub use invoker::Invoker;
