use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Periodically logs that a job is still running until stopped.
pub struct LivenessLogger {
    interval: Duration,
}

impl LivenessLogger {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Log once per interval until `stop` is cancelled. Returns the number of
    /// log lines written. A zero interval disables logging.
    pub async fn run(&self, job_name: &str, stop: CancellationToken) -> u64 {
        if self.interval.is_zero() {
            tracing::debug!(job_name, "Liveness logging disabled");
            stop.cancelled().await;
            return 0;
        }

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let pid = std::process::id();
        let mut beats = 0;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = interval.tick() => {
                    tracing::info!(job_name, pid, "Job still running");
                    beats += 1;
                }
            }
        }
        beats
    }
}
