use std::future::Future;

use serde::Serialize;
use tokio::signal::unix::{signal, SignalKind};

/// Process-termination requests the supervisor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminationSignal {
    Hangup,
    Interrupt,
    Quit,
    Terminate,
}

impl TerminationSignal {
    /// POSIX signal number.
    pub fn number(&self) -> i32 {
        match self {
            TerminationSignal::Hangup => 1,
            TerminationSignal::Interrupt => 2,
            TerminationSignal::Quit => 3,
            TerminationSignal::Terminate => 15,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TerminationSignal::Hangup => "SIGHUP",
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Quit => "SIGQUIT",
            TerminationSignal::Terminate => "SIGTERM",
        }
    }
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Install handlers for SIGINT, SIGTERM, SIGHUP and SIGQUIT.
///
/// Handlers are registered before this returns, so a signal sent after the
/// call is never lost. The returned future resolves with the first signal
/// received. Must be called from within a Tokio runtime.
pub fn install_signal_listener(
) -> std::io::Result<impl Future<Output = TerminationSignal> + Send + 'static> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigquit = signal(SignalKind::quit())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => TerminationSignal::Interrupt,
            _ = sigterm.recv() => TerminationSignal::Terminate,
            _ = sighup.recv() => TerminationSignal::Hangup,
            _ = sigquit.recv() => TerminationSignal::Quit,
        }
    })
}
