use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the diagnostics side listener.
///
/// The listener is independent of the job: when it cannot bind, the failure is
/// logged and the job still runs.
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    /// Start the listener at all.
    pub enabled: bool,
    /// Bind address.
    pub host: String,
    /// Bind port. `None` lets the OS pick a free port.
    pub port: Option<u16>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: None,
        }
    }
}

impl DiagnosticsConfig {
    /// Address string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(0))
    }
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Wall-clock budget for the whole invocation.
    pub deadline: Duration,
    /// How often the supervisor logs that the job is still running.
    pub liveness_interval: Duration,
    /// Directory searched for `<job_name>` plugin artifacts.
    pub plugin_dir: PathBuf,
    pub diagnostics: DiagnosticsConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(60),
            liveness_interval: Duration::from_secs(5),
            plugin_dir: PathBuf::from("."),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Zero disables the "still running" log.
    pub fn with_liveness_interval(mut self, interval: Duration) -> Self {
        self.liveness_interval = interval;
        self
    }

    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dir = dir.into();
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: DiagnosticsConfig) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn without_diagnostics(mut self) -> Self {
        self.diagnostics.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_config_default() {
        let cfg = DiagnosticsConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.host, "0.0.0.0");
        assert!(cfg.port.is_none());
    }

    #[test]
    fn diagnostics_bind_addr_uses_port_zero_when_unset() {
        let cfg = DiagnosticsConfig::default();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:0");

        let cfg = DiagnosticsConfig {
            host: "127.0.0.1".to_string(),
            port: Some(6060),
            ..DiagnosticsConfig::default()
        };
        assert_eq!(cfg.bind_addr(), "127.0.0.1:6060");
    }

    #[test]
    fn runner_config_default() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.deadline, Duration::from_secs(60));
        assert_eq!(cfg.liveness_interval, Duration::from_secs(5));
        assert_eq!(cfg.plugin_dir, PathBuf::from("."));
        assert!(cfg.diagnostics.enabled);
    }

    #[test]
    fn runner_config_builders() {
        let cfg = RunnerConfig::default()
            .with_deadline(Duration::from_millis(250))
            .with_liveness_interval(Duration::from_millis(50))
            .with_plugin_dir("/opt/jobs")
            .without_diagnostics();
        assert_eq!(cfg.deadline, Duration::from_millis(250));
        assert_eq!(cfg.liveness_interval, Duration::from_millis(50));
        assert_eq!(cfg.plugin_dir, PathBuf::from("/opt/jobs"));
        assert!(!cfg.diagnostics.enabled);
    }
}
