use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobrunner::config::{DiagnosticsConfig, RunnerConfig};
use jobrunner::job::JobDescriptor;
use jobrunner::jobs::builtin_registry;
use jobrunner::runner::Runner;
use jobrunner::shutdown::install_signal_listener;

#[derive(Parser, Debug)]
#[command(name = "jobrunner")]
#[command(version)]
#[command(about = "Run one named job under a deadline, from the built-in registry or a plugin")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Job to run: a built-in job name, or `<name>` of a `<name>.so` plugin
    #[arg(long = "job_name", default_value = "HelloWorldJob")]
    job_name: String,

    /// Job parameters, separated by `;`
    #[arg(long = "job_params", default_value = "")]
    job_params: String,

    /// Bind address for the diagnostics listener
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port for the diagnostics listener (default: any free port)
    #[arg(long)]
    port: Option<u16>,

    /// Wall-clock deadline for the job, in seconds
    #[arg(long = "timeout_secs", default_value = "60")]
    timeout_secs: u64,

    /// Interval between "still running" log lines, in seconds (0 disables them)
    #[arg(long = "liveness_secs", default_value = "5")]
    liveness_secs: u64,

    /// Directory searched for plugin artifacts
    #[arg(long = "plugin_dir", default_value = ".")]
    plugin_dir: PathBuf,

    /// Do not start the diagnostics listener
    #[arg(long = "no_diagnostics")]
    no_diagnostics: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the version number
    Version,
    /// List built-in jobs
    Jobs,
}

impl Args {
    fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::default()
            .with_deadline(Duration::from_secs(self.timeout_secs))
            .with_liveness_interval(Duration::from_secs(self.liveness_secs))
            .with_plugin_dir(self.plugin_dir.clone())
            .with_diagnostics(DiagnosticsConfig {
                enabled: !self.no_diagnostics,
                host: self.host.clone(),
                port: self.port,
            })
    }
}

async fn run_job(args: Args) -> i32 {
    let registry = match builtin_registry() {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build job registry");
            return 1;
        }
    };

    let descriptor = match JobDescriptor::from_cli(&args.job_name, &args.job_params) {
        Ok(descriptor) => descriptor,
        Err(e) => {
            tracing::error!(error = %e, "Invalid job arguments");
            return e.exit_code();
        }
    };

    let signal = match install_signal_listener() {
        Ok(signal) => signal,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            return 1;
        }
    };

    let runner = Runner::with_plugins(args.runner_config(), registry);
    match runner.run(descriptor, signal).await {
        Ok(report) => {
            match serde_json::to_string(&report) {
                Ok(json) => tracing::info!(report = %json, "Job runner exiting"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize execution report"),
            }
            report.exit_code
        }
        Err(e) => {
            tracing::error!(error = %e, "Job runner aborted before the job started");
            e.exit_code()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let code = match args.command {
        Some(Commands::Version) => {
            println!("jobrunner version: v{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Some(Commands::Jobs) => match builtin_registry() {
            Ok(registry) => {
                for name in registry.names() {
                    println!("{}", name);
                }
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        None => run_job(args).await,
    };

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
