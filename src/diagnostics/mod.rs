//! Side HTTP listener for operators: liveness, pid and CPU profiling.
//!
//! Runs as its own task and never touches the supervisor. Bind or serve
//! failures are logged and otherwise ignored.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use pprof::protos::Message;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::config::DiagnosticsConfig;

/// Profiling resources listed by the index.
const PROFILES: &[(&str, &str)] = &[
    ("cmdline", "The command line invocation of the current program"),
    (
        "profile",
        "CPU profile in pprof format. Set the duration with the `seconds` query parameter",
    ),
];

const DEFAULT_PROFILE_SECONDS: u64 = 30;

/// Samples per second while a CPU profile is being taken.
const PROFILE_FREQUENCY: i32 = 100;

#[derive(Clone)]
pub struct DiagnosticsState {
    pub pid: u32,
    pub cmdline: Arc<Vec<String>>,
}

impl DiagnosticsState {
    pub fn current() -> Self {
        Self {
            pid: std::process::id(),
            cmdline: Arc::new(std::env::args().collect()),
        }
    }
}

#[derive(Serialize)]
struct PidData {
    pid: u32,
}

#[derive(Serialize)]
struct PidResponse {
    code: i32,
    msg: &'static str,
    data: PidData,
}

#[derive(Serialize)]
struct CheckResponse {
    active: bool,
}

#[derive(Deserialize)]
struct ProfileParams {
    seconds: Option<u64>,
}

pub fn router(state: DiagnosticsState) -> Router {
    Router::new()
        .route("/pid", get(pid_handler))
        .route("/check", get(check_handler))
        .route("/debug/pprof/", get(pprof_index_handler))
        .route("/debug/pprof/cmdline", get(cmdline_handler))
        .route("/debug/pprof/profile", get(profile_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener described by `config`. Port `None` binds an OS-chosen
/// free port.
pub async fn bind(config: &DiagnosticsConfig) -> std::io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

pub async fn run_diagnostics(config: DiagnosticsConfig) {
    let (listener, addr) = match bind(&config).await {
        Ok(bound) => bound,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr(), error = %e, "Failed to bind diagnostics server");
            return;
        }
    };

    tracing::info!(addr = %addr, "Diagnostics server listening");

    if let Err(e) = axum::serve(listener, router(DiagnosticsState::current())).await {
        tracing::error!(error = %e, "Diagnostics server failed");
    }
}

async fn pid_handler(State(state): State<DiagnosticsState>) -> Json<PidResponse> {
    Json(PidResponse {
        code: 0,
        msg: "success",
        data: PidData { pid: state.pid },
    })
}

async fn check_handler() -> Json<CheckResponse> {
    Json(CheckResponse { active: true })
}

async fn pprof_index_handler() -> String {
    let mut index = String::from("Profiles:\n");
    for (name, description) in PROFILES {
        index.push_str(&format!("  /debug/pprof/{}: {}\n", name, description));
    }
    index.push_str("Other endpoints:\n  /pid: process id\n  /check: liveness\n");
    index
}

async fn cmdline_handler(State(state): State<DiagnosticsState>) -> String {
    state.cmdline.join("\0")
}

/// Sample the whole process for `duration` and encode the result as a pprof
/// protobuf.
fn cpu_profile(duration: Duration) -> Result<Vec<u8>, pprof::Error> {
    let guard = pprof::ProfilerGuardBuilder::default()
        .frequency(PROFILE_FREQUENCY)
        .blocklist(&["libc", "libgcc", "pthread", "vdso"])
        .build()?;
    std::thread::sleep(duration);
    let profile = guard.report().build()?.pprof()?;
    Ok(profile.encode_to_vec())
}

fn profile_error(message: String) -> Response {
    tracing::warn!(error = %message, "CPU profile failed");
    (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
}

async fn profile_handler(Query(params): Query<ProfileParams>) -> Response {
    let seconds = match params.seconds {
        Some(seconds) if seconds > 0 => seconds,
        _ => DEFAULT_PROFILE_SECONDS,
    };
    tracing::info!(seconds, "Taking CPU profile");

    // A plain thread so an in-flight profile never holds up runtime shutdown.
    let (tx, rx) = oneshot::channel();
    let spawned = std::thread::Builder::new()
        .name("cpu-profile".to_string())
        .spawn(move || {
            let _ = tx.send(cpu_profile(Duration::from_secs(seconds)));
        });
    if let Err(e) = spawned {
        return profile_error(format!("failed to spawn profiler thread: {}", e));
    }

    match rx.await {
        Ok(Ok(body)) => (
            [
                (header::CONTENT_TYPE, "application/octet-stream"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"profile\""),
            ],
            body,
        )
            .into_response(),
        Ok(Err(e)) => profile_error(format!("could not take CPU profile: {}", e)),
        Err(_) => profile_error("profiler thread exited without a result".to_string()),
    }
}
