//! The C ABI between the runner and plugin artifacts.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::error::JobError;
use crate::job::{JobContext, Runnable};

/// Bumped whenever [`RunFn`] or the status codes change.
pub const ABI_VERSION: u32 = 1;

pub const RUN_SYMBOL: &[u8] = b"Run\0";
pub const ABI_VERSION_SYMBOL: &[u8] = b"RUN_ABI_VERSION\0";

pub const STATUS_OK: c_int = 0;
pub const STATUS_FAILED: c_int = 1;
pub const STATUS_INVALID_ARGUMENTS: c_int = 2;
pub const STATUS_PANICKED: c_int = 3;

/// `Run(name, params, len)`: `params` points at `len` NUL-terminated strings.
/// Returns [`STATUS_OK`] on success.
pub type RunFn =
    unsafe extern "C" fn(name: *const c_char, params: *const *const c_char, len: usize) -> c_int;

/// Copy the raw `Run` arguments into owned strings. Invalid UTF-8 is replaced.
///
/// # Safety
///
/// `name` must be a valid C string and `params` must point at `len` valid C
/// strings (or be null when `len` is zero).
pub unsafe fn decode_args(
    name: *const c_char,
    params: *const *const c_char,
    len: usize,
) -> (String, Vec<String>) {
    let name = if name.is_null() {
        String::new()
    } else {
        CStr::from_ptr(name).to_string_lossy().into_owned()
    };
    let params = if params.is_null() || len == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(params, len)
            .iter()
            .map(|p| CStr::from_ptr(*p).to_string_lossy().into_owned())
            .collect()
    };
    (name, params)
}

/// Status code a plugin reports for a job result.
pub fn status_for(result: &Result<(), JobError>) -> c_int {
    match result {
        Ok(()) => STATUS_OK,
        Err(JobError::InvalidArguments(_)) => STATUS_INVALID_ARGUMENTS,
        Err(JobError::Panicked(_)) => STATUS_PANICKED,
        Err(_) => STATUS_FAILED,
    }
}

/// Body of the `Run` symbol generated by [`export_job!`](crate::export_job).
///
/// Plugins carry their own copy of the logging globals, so this installs a
/// subscriber inside the plugin on first use. The host's cancellation token
/// does not cross the ABI; plugin jobs see a context that is never cancelled.
///
/// # Safety
///
/// Same contract as [`decode_args`].
pub unsafe fn run_exported<J>(
    name: *const c_char,
    params: *const *const c_char,
    len: usize,
) -> c_int
where
    J: Runnable + Default,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    let (name, params) = decode_args(name, params, len);
    let ctx = JobContext::new(Uuid::new_v4(), name.clone(), CancellationToken::new());

    let result = catch_unwind(AssertUnwindSafe(|| J::default().run(&ctx, &name, &params)))
        .unwrap_or_else(|_| Err(JobError::Panicked("plugin job panicked".to_string())))
        .map(|_| ());

    if let Err(e) = &result {
        tracing::error!(job_name = %name, error = %e, "Plugin job failed");
    }
    status_for(&result)
}

/// Export a `Runnable + Default` type as this library's plugin job.
///
/// ```ignore
/// #[derive(Default)]
/// struct NightlyReportJob;
///
/// impl jobrunner::job::Runnable for NightlyReportJob { /* ... */ }
///
/// jobrunner::export_job!(NightlyReportJob);
/// ```
#[macro_export]
macro_rules! export_job {
    ($job:ty) => {
        #[no_mangle]
        pub static RUN_ABI_VERSION: u32 = $crate::plugin::abi::ABI_VERSION;

        /// Plugin entry point called by the job runner.
        ///
        /// # Safety
        ///
        /// `name` must be a valid C string and `params` must point at `len`
        /// valid C strings.
        #[no_mangle]
        #[allow(non_snake_case)]
        pub unsafe extern "C" fn Run(
            name: *const ::std::os::raw::c_char,
            params: *const *const ::std::os::raw::c_char,
            len: usize,
        ) -> ::std::os::raw::c_int {
            $crate::plugin::abi::run_exported::<$job>(name, params, len)
        }
    };
}
