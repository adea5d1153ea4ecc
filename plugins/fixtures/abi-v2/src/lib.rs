//! Exports a well-formed `Run` under an ABI version the runner does not speak.

use std::ffi::c_char;
use std::os::raw::c_int;

#[no_mangle]
pub static RUN_ABI_VERSION: u32 = 2;

/// # Safety
///
/// Never dereferences its arguments.
#[no_mangle]
pub unsafe extern "C" fn Run(
    _name: *const c_char,
    _params: *const *const c_char,
    _len: usize,
) -> c_int {
    0
}
