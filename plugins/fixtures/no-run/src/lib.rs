//! Declares the current ABI version but exports no `Run`.

#[no_mangle]
pub static RUN_ABI_VERSION: u32 = 1;
