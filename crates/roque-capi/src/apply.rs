//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Foreign row callbacks. `rq_table_apply` runs a caller-supplied function
//! over every row, possibly from several worker threads, and builds a new
//! column from the results. The caller's context pointer is released through
//! the release hook exactly once, after the last callback invocation,
//! whether the apply succeeds or fails.

use std::ffi::{c_void, CStr};
use std::sync::Arc;

use roque::Value;

use crate::error::{check_not_null, rq_error, BoundaryError};
use crate::handle::{rq_table, rq_value, rq_value_list, wrap_column, wrap_value_list};
use crate::shell::call_shell;
use crate::value::rq_value_type;

/// Per-row callback. Receives the caller's context, a borrowed row (do not
/// destroy it), and an error slot. Returns an owned value handle, or null
/// with the slot set on failure.
#[allow(non_camel_case_types)]
pub type rq_row_callback = Option<
    unsafe extern "C" fn(
        context: *mut c_void,
        row: *const rq_value_list,
        error_out: *mut *mut rq_error,
    ) -> *mut rq_value,
>;

/// Context destructor, invoked exactly once when the runtime is done with
/// the context pointer.
#[allow(non_camel_case_types)]
pub type rq_context_release = Option<unsafe extern "C" fn(context: *mut c_void)>;

/// Caller context shared across worker threads. The release hook fires in
/// `Drop`, so it runs exactly once no matter how many threads held a
/// reference or how the apply ended.
struct SharedContext {
    context: *mut c_void,
    release: rq_context_release,
}

// The caller promises the context is safe to use from any thread for the
// duration of the apply; that promise is part of the rq_table_apply
// contract.
unsafe impl Send for SharedContext {}
unsafe impl Sync for SharedContext {}

impl Drop for SharedContext {
    fn drop(&mut self) {
        if let Some(release) = self.release {
            unsafe { release(self.context) };
        }
    }
}

/// Run `callback` over every row of `table` and collect the results into a
/// column of type `out_type`. Row order is preserved. On the first callback
/// failure the remaining rows are abandoned and the failure is re-raised in
/// the caller's error slot with kind `RQ_ERROR_CALLBACK`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_apply(
    table: *const rq_table,
    callback: rq_row_callback,
    context: *mut c_void,
    release: rq_context_release,
    out_type: rq_value_type,
    error_out: *mut *mut rq_error,
) -> *mut crate::handle::rq_column {
    call_shell(error_out, std::ptr::null_mut(), || {
        // Take ownership of the context before any validation so that early
        // failures still release it.
        let shared = Arc::new(SharedContext { context, release });

        check_not_null!(table, "table");
        let callback = callback.ok_or_else(|| BoundaryError::precondition("callback is null"))?;
        let table = unsafe { &(*table).value };

        let per_row = move |row: &[Value]| -> roque::Result<Value> {
            let row_handle = wrap_value_list(row.to_vec());
            let mut cb_error: *mut rq_error = std::ptr::null_mut();
            // SAFETY: row_handle is valid for the duration of the call and
            // destroyed right after; the callback only borrows it.
            let out = unsafe { callback(shared.context, row_handle, &mut cb_error) };
            unsafe { crate::handle::rq_value_list_destroy(row_handle) };

            if !cb_error.is_null() {
                let message = unsafe { CStr::from_ptr(crate::error::rq_error_message(cb_error)) }
                    .to_string_lossy()
                    .into_owned();
                unsafe {
                    crate::error::rq_error_destroy(cb_error);
                    if !out.is_null() {
                        crate::handle::rq_value_destroy(out);
                    }
                }
                return Err(roque::Error::Callback(message));
            }
            if out.is_null() {
                return Err(roque::Error::Callback(
                    "callback returned null without setting an error".to_string(),
                ));
            }
            let boxed = unsafe { Box::from_raw(out) };
            Ok(boxed.value)
        };

        let column = table
            .apply(per_row, out_type.to_engine())
            .map_err(BoundaryError::from)?;
        Ok(wrap_column(column))
    })
}
