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

//! The call shell every entry point runs inside. It guarantees that no Rust
//! panic unwinds across the C ABI and that every failure, panic or `Err`,
//! lands in the caller's error slot while the entry point returns its
//! fallback value.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

use crate::error::{rq_error, set_error, BoundaryError};

/// Run `body` with panics contained. On `Err` or panic the error lands in
/// `error_out` and `fallback` is returned; on success the slot is untouched.
pub(crate) fn call_shell<T, F>(error_out: *mut *mut rq_error, fallback: T, body: F) -> T
where
    F: FnOnce() -> Result<T, BoundaryError>,
{
    roque::runtime::ensure_initialized();
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            set_error(error_out, err);
            fallback
        }
        Err(panic) => {
            let message = panic_message(&*panic);
            error!(message, "panic contained at boundary");
            set_error(
                error_out,
                BoundaryError::operation(format!("internal error: {message}")),
            );
            fallback
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_leaves_slot_untouched() {
        let mut slot: *mut rq_error = std::ptr::null_mut();
        let got = call_shell(&mut slot, 0i64, || Ok(7i64));
        assert_eq!(got, 7);
        assert!(slot.is_null());
    }

    #[test]
    fn panic_becomes_error_and_fallback() {
        let mut slot: *mut rq_error = std::ptr::null_mut();
        let got = call_shell(&mut slot, -1i64, || -> Result<i64, BoundaryError> {
            panic!("boom");
        });
        assert_eq!(got, -1);
        assert!(!slot.is_null());
        unsafe {
            let msg = std::ffi::CStr::from_ptr(crate::error::rq_error_message(slot));
            assert!(msg.to_str().unwrap().contains("boom"));
            crate::error::rq_error_destroy(slot);
        }
    }

    #[test]
    fn second_failure_replaces_first() {
        let mut slot: *mut rq_error = std::ptr::null_mut();
        call_shell(&mut slot, (), || Err(BoundaryError::validation("first")));
        call_shell(&mut slot, (), || Err(BoundaryError::validation("second")));
        assert!(!slot.is_null());
        unsafe {
            let msg = std::ffi::CStr::from_ptr(crate::error::rq_error_message(slot));
            assert_eq!(msg.to_str().unwrap(), "second");
            crate::error::rq_error_destroy(slot);
        }
    }
}
