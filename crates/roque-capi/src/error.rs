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

//! The error channel: an out-parameter slot the caller passes to every entry
//! point. On failure the slot receives an owned `rq_error`; on success it is
//! left untouched. Setting a slot that already holds an error frees the old
//! one first, so callers may reuse a slot across calls without leaking.

use std::ffi::{c_char, CString};

/// Broad failure class, stable across the ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum rq_error_kind {
    /// A required argument was null or otherwise unusable.
    RQ_ERROR_PRECONDITION = 0,
    /// Arguments were present but invalid (bad option, bad type, bad range).
    RQ_ERROR_VALIDATION = 1,
    /// The operation itself failed inside the engine.
    RQ_ERROR_OPERATION = 2,
    /// A caller-supplied callback reported or caused the failure.
    RQ_ERROR_CALLBACK = 3,
}

/// Owned error object handed across the boundary. The caller frees it with
/// [`rq_error_destroy`].
#[allow(non_camel_case_types)]
pub struct rq_error {
    kind: rq_error_kind,
    message: CString,
}

/// Internal form of a boundary failure, converted to an [`rq_error`] by the
/// call shell.
#[derive(Debug)]
pub struct BoundaryError {
    pub kind: rq_error_kind,
    pub message: String,
}

impl BoundaryError {
    pub fn precondition(message: impl Into<String>) -> BoundaryError {
        BoundaryError {
            kind: rq_error_kind::RQ_ERROR_PRECONDITION,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> BoundaryError {
        BoundaryError {
            kind: rq_error_kind::RQ_ERROR_VALIDATION,
            message: message.into(),
        }
    }

    pub fn operation(message: impl Into<String>) -> BoundaryError {
        BoundaryError {
            kind: rq_error_kind::RQ_ERROR_OPERATION,
            message: message.into(),
        }
    }
}

impl From<roque::Error> for BoundaryError {
    fn from(err: roque::Error) -> BoundaryError {
        let kind = match &err {
            roque::Error::Callback(_) => rq_error_kind::RQ_ERROR_CALLBACK,
            roque::Error::InvalidArgument(_) => rq_error_kind::RQ_ERROR_VALIDATION,
            _ => rq_error_kind::RQ_ERROR_OPERATION,
        };
        BoundaryError {
            kind,
            message: err.to_string(),
        }
    }
}

/// Place `err` into the caller's slot, replacing (and freeing) any error the
/// slot already holds. A null slot drops the error silently.
pub(crate) fn set_error(slot: *mut *mut rq_error, err: BoundaryError) {
    if slot.is_null() {
        return;
    }
    // Interior NULs cannot round-trip through a C string; mangle rather
    // than fail inside the error path itself.
    let message = CString::new(err.message.replace('\0', "\u{fffd}"))
        .unwrap_or_else(|_| CString::new("invalid error message").unwrap());
    let boxed = Box::new(rq_error {
        kind: err.kind,
        message,
    });
    // SAFETY: the caller hands us a valid slot; any prior content was an
    // rq_error we allocated.
    unsafe {
        let prev = *slot;
        if !prev.is_null() {
            drop(Box::from_raw(prev));
        }
        *slot = Box::into_raw(boxed);
    }
}

/// Fail with a precondition error when a required pointer argument is null.
/// Expands to an early `return Err(..)`, so it only makes sense inside the
/// closure handed to the call shell.
macro_rules! check_not_null {
    ($ptr:expr, $name:expr) => {
        if $ptr.is_null() {
            return Err($crate::error::BoundaryError::precondition(concat!(
                $name, " is null"
            )));
        }
    };
}
pub(crate) use check_not_null;

/// Failure class of the error, or `RQ_ERROR_OPERATION` for a null handle.
#[no_mangle]
pub unsafe extern "C" fn rq_error_kind_of(error: *const rq_error) -> rq_error_kind {
    if error.is_null() {
        return rq_error_kind::RQ_ERROR_OPERATION;
    }
    unsafe { (*error).kind }
}

/// Borrowed NUL-terminated message, valid until the error is destroyed.
#[no_mangle]
pub unsafe extern "C" fn rq_error_message(error: *const rq_error) -> *const c_char {
    if error.is_null() {
        return std::ptr::null();
    }
    unsafe { (*error).message.as_ptr() }
}

#[no_mangle]
pub unsafe extern "C" fn rq_error_destroy(error: *mut rq_error) {
    if !error.is_null() {
        drop(unsafe { Box::from_raw(error) });
    }
}
