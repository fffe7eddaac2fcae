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

//! C ABI surface for the roque table engine.
//!
//! Conventions, uniform across every entry point:
//! - objects cross the boundary as opaque handles freed by `rq_*_destroy`;
//! - every fallible call takes a trailing `rq_error**` slot, set on failure
//!   and left untouched on success;
//! - no panic ever unwinds across the boundary;
//! - fallback returns on failure are null, zero, false or
//!   `RQ_TYPE_UNDEFINED`, so results and errors are mutually exclusive.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod apply;
pub mod column;
pub mod error;
pub mod frame;
pub mod groupby;
pub mod handle;
pub mod params;
mod shell;
pub mod value;

pub use apply::{rq_context_release, rq_row_callback};
pub use error::{rq_error, rq_error_kind};
pub use handle::{rq_column, rq_groupby_spec, rq_table, rq_value, rq_value_list};
pub use params::rq_params;
pub use value::rq_value_type;

/// Optional explicit runtime initialization. `workers` sizes the pool used
/// by `rq_table_apply`; zero picks the machine's parallelism. Entry points
/// initialize the runtime lazily, so calling this is only needed to pin the
/// worker count, and only the first initialization wins.
///
/// This does not go through the call shell: the shell's lazy initialization
/// would claim the one-shot worker configuration before `workers` could.
#[no_mangle]
pub unsafe extern "C" fn rq_init(workers: u64, error_out: *mut *mut rq_error) {
    if std::panic::catch_unwind(|| roque::runtime::init(workers as usize)).is_err() {
        error::set_error(
            error_out,
            error::BoundaryError::operation("internal error: runtime initialization panicked"),
        );
    }
}
