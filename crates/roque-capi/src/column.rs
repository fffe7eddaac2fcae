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

//! Column handles: construction from value lists and element access.

use roque::Column;

use crate::error::{check_not_null, rq_error, BoundaryError};
use crate::handle::{rq_column, rq_value, rq_value_list, wrap_column, wrap_value};
use crate::shell::call_shell;
use crate::value::rq_value_type;

/// Build a column of the given type from a copy of the list's elements.
/// Every element must match `dtype` or be undefined.
#[no_mangle]
pub unsafe extern "C" fn rq_column_create(
    dtype: rq_value_type,
    values: *const rq_value_list,
    error_out: *mut *mut rq_error,
) -> *mut rq_column {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(values, "values");
        let values = unsafe { &(*values).values }.clone();
        let col = Column::from_values(dtype.to_engine(), values).map_err(BoundaryError::from)?;
        Ok(wrap_column(col))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_column_size(
    column: *const rq_column,
    error_out: *mut *mut rq_error,
) -> u64 {
    call_shell(error_out, 0, || {
        check_not_null!(column, "column");
        Ok(unsafe { &(*column).value }.len() as u64)
    })
}

/// Element type of the column, `RQ_TYPE_UNDEFINED` on failure.
#[no_mangle]
pub unsafe extern "C" fn rq_column_dtype(
    column: *const rq_column,
    error_out: *mut *mut rq_error,
) -> rq_value_type {
    call_shell(error_out, rq_value_type::RQ_TYPE_UNDEFINED, || {
        check_not_null!(column, "column");
        Ok(rq_value_type::from_engine(
            unsafe { &(*column).value }.dtype(),
        ))
    })
}

/// Owned copy of the element at `index`.
#[no_mangle]
pub unsafe extern "C" fn rq_column_extract(
    column: *const rq_column,
    index: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(column, "column");
        let value = unsafe { &(*column).value }
            .get(index as usize)
            .map_err(BoundaryError::from)?;
        Ok(wrap_value(value.clone()))
    })
}
