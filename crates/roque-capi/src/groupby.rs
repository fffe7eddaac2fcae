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

//! Aggregation spec handles. A spec is built up one aggregation at a time,
//! keyed by destination column name; adding a destination that already
//! exists overwrites the aggregation but keeps its position. The spec stays
//! caller-owned: `rq_table_group_by` reads it without consuming it, so one
//! spec can drive several group-bys.

use roque::{AggOp, AggSpec, Value};

use crate::error::{check_not_null, rq_error, BoundaryError};
use crate::handle::{rq_groupby_spec, rq_value_list};
use crate::shell::call_shell;
use crate::value::cstr_arg;
use std::ffi::c_char;

#[no_mangle]
pub unsafe extern "C" fn rq_groupby_spec_create(
    error_out: *mut *mut rq_error,
) -> *mut rq_groupby_spec {
    call_shell(error_out, std::ptr::null_mut(), || {
        Ok(Box::into_raw(Box::new(rq_groupby_spec {
            spec: AggSpec::new(),
        })))
    })
}

/// Shared body for the one-source-column aggregations.
unsafe fn add_simple(
    spec: *mut rq_groupby_spec,
    column: *const c_char,
    dest: *const c_char,
    error_out: *mut *mut rq_error,
    build: impl FnOnce(String) -> AggOp,
) {
    call_shell(error_out, (), || {
        check_not_null!(spec, "spec");
        let column = unsafe { cstr_arg(column, "column") }?;
        let dest = unsafe { cstr_arg(dest, "dest") }?;
        unsafe { &mut (*spec).spec }.insert(dest, build(column.to_string()));
        Ok(())
    })
}

/// Shared body for the two-source-column aggregations.
unsafe fn add_pair(
    spec: *mut rq_groupby_spec,
    first: *const c_char,
    second: *const c_char,
    dest: *const c_char,
    error_out: *mut *mut rq_error,
    build: impl FnOnce(String, String) -> AggOp,
) {
    call_shell(error_out, (), || {
        check_not_null!(spec, "spec");
        let first = unsafe { cstr_arg(first, "first column") }?;
        let second = unsafe { cstr_arg(second, "second column") }?;
        let dest = unsafe { cstr_arg(dest, "dest") }?;
        unsafe { &mut (*spec).spec }.insert(dest, build(first.to_string(), second.to_string()));
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_groupby_spec_add_count(
    spec: *mut rq_groupby_spec,
    dest: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(spec, "spec");
        let dest = unsafe { cstr_arg(dest, "dest") }?;
        unsafe { &mut (*spec).spec }.insert(dest, AggOp::Count);
        Ok(())
    })
}

macro_rules! simple_agg {
    ($name:ident, $op:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $name(
            spec: *mut rq_groupby_spec,
            column: *const c_char,
            dest: *const c_char,
            error_out: *mut *mut rq_error,
        ) {
            unsafe { add_simple(spec, column, dest, error_out, AggOp::$op) }
        }
    };
}

simple_agg!(rq_groupby_spec_add_sum, Sum);
simple_agg!(rq_groupby_spec_add_mean, Mean);
simple_agg!(rq_groupby_spec_add_min, Min);
simple_agg!(rq_groupby_spec_add_max, Max);
simple_agg!(rq_groupby_spec_add_variance, Variance);
simple_agg!(rq_groupby_spec_add_stdev, Stdev);
simple_agg!(rq_groupby_spec_add_select_one, SelectOne);
simple_agg!(rq_groupby_spec_add_count_distinct, CountDistinct);
simple_agg!(rq_groupby_spec_add_concat_one_column, Concat);

// Aliases kept for callers used to the short spellings.
simple_agg!(rq_groupby_spec_add_avg, Mean);
simple_agg!(rq_groupby_spec_add_var, Variance);
simple_agg!(rq_groupby_spec_add_std, Stdev);
simple_agg!(rq_groupby_spec_add_stdv, Stdev);

/// Collect `(key column, value column)` pairs into a per-group dict.
#[no_mangle]
pub unsafe extern "C" fn rq_groupby_spec_add_concat_two_columns(
    spec: *mut rq_groupby_spec,
    key_column: *const c_char,
    value_column: *const c_char,
    dest: *const c_char,
    error_out: *mut *mut rq_error,
) {
    unsafe { add_pair(spec, key_column, value_column, dest, error_out, AggOp::ConcatPairs) }
}

#[no_mangle]
pub unsafe extern "C" fn rq_groupby_spec_add_argmax(
    spec: *mut rq_groupby_spec,
    agg_column: *const c_char,
    out_column: *const c_char,
    dest: *const c_char,
    error_out: *mut *mut rq_error,
) {
    unsafe { add_pair(spec, agg_column, out_column, dest, error_out, AggOp::Argmax) }
}

#[no_mangle]
pub unsafe extern "C" fn rq_groupby_spec_add_argmin(
    spec: *mut rq_groupby_spec,
    agg_column: *const c_char,
    out_column: *const c_char,
    dest: *const c_char,
    error_out: *mut *mut rq_error,
) {
    unsafe { add_pair(spec, agg_column, out_column, dest, error_out, AggOp::Argmin) }
}

/// A single quantile level in [0, 1]; the destination cell is a float.
#[no_mangle]
pub unsafe extern "C" fn rq_groupby_spec_add_quantile(
    spec: *mut rq_groupby_spec,
    column: *const c_char,
    level: f64,
    dest: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(spec, "spec");
        let column = unsafe { cstr_arg(column, "column") }?;
        let dest = unsafe { cstr_arg(dest, "dest") }?;
        validate_level(level)?;
        unsafe { &mut (*spec).spec }.insert(dest, AggOp::Quantile(column.to_string(), vec![level]));
        Ok(())
    })
}

/// Several quantile levels; the destination cell is a list of floats. Every
/// element of `levels` must be a float value.
#[no_mangle]
pub unsafe extern "C" fn rq_groupby_spec_add_quantiles(
    spec: *mut rq_groupby_spec,
    column: *const c_char,
    levels: *const rq_value_list,
    dest: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(spec, "spec");
        check_not_null!(levels, "levels");
        let column = unsafe { cstr_arg(column, "column") }?;
        let dest = unsafe { cstr_arg(dest, "dest") }?;
        let mut parsed = Vec::new();
        for level in unsafe { &(*levels).values } {
            match level {
                Value::Float(f) => {
                    validate_level(*f)?;
                    parsed.push(*f);
                }
                _ => {
                    return Err(BoundaryError::validation("Contains a non-float quantile."));
                }
            }
        }
        if parsed.is_empty() {
            return Err(BoundaryError::validation("quantile levels list is empty"));
        }
        unsafe { &mut (*spec).spec }.insert(dest, AggOp::Quantile(column.to_string(), parsed));
        Ok(())
    })
}

fn validate_level(level: f64) -> Result<(), BoundaryError> {
    if !(0.0..=1.0).contains(&level) {
        return Err(BoundaryError::validation(format!(
            "quantile level {level} is outside [0, 1]"
        )));
    }
    Ok(())
}
