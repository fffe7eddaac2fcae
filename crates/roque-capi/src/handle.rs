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

//! Opaque handles. Every object crossing the boundary is a heap-allocated
//! wrapper around an engine value; the caller sees only a typed pointer and
//! frees it through the matching `rq_*_destroy`. Ownership transfers exactly
//! once: a handle returned by any entry point belongs to the caller until
//! destroyed or explicitly consumed by another entry point.

use roque::{AggSpec, Column, Table, Value};

#[allow(non_camel_case_types)]
pub struct rq_table {
    pub(crate) value: Table,
}

#[allow(non_camel_case_types)]
pub struct rq_column {
    pub(crate) value: Column,
}

#[allow(non_camel_case_types)]
pub struct rq_value {
    pub(crate) value: Value,
}

/// An ordered sequence of values, used for rows handed to callbacks and for
/// list-shaped arguments (filter sets, quantile levels, column selections).
#[allow(non_camel_case_types)]
pub struct rq_value_list {
    pub(crate) values: Vec<Value>,
}

#[allow(non_camel_case_types)]
pub struct rq_groupby_spec {
    pub(crate) spec: AggSpec,
}

pub(crate) fn wrap_table(value: Table) -> *mut rq_table {
    Box::into_raw(Box::new(rq_table { value }))
}

pub(crate) fn wrap_column(value: Column) -> *mut rq_column {
    Box::into_raw(Box::new(rq_column { value }))
}

pub(crate) fn wrap_value(value: Value) -> *mut rq_value {
    Box::into_raw(Box::new(rq_value { value }))
}

pub(crate) fn wrap_value_list(values: Vec<Value>) -> *mut rq_value_list {
    Box::into_raw(Box::new(rq_value_list { values }))
}

macro_rules! destroy_fn {
    ($name:ident, $ty:ty) => {
        /// Free the handle. Null is ignored; a dangling or already-freed
        /// pointer is undefined behavior.
        #[no_mangle]
        pub unsafe extern "C" fn $name(handle: *mut $ty) {
            if !handle.is_null() {
                drop(unsafe { Box::from_raw(handle) });
            }
        }
    };
}

destroy_fn!(rq_table_destroy, rq_table);
destroy_fn!(rq_column_destroy, rq_column);
destroy_fn!(rq_value_destroy, rq_value);
destroy_fn!(rq_value_list_destroy, rq_value_list);
destroy_fn!(rq_groupby_spec_destroy, rq_groupby_spec);
