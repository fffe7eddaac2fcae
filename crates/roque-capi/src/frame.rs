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

//! Table entry points. Every function follows the same shape: arguments are
//! checked for null before anything is dereferenced, the body runs inside
//! the call shell, failures land in the error slot, and the fallback return
//! is null (handles), zero (counts) or `RQ_TYPE_UNDEFINED` (type queries).
//! Tables are value-semantic: operations that "modify" a table mutate the
//! handle the caller passed; operations that derive a table return a new
//! handle.

use std::ffi::c_char;

use roque::{CsvConfig, DropHow, JoinHow, Table, Value, ValueType};

use crate::error::{check_not_null, rq_error, BoundaryError};
use crate::handle::{
    rq_column, rq_groupby_spec, rq_table, rq_value, rq_value_list, wrap_table, wrap_value,
    wrap_value_list,
};
use crate::params::rq_params;
use crate::shell::call_shell;
use crate::value::{cstr_arg, rq_value_type};

const NULL_TABLE: *mut rq_table = std::ptr::null_mut();

/// Collect a value list of strings into owned names.
fn string_vec(values: &[Value], what: &str) -> Result<Vec<String>, BoundaryError> {
    values
        .iter()
        .map(|v| match v {
            Value::Str(s) => Ok(s.clone()),
            other => Err(BoundaryError::validation(format!(
                "{what} must be strings, got {}",
                other.value_type()
            ))),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Construction and persistence
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn rq_table_create(error_out: *mut *mut rq_error) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || Ok(wrap_table(Table::new())))
}

/// Deep-copy semantics from the caller's point of view; storage is shared
/// until either table is modified.
#[no_mangle]
pub unsafe extern "C" fn rq_table_create_copy(
    table: *const rq_table,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        Ok(wrap_table(unsafe { &(*table).value }.clone()))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_load(
    path: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        let path = unsafe { cstr_arg(path, "path") }?;
        Ok(wrap_table(Table::load(path).map_err(BoundaryError::from)?))
    })
}

/// Persist to `format`, one of `"csv"` or `"binary"`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_save(
    table: *const rq_table,
    path: *const c_char,
    format: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        let path = unsafe { cstr_arg(path, "path") }?;
        let format = unsafe { cstr_arg(format, "format") }?;
        unsafe { &(*table).value }
            .save(path, format)
            .map_err(BoundaryError::from)
    })
}

/// Read delimited text. A null `params` means all defaults. Parameter
/// validation happens before the file is touched.
#[no_mangle]
pub unsafe extern "C" fn rq_table_read_csv(
    path: *const c_char,
    params: *const rq_params,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        let path = unsafe { cstr_arg(path, "path") }?;
        let config = if params.is_null() {
            CsvConfig::default()
        } else {
            unsafe { &*params }.to_csv_config()?
        };
        Ok(wrap_table(
            Table::read_csv(path, &config).map_err(BoundaryError::from)?,
        ))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_read_json_lines(
    path: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        let path = unsafe { cstr_arg(path, "path") }?;
        Ok(wrap_table(
            Table::read_json_lines(path).map_err(BoundaryError::from)?,
        ))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_write_csv(
    table: *const rq_table,
    path: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        let path = unsafe { cstr_arg(path, "path") }?;
        unsafe { &(*table).value }
            .write_csv(path)
            .map_err(BoundaryError::from)
    })
}

// ---------------------------------------------------------------------------
// Shape and schema queries
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn rq_table_num_rows(
    table: *const rq_table,
    error_out: *mut *mut rq_error,
) -> u64 {
    call_shell(error_out, 0, || {
        check_not_null!(table, "table");
        Ok(unsafe { &(*table).value }.num_rows() as u64)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_num_columns(
    table: *const rq_table,
    error_out: *mut *mut rq_error,
) -> u64 {
    call_shell(error_out, 0, || {
        check_not_null!(table, "table");
        Ok(unsafe { &(*table).value }.num_columns() as u64)
    })
}

/// All column names, left to right, as an owned list of string values.
#[no_mangle]
pub unsafe extern "C" fn rq_table_column_names(
    table: *const rq_table,
    error_out: *mut *mut rq_error,
) -> *mut rq_value_list {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(table, "table");
        let names = unsafe { &(*table).value }
            .column_names()
            .into_iter()
            .map(Value::Str)
            .collect();
        Ok(wrap_value_list(names))
    })
}

/// Name of the column at `index`, as an owned string value handle. Owned
/// rather than borrowed so the name stays valid after the table is renamed
/// or destroyed.
#[no_mangle]
pub unsafe extern "C" fn rq_table_column_name(
    table: *const rq_table,
    index: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(table, "table");
        let name = unsafe { &(*table).value }
            .column_name(index as usize)
            .map_err(BoundaryError::from)?;
        Ok(wrap_value(Value::Str(name.to_string())))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_column_type(
    table: *const rq_table,
    name: *const c_char,
    error_out: *mut *mut rq_error,
) -> rq_value_type {
    call_shell(error_out, rq_value_type::RQ_TYPE_UNDEFINED, || {
        check_not_null!(table, "table");
        let name = unsafe { cstr_arg(name, "name") }?;
        let ty = unsafe { &(*table).value }
            .column_type(name)
            .map_err(BoundaryError::from)?;
        Ok(rq_value_type::from_engine(ty))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_contains_column(
    table: *const rq_table,
    name: *const c_char,
    error_out: *mut *mut rq_error,
) -> bool {
    call_shell(error_out, false, || {
        check_not_null!(table, "table");
        let name = unsafe { cstr_arg(name, "name") }?;
        Ok(unsafe { &(*table).value }.contains_column(name))
    })
}

/// Owned handle to the named column; shares storage with the table until
/// either side is modified.
#[no_mangle]
pub unsafe extern "C" fn rq_table_extract_column_by_name(
    table: *const rq_table,
    name: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_column {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(table, "table");
        let name = unsafe { cstr_arg(name, "name") }?;
        let col = unsafe { &(*table).value }
            .select_column(name)
            .map_err(BoundaryError::from)?;
        Ok(crate::handle::wrap_column(col))
    })
}

/// Owned copy of the row at `index`, one element per column.
#[no_mangle]
pub unsafe extern "C" fn rq_table_extract_row(
    table: *const rq_table,
    index: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_value_list {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(table, "table");
        let row = unsafe { &(*table).value }
            .extract_row(index as usize)
            .map_err(BoundaryError::from)?;
        Ok(wrap_value_list(row))
    })
}

// ---------------------------------------------------------------------------
// Column mutation
// ---------------------------------------------------------------------------

/// Add a copy of `column` under `name`. Fails on a duplicate name or a
/// length mismatch against a non-empty table.
#[no_mangle]
pub unsafe extern "C" fn rq_table_add_column(
    table: *mut rq_table,
    name: *const c_char,
    column: *const rq_column,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        check_not_null!(column, "column");
        let name = unsafe { cstr_arg(name, "name") }?;
        let col = unsafe { &(*column).value }.clone();
        unsafe { &mut (*table).value }
            .add_column(name, col)
            .map_err(BoundaryError::from)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_add_constant_column(
    table: *mut rq_table,
    name: *const c_char,
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        check_not_null!(value, "value");
        let name = unsafe { cstr_arg(name, "name") }?;
        let value = unsafe { &(*value).value }.clone();
        unsafe { &mut (*table).value }
            .add_constant_column(name, value)
            .map_err(BoundaryError::from)
    })
}

/// Append every column of `other` to `table`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_add_columns(
    table: *mut rq_table,
    other: *const rq_table,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        check_not_null!(other, "other");
        let other = unsafe { &(*other).value }.clone();
        unsafe { &mut (*table).value }
            .add_columns(&other)
            .map_err(BoundaryError::from)
    })
}

/// Add or replace: overwrites an existing column of the same name in place.
#[no_mangle]
pub unsafe extern "C" fn rq_table_replace_add_column(
    table: *mut rq_table,
    name: *const c_char,
    column: *const rq_column,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        check_not_null!(column, "column");
        let name = unsafe { cstr_arg(name, "name") }?;
        let col = unsafe { &(*column).value }.clone();
        unsafe { &mut (*table).value }
            .replace_add_column(name, col)
            .map_err(BoundaryError::from)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_remove_column(
    table: *mut rq_table,
    name: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        let name = unsafe { cstr_arg(name, "name") }?;
        unsafe { &mut (*table).value }
            .remove_column(name)
            .map_err(BoundaryError::from)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_rename_column(
    table: *mut rq_table,
    old_name: *const c_char,
    new_name: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        let old_name = unsafe { cstr_arg(old_name, "old_name") }?;
        let new_name = unsafe { cstr_arg(new_name, "new_name") }?;
        unsafe { &mut (*table).value }
            .rename_column(old_name, new_name)
            .map_err(BoundaryError::from)
    })
}

/// Rename several columns at once. `old_names` and `new_names` pair up by
/// position and must have the same length.
#[no_mangle]
pub unsafe extern "C" fn rq_table_rename_columns(
    table: *mut rq_table,
    old_names: *const rq_value_list,
    new_names: *const rq_value_list,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        check_not_null!(old_names, "old_names");
        check_not_null!(new_names, "new_names");
        let old_names = string_vec(unsafe { &(*old_names).values }, "old names")?;
        let new_names = string_vec(unsafe { &(*new_names).values }, "new names")?;
        if old_names.len() != new_names.len() {
            return Err(BoundaryError::validation(format!(
                "old_names has {} entries, new_names has {}",
                old_names.len(),
                new_names.len()
            )));
        }
        let mapping: Vec<(String, String)> =
            old_names.into_iter().zip(new_names).collect();
        unsafe { &mut (*table).value }
            .rename_columns(&mapping)
            .map_err(BoundaryError::from)
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_swap_columns(
    table: *mut rq_table,
    first: *const c_char,
    second: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        let first = unsafe { cstr_arg(first, "first") }?;
        let second = unsafe { cstr_arg(second, "second") }?;
        unsafe { &mut (*table).value }
            .swap_columns(first, second)
            .map_err(BoundaryError::from)
    })
}

// ---------------------------------------------------------------------------
// Row selection
// ---------------------------------------------------------------------------

/// First `n` rows, clamped to the table length.
#[no_mangle]
pub unsafe extern "C" fn rq_table_head(
    table: *const rq_table,
    n: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        Ok(wrap_table(unsafe { &(*table).value }.head(n as usize)))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_tail(
    table: *const rq_table,
    n: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        Ok(wrap_table(unsafe { &(*table).value }.tail(n as usize)))
    })
}

/// Rows in `[start, end)`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_slice(
    table: *const rq_table,
    start: u64,
    end: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let sliced = unsafe { &(*table).value }
            .slice(start as usize, end as usize)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(sliced))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_slice_stride(
    table: *const rq_table,
    start: u64,
    end: u64,
    stride: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let sliced = unsafe { &(*table).value }
            .slice_stride(start as usize, end as usize, stride as usize)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(sliced))
    })
}

// ---------------------------------------------------------------------------
// Derived tables
// ---------------------------------------------------------------------------

/// Rows of `table` followed by rows of `other`; schemas must match by name
/// and position.
#[no_mangle]
pub unsafe extern "C" fn rq_table_append(
    table: *const rq_table,
    other: *const rq_table,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        check_not_null!(other, "other");
        let appended = unsafe { &(*table).value }
            .append(unsafe { &(*other).value })
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(appended))
    })
}

/// Distinct rows, keeping the first occurrence of each.
#[no_mangle]
pub unsafe extern "C" fn rq_table_unique(
    table: *const rq_table,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let out = unsafe { &(*table).value }
            .unique()
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_sort_single_column(
    table: *const rq_table,
    column: *const c_char,
    ascending: bool,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let column = unsafe { cstr_arg(column, "column") }?;
        let out = unsafe { &(*table).value }
            .sort(&[column.to_string()], ascending)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Stable sort by several columns, leftmost most significant.
#[no_mangle]
pub unsafe extern "C" fn rq_table_sort_multiple_columns(
    table: *const rq_table,
    columns: *const rq_value_list,
    ascending: bool,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        check_not_null!(columns, "columns");
        let columns = string_vec(unsafe { &(*columns).values }, "sort columns")?;
        let out = unsafe { &(*table).value }
            .sort(&columns, ascending)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// The `k` largest rows by `column` (`reverse` for smallest), sorted.
#[no_mangle]
pub unsafe extern "C" fn rq_table_topk(
    table: *const rq_table,
    column: *const c_char,
    k: u64,
    reverse: bool,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let column = unsafe { cstr_arg(column, "column") }?;
        let out = unsafe { &(*table).value }
            .topk(column, k as usize, reverse)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Drop rows with undefined cells. A null `columns` inspects all columns;
/// `how` is `"any"` or `"all"`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_dropna(
    table: *const rq_table,
    columns: *const rq_value_list,
    how: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let how = DropHow::parse(unsafe { cstr_arg(how, "how") }?).map_err(BoundaryError::from)?;
        let tbl = unsafe { &(*table).value };
        let columns = if columns.is_null() {
            tbl.column_names()
        } else {
            string_vec(unsafe { &(*columns).values }, "dropna columns")?
        };
        let out = tbl.dropna(&columns, how).map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Keep (or with `exclude`, drop) rows whose `column` cell is in `values`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_filter_by(
    table: *const rq_table,
    values: *const rq_value_list,
    column: *const c_char,
    exclude: bool,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        check_not_null!(values, "values");
        let column = unsafe { cstr_arg(column, "column") }?;
        let out = unsafe { &(*table).value }
            .filter_by(unsafe { &(*values).values }, column, exclude)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Replace undefined cells of `column` with `value`, cast to the column's
/// type.
#[no_mangle]
pub unsafe extern "C" fn rq_table_fillna(
    table: *const rq_table,
    column: *const c_char,
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        check_not_null!(value, "value");
        let column = unsafe { cstr_arg(column, "column") }?;
        let out = unsafe { &(*table).value }
            .fillna(column, unsafe { &(*value).value })
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Bernoulli row sample; the same seed and fraction always select the same
/// rows.
#[no_mangle]
pub unsafe extern "C" fn rq_table_sample(
    table: *const rq_table,
    fraction: f64,
    seed: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let out = unsafe { &(*table).value }
            .sample(fraction, seed)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Split into two disjoint tables covering every row; the first receives
/// roughly `fraction` of them. Both out-params receive owned handles.
#[no_mangle]
pub unsafe extern "C" fn rq_table_random_split(
    table: *const rq_table,
    fraction: f64,
    seed: u64,
    first_out: *mut *mut rq_table,
    second_out: *mut *mut rq_table,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        check_not_null!(first_out, "first_out");
        check_not_null!(second_out, "second_out");
        let (first, second) = unsafe { &(*table).value }
            .random_split(fraction, seed)
            .map_err(BoundaryError::from)?;
        unsafe {
            *first_out = wrap_table(first);
            *second_out = wrap_table(second);
        }
        Ok(())
    })
}

/// Hash join on one shared column name; `how` is `inner`, `left`, `right`
/// or `outer`. Clashing non-key names from the right side get a `.1`
/// suffix.
#[no_mangle]
pub unsafe extern "C" fn rq_table_join_on_single_column(
    left: *const rq_table,
    right: *const rq_table,
    column: *const c_char,
    how: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(left, "left");
        check_not_null!(right, "right");
        let column = unsafe { cstr_arg(column, "column") }?;
        let how = JoinHow::parse(unsafe { cstr_arg(how, "how") }?).map_err(BoundaryError::from)?;
        let out = unsafe { &(*left).value }
            .join(unsafe { &(*right).value }, column, how)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Collapse `columns` into a single list- or dict-typed column named
/// `new_name`; undefined cells are replaced by a copy of `na`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_pack_columns(
    table: *const rq_table,
    columns: *const rq_value_list,
    new_name: *const c_char,
    dtype: rq_value_type,
    na: *const rq_value,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        check_not_null!(columns, "columns");
        check_not_null!(na, "na");
        let new_name = unsafe { cstr_arg(new_name, "new_name") }?;
        let columns = string_vec(unsafe { &(*columns).values }, "pack columns")?;
        let out = unsafe { &(*table).value }
            .pack_columns(&columns, new_name, dtype.to_engine(), unsafe {
                &(*na).value
            })
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Expand a list- or dict-typed column into one column per element or key.
/// An empty `prefix` keeps the bare key names.
#[no_mangle]
pub unsafe extern "C" fn rq_table_unpack(
    table: *const rq_table,
    column: *const c_char,
    prefix: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let column = unsafe { cstr_arg(column, "column") }?;
        let prefix = unsafe { cstr_arg(prefix, "prefix") }?;
        let out = unsafe { &(*table).value }
            .unpack(column, prefix)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Explode a list- or dict-typed column into one row per element, repeating
/// the other columns. The exploded column keeps its name for lists; a dict
/// column splits into `{column}.key` and `{column}.value`. Empty and
/// undefined cells stay as a single undefined row.
#[no_mangle]
pub unsafe extern "C" fn rq_table_stack(
    table: *const rq_table,
    column: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let column = unsafe { cstr_arg(column, "column") }?;
        let source = unsafe { &(*table).value };
        let names = match source.column_type(column).map_err(BoundaryError::from)? {
            ValueType::List => vec![column.to_string()],
            ValueType::Dict => vec![format!("{column}.key"), format!("{column}.value")],
            // Let the engine report the unsupported dtype.
            _ => Vec::new(),
        };
        let out = source
            .stack(column, &names, false)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// `rq_table_stack` with explicit result column names (one for a list
/// column, two for a dict column) and a switch to drop empty and undefined
/// cells instead of keeping them as undefined rows.
#[no_mangle]
pub unsafe extern "C" fn rq_table_stack_and_rename(
    table: *const rq_table,
    column: *const c_char,
    new_names: *const rq_value_list,
    drop_na: bool,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        check_not_null!(new_names, "new_names");
        let column = unsafe { cstr_arg(column, "column") }?;
        let names = string_vec(unsafe { &(*new_names).values }, "stack names")?;
        let out = unsafe { &(*table).value }
            .stack(column, &names, drop_na)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Inverse of `rq_table_stack` for one column: group by every other column
/// and collect `column` back into a list named `new_name`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_unstack(
    table: *const rq_table,
    column: *const c_char,
    new_name: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let column = unsafe { cstr_arg(column, "column") }?.to_string();
        let new_name = unsafe { cstr_arg(new_name, "new_name") }?;
        let out = unsafe { &(*table).value }
            .unstack(&[column], new_name)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Inverse of `rq_table_stack` for a dict column: group by every other
/// column and collect key/value pairs back into a dict named `new_name`.
#[no_mangle]
pub unsafe extern "C" fn rq_table_unstack_two_columns(
    table: *const rq_table,
    key_column: *const c_char,
    value_column: *const c_char,
    new_name: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        let key_column = unsafe { cstr_arg(key_column, "key_column") }?.to_string();
        let value_column = unsafe { cstr_arg(value_column, "value_column") }?.to_string();
        let new_name = unsafe { cstr_arg(new_name, "new_name") }?;
        let out = unsafe { &(*table).value }
            .unstack(&[key_column, value_column], new_name)
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

/// Group by `keys` and evaluate the spec's aggregations per group. Key
/// columns come first in the result, then one column per aggregation in
/// spec order. The spec is borrowed, not consumed.
#[no_mangle]
pub unsafe extern "C" fn rq_table_group_by(
    table: *const rq_table,
    keys: *const rq_value_list,
    spec: *const rq_groupby_spec,
    error_out: *mut *mut rq_error,
) -> *mut rq_table {
    call_shell(error_out, NULL_TABLE, || {
        check_not_null!(table, "table");
        check_not_null!(keys, "keys");
        check_not_null!(spec, "spec");
        let keys = string_vec(unsafe { &(*keys).values }, "group keys")?;
        let out = unsafe { &(*table).value }
            .groupby(&keys, unsafe { &(*spec).spec })
            .map_err(BoundaryError::from)?;
        Ok(wrap_table(out))
    })
}

// ---------------------------------------------------------------------------
// Materialization and diagnostics
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn rq_table_is_materialized(
    table: *const rq_table,
    error_out: *mut *mut rq_error,
) -> bool {
    call_shell(error_out, false, || {
        check_not_null!(table, "table");
        Ok(unsafe { &(*table).value }.is_materialized())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_table_materialize(
    table: *mut rq_table,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(table, "table");
        unsafe { &mut (*table).value }.materialize();
        Ok(())
    })
}

/// Human-readable preview (schema plus the first rows), as an owned string
/// value.
#[no_mangle]
pub unsafe extern "C" fn rq_table_text_summary(
    table: *const rq_table,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(table, "table");
        Ok(wrap_value(Value::Str(
            unsafe { &(*table).value }.to_string(),
        )))
    })
}
