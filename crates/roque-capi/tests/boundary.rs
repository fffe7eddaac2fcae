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

//! Exercises the C ABI exactly the way a foreign caller would: raw pointers,
//! error slots, explicit destroys.

use std::ffi::{c_void, CStr, CString};
use std::io::Write as _;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use roque_capi::apply::rq_table_apply;
use roque_capi::column::{rq_column_create, rq_column_extract, rq_column_size};
use roque_capi::error::{rq_error_destroy, rq_error_kind_of, rq_error_message};
use roque_capi::frame::*;
use roque_capi::groupby::{
    rq_groupby_spec_add_mean, rq_groupby_spec_add_quantiles, rq_groupby_spec_add_sum,
    rq_groupby_spec_create,
};
use roque_capi::handle::{
    rq_column_destroy, rq_groupby_spec_destroy, rq_table_destroy, rq_value_destroy,
    rq_value_list_destroy,
};
use roque_capi::params::{rq_params_create, rq_params_destroy, rq_params_set_int64};
use roque_capi::value::{
    rq_value_from_int64, rq_value_from_string, rq_value_int64, rq_value_list_append,
    rq_value_list_append_double, rq_value_list_append_string, rq_value_list_create,
    rq_value_list_extract, rq_value_list_size, rq_value_string_data, rq_value_string_length,
};
use roque_capi::{rq_error, rq_error_kind, rq_table, rq_value_list, rq_value_type};

fn c(s: &str) -> CString {
    CString::new(s).unwrap()
}

/// Assert the slot holds an error, return its message, and clear the slot.
unsafe fn take_error(slot: &mut *mut rq_error) -> (rq_error_kind, String) {
    assert!(!slot.is_null(), "expected an error");
    let kind = unsafe { rq_error_kind_of(*slot) };
    let message = unsafe { CStr::from_ptr(rq_error_message(*slot)) }
        .to_str()
        .unwrap()
        .to_string();
    unsafe { rq_error_destroy(*slot) };
    *slot = ptr::null_mut();
    (kind, message)
}

/// A one-column table of ints `0..n` named `x`, built through the ABI.
unsafe fn int_table(n: i64) -> *mut rq_table {
    let mut err: *mut rq_error = ptr::null_mut();
    unsafe {
        let list = rq_value_list_create(&mut err);
        for i in 0..n {
            let v = rq_value_from_int64(i, &mut err);
            rq_value_list_append(list, v, &mut err);
            rq_value_destroy(v);
        }
        let col = rq_column_create(rq_value_type::RQ_TYPE_INT, list, &mut err);
        rq_value_list_destroy(list);
        let table = rq_table_create(&mut err);
        rq_table_add_column(table, c("x").as_ptr(), col, &mut err);
        rq_column_destroy(col);
        assert!(err.is_null());
        table
    }
}

unsafe fn string_list(items: &[&str]) -> *mut rq_value_list {
    let mut err: *mut rq_error = ptr::null_mut();
    unsafe {
        let list = rq_value_list_create(&mut err);
        for item in items {
            rq_value_list_append_string(list, c(item).as_ptr(), &mut err);
        }
        assert!(err.is_null());
        list
    }
}

#[test]
fn handle_round_trip() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(5);
        assert_eq!(rq_table_num_rows(table, &mut err), 5);
        assert_eq!(rq_table_num_columns(table, &mut err), 1);

        let col = rq_table_extract_column_by_name(table, c("x").as_ptr(), &mut err);
        assert_eq!(rq_column_size(col, &mut err), 5);
        let v = rq_column_extract(col, 3, &mut err);
        assert_eq!(rq_value_int64(v, &mut err), 3);
        assert!(err.is_null());

        rq_value_destroy(v);
        rq_column_destroy(col);
        rq_table_destroy(table);
    }
}

#[test]
fn errors_and_results_are_mutually_exclusive() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();

        // Failure: fallback return plus an error in the slot.
        let rows = rq_table_num_rows(ptr::null(), &mut err);
        assert_eq!(rows, 0);
        let (kind, message) = take_error(&mut err);
        assert_eq!(kind, rq_error_kind::RQ_ERROR_PRECONDITION);
        assert!(message.contains("table is null"));

        // Success with a stale error in the slot: the slot is left alone.
        let _ = rq_table_num_rows(ptr::null(), &mut err);
        let stale = err;
        let table = int_table(2);
        assert_eq!(rq_table_num_rows(table, &mut err), 2);
        assert_eq!(err, stale, "success must not touch the slot");
        let _ = take_error(&mut err);

        // A second failure replaces the slot's content instead of leaking.
        let _ = rq_table_num_rows(ptr::null(), &mut err);
        let _ = rq_table_column_type(table, c("missing").as_ptr(), &mut err);
        let (kind, message) = take_error(&mut err);
        assert_eq!(kind, rq_error_kind::RQ_ERROR_OPERATION);
        assert!(message.contains("missing"));

        rq_table_destroy(table);
    }
}

#[test]
fn null_error_slot_is_tolerated() {
    unsafe {
        let rows = rq_table_num_rows(ptr::null(), ptr::null_mut());
        assert_eq!(rows, 0);
    }
}

#[test]
fn failed_mutation_leaves_table_unchanged() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(3);

        // Length mismatch is rejected before anything is attached.
        let list = rq_value_list_create(&mut err);
        let v = rq_value_from_int64(1, &mut err);
        rq_value_list_append(list, v, &mut err);
        rq_value_destroy(v);
        let short = rq_column_create(rq_value_type::RQ_TYPE_INT, list, &mut err);
        rq_value_list_destroy(list);

        rq_table_add_column(table, c("y").as_ptr(), short, &mut err);
        let _ = take_error(&mut err);
        assert_eq!(rq_table_num_columns(table, &mut err), 1);
        assert!(!rq_table_contains_column(table, c("y").as_ptr(), &mut err));

        rq_column_destroy(short);
        rq_table_destroy(table);
    }
}

#[test]
fn group_by_validates_columns_before_any_work() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(4);
        let spec = rq_groupby_spec_create(&mut err);
        rq_groupby_spec_add_sum(spec, c("nope").as_ptr(), c("total").as_ptr(), &mut err);
        assert!(err.is_null());

        let keys = string_list(&["x"]);
        let out = rq_table_group_by(table, keys, spec, &mut err);
        assert!(out.is_null());
        let (_, message) = take_error(&mut err);
        assert!(message.contains("nope"));

        rq_value_list_destroy(keys);
        rq_groupby_spec_destroy(spec);
        rq_table_destroy(table);
    }
}

#[test]
fn aggregation_last_write_wins_keeps_position() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(4);
        // Constant key so every row lands in one group.
        let v = rq_value_from_int64(7, &mut err);
        rq_table_add_constant_column(table, c("k").as_ptr(), v, &mut err);
        rq_value_destroy(v);

        let spec = rq_groupby_spec_create(&mut err);
        rq_groupby_spec_add_sum(spec, c("x").as_ptr(), c("agg").as_ptr(), &mut err);
        rq_groupby_spec_add_mean(spec, c("x").as_ptr(), c("agg").as_ptr(), &mut err);

        let keys = string_list(&["k"]);
        let out = rq_table_group_by(table, keys, spec, &mut err);
        assert!(err.is_null());
        assert_eq!(rq_table_num_columns(out, &mut err), 2);

        // The surviving aggregation is the mean, not the sum.
        let col = rq_table_extract_column_by_name(out, c("agg").as_ptr(), &mut err);
        let v = rq_column_extract(col, 0, &mut err);
        assert_eq!(
            roque_capi::value::rq_value_double(v, &mut err),
            1.5 // mean of 0..4
        );
        assert!(err.is_null());

        rq_value_destroy(v);
        rq_column_destroy(col);
        rq_table_destroy(out);
        rq_value_list_destroy(keys);
        rq_groupby_spec_destroy(spec);
        rq_table_destroy(table);
    }
}

#[test]
fn quantiles_reject_non_float_levels() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let spec = rq_groupby_spec_create(&mut err);
        let levels = rq_value_list_create(&mut err);
        rq_value_list_append_double(levels, 0.5, &mut err);
        let bad = rq_value_from_int64(1, &mut err);
        rq_value_list_append(levels, bad, &mut err);
        rq_value_destroy(bad);

        rq_groupby_spec_add_quantiles(
            spec,
            c("x").as_ptr(),
            levels,
            c("q").as_ptr(),
            &mut err,
        );
        let (kind, message) = take_error(&mut err);
        assert_eq!(kind, rq_error_kind::RQ_ERROR_VALIDATION);
        assert!(message.contains("Contains a non-float quantile."));

        rq_value_list_destroy(levels);
        rq_groupby_spec_destroy(spec);
    }
}

#[test]
fn unrecognized_reader_option_fails_before_file_io() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let params = rq_params_create(&mut err);
        rq_params_set_int64(params, c("header").as_ptr(), 0, &mut err);
        rq_params_set_int64(params, c("bogus_key").as_ptr(), 1, &mut err);
        assert!(err.is_null());

        // The path does not exist; the validation error proves the options
        // were checked before the file was touched.
        let out = rq_table_read_csv(c("/nonexistent/input.csv").as_ptr(), params, &mut err);
        assert!(out.is_null());
        let (kind, message) = take_error(&mut err);
        assert_eq!(kind, rq_error_kind::RQ_ERROR_VALIDATION);
        assert!(message.contains("bogus_key"));
        assert!(message.contains("delimiter"));
        assert!(message.contains("na_values"));

        rq_params_destroy(params);
    }
}

#[test]
fn csv_round_trip_through_the_boundary() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"a,b\n1,hey\n2,there\n").unwrap();
        file.flush().unwrap();
        let path = c(file.path().to_str().unwrap());

        let table = rq_table_read_csv(path.as_ptr(), ptr::null(), &mut err);
        assert!(err.is_null());
        assert_eq!(rq_table_num_rows(table, &mut err), 2);
        assert_eq!(
            rq_table_column_type(table, c("a").as_ptr(), &mut err),
            rq_value_type::RQ_TYPE_INT
        );

        let col = rq_table_extract_column_by_name(table, c("b").as_ptr(), &mut err);
        let v = rq_column_extract(col, 1, &mut err);
        let len = rq_value_string_length(v, &mut err) as usize;
        let data = rq_value_string_data(v, &mut err);
        let bytes = std::slice::from_raw_parts(data as *const u8, len);
        assert_eq!(bytes, b"there");

        rq_value_destroy(v);
        rq_column_destroy(col);
        rq_table_destroy(table);
    }
}

#[test]
fn unstack_and_stack_invert_each_other() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(4);
        let g = rq_value_from_string(c("all").as_ptr(), &mut err);
        rq_table_add_constant_column(table, c("g").as_ptr(), g, &mut err);
        rq_value_destroy(g);
        assert!(err.is_null());

        let packed = rq_table_unstack(table, c("x").as_ptr(), c("xs").as_ptr(), &mut err);
        assert!(err.is_null());
        assert_eq!(rq_table_num_rows(packed, &mut err), 1);
        assert_eq!(
            rq_table_column_type(packed, c("xs").as_ptr(), &mut err),
            rq_value_type::RQ_TYPE_LIST
        );

        let exploded = rq_table_stack(packed, c("xs").as_ptr(), &mut err);
        assert!(err.is_null());
        assert_eq!(rq_table_num_rows(exploded, &mut err), 4);
        assert!(rq_table_contains_column(exploded, c("xs").as_ptr(), &mut err));

        // A scalar column cannot be stacked; the table stays usable.
        let bad = rq_table_stack(table, c("g").as_ptr(), &mut err);
        assert!(bad.is_null());
        let (_, message) = take_error(&mut err);
        assert!(message.contains("cannot stack"));
        assert_eq!(rq_table_num_rows(table, &mut err), 4);

        rq_table_destroy(exploded);
        rq_table_destroy(packed);
        rq_table_destroy(table);
    }
}

#[test]
fn stack_with_explicit_names_can_drop_missing_cells() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(3);
        let packed = rq_table_unstack(table, c("x").as_ptr(), c("xs").as_ptr(), &mut err);
        // unstack with no remaining key column is rejected up front.
        assert!(packed.is_null());
        let (kind, _) = take_error(&mut err);
        assert_eq!(kind, rq_error_kind::RQ_ERROR_VALIDATION);

        let g = rq_value_from_int64(7, &mut err);
        rq_table_add_constant_column(table, c("g").as_ptr(), g, &mut err);
        rq_value_destroy(g);
        let packed = rq_table_unstack(table, c("x").as_ptr(), c("xs").as_ptr(), &mut err);
        assert!(err.is_null());

        let names = string_list(&["item"]);
        let renamed = rq_table_stack_and_rename(packed, c("xs").as_ptr(), names, true, &mut err);
        rq_value_list_destroy(names);
        assert!(err.is_null());
        assert!(rq_table_contains_column(renamed, c("item").as_ptr(), &mut err));
        assert_eq!(rq_table_num_rows(renamed, &mut err), 3);

        rq_table_destroy(renamed);
        rq_table_destroy(packed);
        rq_table_destroy(table);
    }
}

#[test]
fn row_extraction_and_column_names() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(3);
        let v = rq_value_from_string(c("tag").as_ptr(), &mut err);
        rq_table_add_constant_column(table, c("label").as_ptr(), v, &mut err);
        rq_value_destroy(v);

        let names = rq_table_column_names(table, &mut err);
        assert_eq!(rq_value_list_size(names, &mut err), 2);
        let first = rq_value_list_extract(names, 0, &mut err);
        let len = rq_value_string_length(first, &mut err) as usize;
        let data = rq_value_string_data(first, &mut err);
        assert_eq!(std::slice::from_raw_parts(data as *const u8, len), b"x");
        rq_value_destroy(first);
        rq_value_list_destroy(names);

        let row = rq_table_extract_row(table, 2, &mut err);
        assert_eq!(rq_value_list_size(row, &mut err), 2);
        let cell = rq_value_list_extract(row, 0, &mut err);
        assert_eq!(rq_value_int64(cell, &mut err), 2);
        rq_value_destroy(cell);
        rq_value_list_destroy(row);

        assert!(err.is_null());
        rq_table_destroy(table);
    }
}

// ---------------------------------------------------------------------------
// Callback marshalling
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Counters {
    calls: AtomicUsize,
    releases: AtomicUsize,
}

unsafe extern "C" fn release_counter(context: *mut c_void) {
    let counters = unsafe { &*(context as *const Counters) };
    counters.releases.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C" fn double_cell(
    context: *mut c_void,
    row: *const rq_value_list,
    error_out: *mut *mut rq_error,
) -> *mut roque_capi::rq_value {
    let counters = unsafe { &*(context as *const Counters) };
    counters.calls.fetch_add(1, Ordering::SeqCst);
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let cell = rq_value_list_extract(row, 0, &mut err);
        let n = rq_value_int64(cell, &mut err);
        rq_value_destroy(cell);
        assert!(err.is_null());
        rq_value_from_int64(n * 2, error_out)
    }
}

/// Fails on row value 321 by making a failing boundary call with the
/// caller-provided slot, the way a foreign callback would surface its own
/// error.
unsafe extern "C" fn fail_on_321(
    context: *mut c_void,
    row: *const rq_value_list,
    error_out: *mut *mut rq_error,
) -> *mut roque_capi::rq_value {
    let counters = unsafe { &*(context as *const Counters) };
    counters.calls.fetch_add(1, Ordering::SeqCst);
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let cell = rq_value_list_extract(row, 0, &mut err);
        let n = rq_value_int64(cell, &mut err);
        rq_value_destroy(cell);
        if n == 321 {
            let _ = rq_value_int64(ptr::null(), error_out);
            return ptr::null_mut();
        }
        rq_value_from_int64(n, error_out)
    }
}

unsafe extern "C" fn return_null_silently(
    _context: *mut c_void,
    _row: *const rq_value_list,
    _error_out: *mut *mut rq_error,
) -> *mut roque_capi::rq_value {
    ptr::null_mut()
}

#[test]
fn apply_preserves_positions_and_releases_context_once() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let n = 1000;
        let table = int_table(n);
        let counters = Box::into_raw(Box::new(Counters::default()));

        let col = rq_table_apply(
            table,
            Some(double_cell),
            counters as *mut c_void,
            Some(release_counter),
            rq_value_type::RQ_TYPE_INT,
            &mut err,
        );
        assert!(err.is_null());
        assert_eq!(rq_column_size(col, &mut err), n as u64);
        for idx in [0u64, 499, 999] {
            let v = rq_column_extract(col, idx, &mut err);
            assert_eq!(rq_value_int64(v, &mut err), idx as i64 * 2);
            rq_value_destroy(v);
        }

        let counters = Box::from_raw(counters);
        assert_eq!(counters.calls.load(Ordering::SeqCst), n as usize);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);

        rq_column_destroy(col);
        rq_table_destroy(table);
    }
}

#[test]
fn apply_propagates_callback_error_and_still_releases_once() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(1000);
        let counters = Box::into_raw(Box::new(Counters::default()));

        let col = rq_table_apply(
            table,
            Some(fail_on_321),
            counters as *mut c_void,
            Some(release_counter),
            rq_value_type::RQ_TYPE_INT,
            &mut err,
        );
        assert!(col.is_null());
        let (kind, message) = take_error(&mut err);
        assert_eq!(kind, rq_error_kind::RQ_ERROR_CALLBACK);
        assert!(message.contains("value is null"));

        let counters = Box::from_raw(counters);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);

        rq_table_destroy(table);
    }
}

#[test]
fn apply_reports_null_result_without_error() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(10);

        let col = rq_table_apply(
            table,
            Some(return_null_silently),
            ptr::null_mut(),
            None,
            rq_value_type::RQ_TYPE_INT,
            &mut err,
        );
        assert!(col.is_null());
        let (kind, message) = take_error(&mut err);
        assert_eq!(kind, rq_error_kind::RQ_ERROR_CALLBACK);
        assert!(message.contains("without setting an error"));

        rq_table_destroy(table);
    }
}

#[test]
fn apply_with_null_callback_still_releases_context() {
    unsafe {
        let mut err: *mut rq_error = ptr::null_mut();
        let table = int_table(3);
        let counters = Box::into_raw(Box::new(Counters::default()));

        let col = rq_table_apply(
            table,
            None,
            counters as *mut c_void,
            Some(release_counter),
            rq_value_type::RQ_TYPE_INT,
            &mut err,
        );
        assert!(col.is_null());
        let (kind, _) = take_error(&mut err);
        assert_eq!(kind, rq_error_kind::RQ_ERROR_PRECONDITION);

        let counters = Box::from_raw(counters);
        assert_eq!(counters.calls.load(Ordering::SeqCst), 0);
        assert_eq!(counters.releases.load(Ordering::SeqCst), 1);

        rq_table_destroy(table);
    }
}
