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

//! Keyed parameter bags for reader options. Entries are validated per key
//! when the bag is consumed; an unrecognized key fails the whole call and the
//! message enumerates every accepted key so the caller can diagnose typos.

use std::ffi::c_char;

use roque::{CsvConfig, Value, ValueType};

use crate::error::{check_not_null, rq_error, BoundaryError};
use crate::handle::rq_value_list;
use crate::shell::call_shell;
use crate::value::{cstr_arg, rq_value_type};

#[derive(Debug, Clone)]
pub(crate) enum ParamValue {
    Int(i64),
    Str(String),
    StrList(Vec<String>),
    FloatList(Vec<f64>),
    TypeHint(String, ValueType),
}

/// Ordered key/value bag. Re-setting a key appends; consumption reads the
/// last occurrence, except type hints which accumulate.
#[allow(non_camel_case_types)]
#[derive(Default)]
pub struct rq_params {
    pub(crate) entries: Vec<(String, ParamValue)>,
}

#[no_mangle]
pub unsafe extern "C" fn rq_params_create(error_out: *mut *mut rq_error) -> *mut rq_params {
    call_shell(error_out, std::ptr::null_mut(), || {
        Ok(Box::into_raw(Box::new(rq_params::default())))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_params_destroy(params: *mut rq_params) {
    if !params.is_null() {
        drop(unsafe { Box::from_raw(params) });
    }
}

#[no_mangle]
pub unsafe extern "C" fn rq_params_set_int64(
    params: *mut rq_params,
    key: *const c_char,
    value: i64,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(params, "params");
        let key = unsafe { cstr_arg(key, "key") }?;
        unsafe { &mut (*params).entries }.push((key.to_string(), ParamValue::Int(value)));
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_params_set_string(
    params: *mut rq_params,
    key: *const c_char,
    value: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(params, "params");
        let key = unsafe { cstr_arg(key, "key") }?;
        let value = unsafe { cstr_arg(value, "value") }?;
        unsafe { &mut (*params).entries }
            .push((key.to_string(), ParamValue::Str(value.to_string())));
        Ok(())
    })
}

/// Set a list-valued option. The list must be homogeneous: all strings or
/// all floats.
#[no_mangle]
pub unsafe extern "C" fn rq_params_set_list(
    params: *mut rq_params,
    key: *const c_char,
    value: *const rq_value_list,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(params, "params");
        check_not_null!(value, "value");
        let key = unsafe { cstr_arg(key, "key") }?;
        let values = unsafe { &(*value).values };
        let entry = if values.iter().all(|v| matches!(v, Value::Str(_))) {
            ParamValue::StrList(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Str(s) => s.clone(),
                        _ => unreachable!(),
                    })
                    .collect(),
            )
        } else if values.iter().all(|v| matches!(v, Value::Float(_))) {
            ParamValue::FloatList(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Float(f) => *f,
                        _ => unreachable!(),
                    })
                    .collect(),
            )
        } else {
            return Err(BoundaryError::validation(format!(
                "Invalid input to {key} optional parameter: requires a list of strings or a \
                 list of floats"
            )));
        };
        unsafe { &mut (*params).entries }.push((key.to_string(), entry));
        Ok(())
    })
}

/// Record a column type hint for delimited-text parsing. Hints accumulate;
/// setting the same column twice keeps the later hint.
#[no_mangle]
pub unsafe extern "C" fn rq_params_set_type_hint(
    params: *mut rq_params,
    column: *const c_char,
    dtype: rq_value_type,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(params, "params");
        let column = unsafe { cstr_arg(column, "column") }?;
        unsafe { &mut (*params).entries }.push((
            "column_type_hints".to_string(),
            ParamValue::TypeHint(column.to_string(), dtype.to_engine()),
        ));
        Ok(())
    })
}

const ACCEPTED_KEYS: &[&str] = &[
    "header",
    "delimiter",
    "comment_char",
    "escape_char",
    "quote_char",
    "error_bad_lines",
    "double_quote",
    "skip_initial_space",
    "column_type_hints",
    "na_values",
    "line_terminator",
    "usecols",
    "nrows",
    "skiprows",
    "verbose",
];

fn bool_param(key: &str, value: &ParamValue) -> Result<bool, BoundaryError> {
    match value {
        ParamValue::Int(0) => Ok(false),
        ParamValue::Int(1) => Ok(true),
        _ => Err(BoundaryError::validation(format!(
            "Invalid input to {key} optional parameter: requires 0 or 1"
        ))),
    }
}

fn string_param(key: &str, value: &ParamValue) -> Result<String, BoundaryError> {
    match value {
        ParamValue::Str(s) => Ok(s.clone()),
        _ => Err(BoundaryError::validation(format!(
            "Invalid input to {key} optional parameter: requires a string"
        ))),
    }
}

fn count_param(key: &str, value: &ParamValue) -> Result<usize, BoundaryError> {
    match value {
        ParamValue::Int(n) if *n >= 0 => Ok(*n as usize),
        _ => Err(BoundaryError::validation(format!(
            "Invalid input to {key} optional parameter: requires a non-negative integer"
        ))),
    }
}

fn string_list_param(key: &str, value: &ParamValue) -> Result<Vec<String>, BoundaryError> {
    match value {
        ParamValue::StrList(items) => Ok(items.clone()),
        _ => Err(BoundaryError::validation(format!(
            "Invalid input to {key} optional parameter: requires a list of strings"
        ))),
    }
}

impl rq_params {
    /// Validate every entry and produce the reader configuration. Later
    /// occurrences of a key win; type hints accumulate. Keys outside the
    /// accepted set fail the call, with every offender named in one message.
    pub(crate) fn to_csv_config(&self) -> Result<CsvConfig, BoundaryError> {
        let mut config = CsvConfig::default();
        let mut hints: Vec<(String, ValueType)> = Vec::new();
        let mut residual: Vec<&str> = Vec::new();

        for (key, value) in &self.entries {
            match key.as_str() {
                "header" => config.header = Some(bool_param(key, value)?),
                "error_bad_lines" => config.error_bad_lines = Some(bool_param(key, value)?),
                "double_quote" => config.double_quote = Some(bool_param(key, value)?),
                "skip_initial_space" => config.skip_initial_space = Some(bool_param(key, value)?),
                "verbose" => config.verbose = Some(bool_param(key, value)?),
                "delimiter" => config.delimiter = Some(string_param(key, value)?),
                "comment_char" => config.comment_char = Some(string_param(key, value)?),
                "escape_char" => config.escape_char = Some(string_param(key, value)?),
                "quote_char" => config.quote_char = Some(string_param(key, value)?),
                "line_terminator" => config.line_terminator = Some(string_param(key, value)?),
                "nrows" => config.nrows = Some(count_param(key, value)?),
                "skiprows" => config.skiprows = Some(count_param(key, value)?),
                "na_values" => config.na_values = Some(string_list_param(key, value)?),
                "usecols" => config.usecols = Some(string_list_param(key, value)?),
                "column_type_hints" => match value {
                    ParamValue::TypeHint(column, dtype) => {
                        match hints.iter_mut().find(|(c, _)| c == column) {
                            Some((_, slot)) => *slot = *dtype,
                            None => hints.push((column.clone(), *dtype)),
                        }
                    }
                    _ => {
                        return Err(BoundaryError::validation(
                            "Invalid input to column_type_hints optional parameter: requires \
                             per-column type hints",
                        ))
                    }
                },
                other => {
                    if !residual.contains(&other) {
                        residual.push(other);
                    }
                }
            }
        }
        if !residual.is_empty() {
            return Err(BoundaryError::validation(format!(
                "Unrecognized parameters {}; accepted parameters are: {}",
                residual.join(", "),
                ACCEPTED_KEYS.join(", ")
            )));
        }
        if !hints.is_empty() {
            config.column_type_hints = Some(hints);
        }
        Ok(config)
    }
}
