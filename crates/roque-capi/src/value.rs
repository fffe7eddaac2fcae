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

//! Cell values and value lists across the boundary. Constructors return
//! owned handles; accessors either copy out (scalars, extracted elements) or
//! borrow (string bytes, valid only while the handle lives).

use std::ffi::{c_char, CStr};

use roque::{Value, ValueType};

use crate::error::{check_not_null, rq_error, BoundaryError};
use crate::handle::{rq_value, rq_value_list, wrap_value, wrap_value_list};
use crate::shell::call_shell;

/// ABI-stable type tag. `RQ_TYPE_UNDEFINED` doubles as the fallback returned
/// by type queries on failure.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum rq_value_type {
    RQ_TYPE_INT = 0,
    RQ_TYPE_FLOAT = 1,
    RQ_TYPE_STR = 2,
    RQ_TYPE_LIST = 3,
    RQ_TYPE_DICT = 4,
    RQ_TYPE_UNDEFINED = 5,
}

impl rq_value_type {
    pub(crate) fn to_engine(self) -> ValueType {
        match self {
            rq_value_type::RQ_TYPE_INT => ValueType::Int,
            rq_value_type::RQ_TYPE_FLOAT => ValueType::Float,
            rq_value_type::RQ_TYPE_STR => ValueType::Str,
            rq_value_type::RQ_TYPE_LIST => ValueType::List,
            rq_value_type::RQ_TYPE_DICT => ValueType::Dict,
            rq_value_type::RQ_TYPE_UNDEFINED => ValueType::Undefined,
        }
    }

    pub(crate) fn from_engine(ty: ValueType) -> rq_value_type {
        match ty {
            ValueType::Int => rq_value_type::RQ_TYPE_INT,
            ValueType::Float => rq_value_type::RQ_TYPE_FLOAT,
            ValueType::Str => rq_value_type::RQ_TYPE_STR,
            ValueType::List => rq_value_type::RQ_TYPE_LIST,
            ValueType::Dict => rq_value_type::RQ_TYPE_DICT,
            ValueType::Undefined => rq_value_type::RQ_TYPE_UNDEFINED,
        }
    }
}

/// Read a required C-string argument.
pub(crate) unsafe fn cstr_arg<'a>(
    ptr: *const c_char,
    name: &str,
) -> Result<&'a str, BoundaryError> {
    if ptr.is_null() {
        return Err(BoundaryError::precondition(format!("{name} is null")));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| BoundaryError::validation(format!("{name} is not valid UTF-8")))
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn rq_value_from_int64(
    value: i64,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        Ok(wrap_value(Value::Int(value)))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_from_double(
    value: f64,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        Ok(wrap_value(Value::Float(value)))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_from_string(
    value: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        let s = unsafe { cstr_arg(value, "value") }?;
        Ok(wrap_value(Value::Str(s.to_string())))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_undefined(error_out: *mut *mut rq_error) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        Ok(wrap_value(Value::Undefined))
    })
}

/// Build a list-typed value by copying the elements of a value list.
#[no_mangle]
pub unsafe extern "C" fn rq_value_from_list(
    list: *const rq_value_list,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(list, "list");
        let values = unsafe { &(*list).values };
        Ok(wrap_value(Value::List(values.clone())))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_dict_create(error_out: *mut *mut rq_error) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        Ok(wrap_value(Value::Dict(Vec::new())))
    })
}

/// Insert a copy of `value` under `key`, replacing an existing entry.
#[no_mangle]
pub unsafe extern "C" fn rq_value_dict_insert(
    dict: *mut rq_value,
    key: *const c_char,
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(dict, "dict");
        check_not_null!(value, "value");
        let key = unsafe { cstr_arg(key, "key") }?;
        let value = unsafe { &(*value).value }.clone();
        match unsafe { &mut (*dict).value } {
            Value::Dict(entries) => {
                match entries.iter_mut().find(|(k, _)| k == key) {
                    Some((_, slot)) => *slot = value,
                    None => entries.push((key.to_string(), value)),
                }
                Ok(())
            }
            _ => Err(BoundaryError::validation("value is not a dict")),
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_dict_size(
    dict: *const rq_value,
    error_out: *mut *mut rq_error,
) -> u64 {
    call_shell(error_out, 0, || {
        check_not_null!(dict, "dict");
        match unsafe { &(*dict).value } {
            Value::Dict(entries) => Ok(entries.len() as u64),
            _ => Err(BoundaryError::validation("value is not a dict")),
        }
    })
}

/// Owned copy of the entry under `key`.
#[no_mangle]
pub unsafe extern "C" fn rq_value_dict_get(
    dict: *const rq_value,
    key: *const c_char,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(dict, "dict");
        let key = unsafe { cstr_arg(key, "key") }?;
        match unsafe { &(*dict).value } {
            Value::Dict(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| wrap_value(v.clone()))
                .ok_or_else(|| BoundaryError::operation(format!("key {key:?} not found"))),
            _ => Err(BoundaryError::validation("value is not a dict")),
        }
    })
}

// ---------------------------------------------------------------------------
// Accessors
// ---------------------------------------------------------------------------

/// Type tag of the value, `RQ_TYPE_UNDEFINED` on a null handle.
#[no_mangle]
pub unsafe extern "C" fn rq_value_type_of(
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) -> rq_value_type {
    call_shell(error_out, rq_value_type::RQ_TYPE_UNDEFINED, || {
        check_not_null!(value, "value");
        Ok(rq_value_type::from_engine(
            unsafe { &(*value).value }.value_type(),
        ))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_int64(
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) -> i64 {
    call_shell(error_out, 0, || {
        check_not_null!(value, "value");
        match unsafe { &(*value).value } {
            Value::Int(i) => Ok(*i),
            other => Err(BoundaryError::validation(format!(
                "value is {}, not int",
                other.value_type()
            ))),
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_double(
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) -> f64 {
    call_shell(error_out, 0.0, || {
        check_not_null!(value, "value");
        match unsafe { &(*value).value } {
            Value::Float(f) => Ok(*f),
            other => Err(BoundaryError::validation(format!(
                "value is {}, not float",
                other.value_type()
            ))),
        }
    })
}

/// Pointer to the string's bytes. NOT NUL-terminated; pair with
/// [`rq_value_string_length`]. Borrowed from the handle.
#[no_mangle]
pub unsafe extern "C" fn rq_value_string_data(
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) -> *const c_char {
    call_shell(error_out, std::ptr::null(), || {
        check_not_null!(value, "value");
        match unsafe { &(*value).value } {
            Value::Str(s) => Ok(s.as_ptr() as *const c_char),
            other => Err(BoundaryError::validation(format!(
                "value is {}, not string",
                other.value_type()
            ))),
        }
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_string_length(
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) -> u64 {
    call_shell(error_out, 0, || {
        check_not_null!(value, "value");
        match unsafe { &(*value).value } {
            Value::Str(s) => Ok(s.len() as u64),
            other => Err(BoundaryError::validation(format!(
                "value is {}, not string",
                other.value_type()
            ))),
        }
    })
}

// ---------------------------------------------------------------------------
// Value lists
// ---------------------------------------------------------------------------

#[no_mangle]
pub unsafe extern "C" fn rq_value_list_create(error_out: *mut *mut rq_error) -> *mut rq_value_list {
    call_shell(error_out, std::ptr::null_mut(), || {
        Ok(wrap_value_list(Vec::new()))
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_list_size(
    list: *const rq_value_list,
    error_out: *mut *mut rq_error,
) -> u64 {
    call_shell(error_out, 0, || {
        check_not_null!(list, "list");
        Ok(unsafe { &(*list).values }.len() as u64)
    })
}

/// Append a copy of `value`.
#[no_mangle]
pub unsafe extern "C" fn rq_value_list_append(
    list: *mut rq_value_list,
    value: *const rq_value,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(list, "list");
        check_not_null!(value, "value");
        let value = unsafe { &(*value).value }.clone();
        unsafe { &mut (*list).values }.push(value);
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_list_append_string(
    list: *mut rq_value_list,
    value: *const c_char,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(list, "list");
        let s = unsafe { cstr_arg(value, "value") }?;
        unsafe { &mut (*list).values }.push(Value::Str(s.to_string()));
        Ok(())
    })
}

#[no_mangle]
pub unsafe extern "C" fn rq_value_list_append_double(
    list: *mut rq_value_list,
    value: f64,
    error_out: *mut *mut rq_error,
) {
    call_shell(error_out, (), || {
        check_not_null!(list, "list");
        unsafe { &mut (*list).values }.push(Value::Float(value));
        Ok(())
    })
}

/// Owned copy of the element at `index`.
#[no_mangle]
pub unsafe extern "C" fn rq_value_list_extract(
    list: *const rq_value_list,
    index: u64,
    error_out: *mut *mut rq_error,
) -> *mut rq_value {
    call_shell(error_out, std::ptr::null_mut(), || {
        check_not_null!(list, "list");
        let values = unsafe { &(*list).values };
        values
            .get(index as usize)
            .map(|v| wrap_value(v.clone()))
            .ok_or_else(|| {
                BoundaryError::validation(format!(
                    "index {index} out of range for list of {}",
                    values.len()
                ))
            })
    })
}
