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

//! Typed columns. Cloning a column is an `Arc` bump; mutation goes through
//! copy-on-write.

use std::sync::Arc;

use crate::value::{Value, ValueType};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    dtype: ValueType,
    values: Arc<Vec<Value>>,
}

impl Column {
    pub fn new(dtype: ValueType) -> Column {
        Column {
            dtype,
            values: Arc::new(Vec::new()),
        }
    }

    /// Build a column from raw values, checking each against `dtype`
    /// (`Undefined` cells are always allowed).
    pub fn from_values(dtype: ValueType, values: Vec<Value>) -> Result<Column> {
        for v in &values {
            if !v.is_undefined() && v.value_type() != dtype {
                return Err(Error::Type(format!(
                    "column of type {} contains a {} value",
                    dtype,
                    v.value_type()
                )));
            }
        }
        Ok(Column {
            dtype,
            values: Arc::new(values),
        })
    }

    /// Build a column inferring the dtype from the first defined value.
    pub fn infer(values: Vec<Value>) -> Column {
        let dtype = values
            .iter()
            .find(|v| !v.is_undefined())
            .map(Value::value_type)
            .unwrap_or(ValueType::Undefined);
        Column {
            dtype,
            values: Arc::new(values),
        }
    }

    /// A column of `len` copies of `value`.
    pub fn constant(value: Value, len: usize) -> Column {
        Column {
            dtype: value.value_type(),
            values: Arc::new(vec![value; len]),
        }
    }

    pub fn dtype(&self) -> ValueType {
        self.dtype
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Result<&Value> {
        self.values
            .get(idx)
            .ok_or_else(|| Error::Range(format!("row {idx} out of bounds (len {})", self.len())))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn push(&mut self, value: Value) -> Result<()> {
        if !value.is_undefined() && value.value_type() != self.dtype {
            if self.dtype == ValueType::Undefined {
                self.dtype = value.value_type();
            } else {
                return Err(Error::Type(format!(
                    "cannot append {} to a {} column",
                    value.value_type(),
                    self.dtype
                )));
            }
        }
        Arc::make_mut(&mut self.values).push(value);
        Ok(())
    }

    /// Row subset by indices, preserving the given order.
    pub fn take(&self, indices: &[usize]) -> Result<Column> {
        let mut out = Vec::with_capacity(indices.len());
        for &i in indices {
            out.push(self.get(i)?.clone());
        }
        Ok(Column {
            dtype: self.dtype,
            values: Arc::new(out),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_rejects_mixed_types() {
        let err = Column::from_values(ValueType::Int, vec![Value::Int(1), Value::Float(2.0)]);
        assert!(err.is_err());
    }

    #[test]
    fn undefined_cells_pass_type_check() {
        let col =
            Column::from_values(ValueType::Int, vec![Value::Int(1), Value::Undefined]).unwrap();
        assert_eq!(col.len(), 2);
        assert_eq!(col.dtype(), ValueType::Int);
    }

    #[test]
    fn clone_is_shared_until_push() {
        let mut a = Column::from_values(ValueType::Int, vec![Value::Int(1)]).unwrap();
        let b = a.clone();
        a.push(Value::Int(2)).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 1);
    }
}
