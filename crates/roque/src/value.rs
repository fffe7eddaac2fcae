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

//! Flexible cell values and their type tags.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A single cell value. Cloning is cheap for scalars and proportional to
/// length for lists and dicts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Missing / not-applicable.
    Undefined,
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    /// Ordered key-value pairs. Keys are strings; duplicate keys are allowed
    /// at this level and resolved by consumers (first wins on unpack).
    Dict(Vec<(String, Value)>),
}

/// Type tag for a [`Value`] or a column. `Undefined` doubles as the fallback
/// sentinel returned across the boundary on failed type queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Undefined,
    Int,
    Float,
    Str,
    List,
    Dict,
}

impl ValueType {
    /// Parse a type-name string as used in CSV column type hints.
    pub fn parse(name: &str) -> Result<ValueType> {
        match name {
            "int" | "integer" => Ok(ValueType::Int),
            "float" | "double" => Ok(ValueType::Float),
            "str" | "string" => Ok(ValueType::Str),
            "list" => Ok(ValueType::List),
            "dict" => Ok(ValueType::Dict),
            "undefined" => Ok(ValueType::Undefined),
            other => Err(Error::Type(format!("unknown type name {other:?}"))),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueType::Undefined => "undefined",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Str => "str",
            ValueType::List => "list",
            ValueType::Dict => "dict",
        };
        f.write_str(s)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Undefined => ValueType::Undefined,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Str(_) => ValueType::Str,
            Value::List(_) => ValueType::List,
            Value::Dict(_) => ValueType::Dict,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Numeric view, widening ints. `None` for everything non-numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Coerce to the given column type, if the representation allows it.
    pub fn cast(&self, ty: ValueType) -> Result<Value> {
        if self.is_undefined() || self.value_type() == ty {
            return Ok(self.clone());
        }
        match (self, ty) {
            (Value::Int(i), ValueType::Float) => Ok(Value::Float(*i as f64)),
            (Value::Float(f), ValueType::Int) => Ok(Value::Int(*f as i64)),
            (v, ValueType::Str) => Ok(Value::Str(v.to_string())),
            (Value::Str(s), ValueType::Int) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| Error::Type(format!("cannot parse {s:?} as int"))),
            (Value::Str(s), ValueType::Float) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| Error::Type(format!("cannot parse {s:?} as float"))),
            (v, ty) => Err(Error::Type(format!(
                "cannot cast {} to {}",
                v.value_type(),
                ty
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => Ok(()),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Dict(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// Equality and hashing treat floats by bit pattern so values can key hash
// maps (group-by, unique, count-distinct). Int and Float never compare equal
// here even when numerically equal; ordering below is the numeric view.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Undefined => {}
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::Dict(pairs) => pairs.hash(state),
        }
    }
}

// Total order used by sort and top-k: Undefined < numbers < strings < lists
// < dicts. Ints and floats compare numerically across the two variants.
impl Ord for Value {
    fn cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Undefined => 0,
                Value::Int(_) | Value::Float(_) => 1,
                Value::Str(_) => 2,
                Value::List(_) => 3,
                Value::Dict(_) => 4,
            }
        }
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Dict(a), Value::Dict(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => rank(a).cmp(&rank(b)),
            },
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_order_across_variants() {
        assert!(Value::Int(1) < Value::Float(1.5));
        assert!(Value::Float(2.0) < Value::Int(3));
        assert!(Value::Undefined < Value::Int(i64::MIN));
        assert!(Value::Int(9) < Value::Str("a".into()));
    }

    #[test]
    fn cast_round_trips() {
        assert_eq!(
            Value::Str("42".into()).cast(ValueType::Int).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            Value::Int(2).cast(ValueType::Float).unwrap(),
            Value::Float(2.0)
        );
        assert!(Value::Str("x".into()).cast(ValueType::Int).is_err());
    }

    #[test]
    fn type_names_parse() {
        assert_eq!(ValueType::parse("int").unwrap(), ValueType::Int);
        assert_eq!(ValueType::parse("string").unwrap(), ValueType::Str);
        assert!(ValueType::parse("bogus").is_err());
    }
}
