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

//! Tables: ordered named columns of equal length, plus the structural
//! operation catalog (slice, sort, join, pack/unpack, sampling, ...).

use std::collections::{HashMap, HashSet};
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::column::Column;
use crate::group::{AggOp, AggSpec};
use crate::value::{Value, ValueType};
use crate::{Error, Result};

/// Join directions for [`Table::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinHow {
    Inner,
    Left,
    Right,
    Outer,
}

impl JoinHow {
    pub fn parse(s: &str) -> Result<JoinHow> {
        match s {
            "inner" => Ok(JoinHow::Inner),
            "left" => Ok(JoinHow::Left),
            "right" => Ok(JoinHow::Right),
            "outer" => Ok(JoinHow::Outer),
            other => Err(Error::InvalidArgument(format!(
                "unknown join kind {other:?}; expected inner, left, right or outer"
            ))),
        }
    }
}

/// Row-drop policy for [`Table::dropna`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropHow {
    /// Drop the row when any of the inspected cells is undefined.
    Any,
    /// Drop the row only when all inspected cells are undefined.
    All,
}

impl DropHow {
    pub fn parse(s: &str) -> Result<DropHow> {
        match s {
            "any" => Ok(DropHow::Any),
            "all" => Ok(DropHow::All),
            other => Err(Error::InvalidArgument(format!(
                "unknown dropna kind {other:?}; expected any or all"
            ))),
        }
    }
}

/// A columnar table. Cloning shares column storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    cols: Vec<(String, Column)>,
    materialized: bool,
}

impl Default for Table {
    fn default() -> Table {
        Table::new()
    }
}

impl Table {
    pub fn new() -> Table {
        Table {
            cols: Vec::new(),
            materialized: true,
        }
    }

    pub fn from_columns(cols: Vec<(String, Column)>) -> Result<Table> {
        let mut table = Table::new();
        for (name, col) in cols {
            table.add_column(&name, col)?;
        }
        Ok(table)
    }

    pub fn num_rows(&self) -> usize {
        self.cols.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.cols.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.cols.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn column_name(&self, idx: usize) -> Result<&str> {
        self.cols
            .get(idx)
            .map(|(n, _)| n.as_str())
            .ok_or_else(|| Error::Range(format!("column index {idx} out of bounds")))
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.cols.iter().any(|(n, _)| n == name)
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.cols
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        let idx = self.column_index(name)?;
        Ok(&self.cols[idx].1)
    }

    /// Clone out a column by name.
    pub fn select_column(&self, name: &str) -> Result<Column> {
        self.column(name).cloned()
    }

    pub fn column_type(&self, name: &str) -> Result<ValueType> {
        Ok(self.column(name)?.dtype())
    }

    pub fn add_column(&mut self, name: &str, col: Column) -> Result<()> {
        if self.contains_column(name) {
            return Err(Error::DuplicateColumn(name.to_string()));
        }
        if !self.cols.is_empty() && col.len() != self.num_rows() {
            return Err(Error::LengthMismatch {
                got: col.len(),
                want: self.num_rows(),
            });
        }
        self.cols.push((name.to_string(), col));
        Ok(())
    }

    /// Add a column holding `value` in every row.
    pub fn add_constant_column(&mut self, name: &str, value: Value) -> Result<()> {
        let len = if self.cols.is_empty() {
            1
        } else {
            self.num_rows()
        };
        self.add_column(name, Column::constant(value, len))
    }

    /// Add all columns of `other`, left to right.
    pub fn add_columns(&mut self, other: &Table) -> Result<()> {
        for (name, col) in &other.cols {
            self.add_column(name, col.clone())?;
        }
        Ok(())
    }

    /// Add `col` under `name`, replacing an existing column of that name.
    pub fn replace_add_column(&mut self, name: &str, col: Column) -> Result<()> {
        if let Ok(idx) = self.column_index(name) {
            if col.len() != self.num_rows() {
                return Err(Error::LengthMismatch {
                    got: col.len(),
                    want: self.num_rows(),
                });
            }
            self.cols[idx].1 = col;
            Ok(())
        } else {
            self.add_column(name, col)
        }
    }

    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        let idx = self.column_index(name)?;
        self.cols.remove(idx);
        Ok(())
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        if old != new && self.contains_column(new) {
            return Err(Error::DuplicateColumn(new.to_string()));
        }
        let idx = self.column_index(old)?;
        self.cols[idx].0 = new.to_string();
        Ok(())
    }

    pub fn rename_columns(&mut self, mapping: &[(String, String)]) -> Result<()> {
        for (old, new) in mapping {
            self.rename_column(old, new)?;
        }
        Ok(())
    }

    pub fn swap_columns(&mut self, a: &str, b: &str) -> Result<()> {
        let ia = self.column_index(a)?;
        let ib = self.column_index(b)?;
        self.cols.swap(ia, ib);
        Ok(())
    }

    /// The engine is eager, so every table is realized at creation. The flag
    /// exists for callers of the lazy-engine ABI surface.
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn materialize(&mut self) {
        self.materialized = true;
    }

    pub fn extract_row(&self, idx: usize) -> Result<Vec<Value>> {
        if idx >= self.num_rows() {
            return Err(Error::Range(format!(
                "row {idx} out of bounds (len {})",
                self.num_rows()
            )));
        }
        self.cols.iter().map(|(_, c)| Ok(c.get(idx)?.clone())).collect()
    }

    /// Shared row-subset helper behind head/tail/slice/sort/filters.
    fn take(&self, indices: &[usize]) -> Result<Table> {
        let mut cols = Vec::with_capacity(self.cols.len());
        for (name, col) in &self.cols {
            cols.push((name.clone(), col.take(indices)?));
        }
        Ok(Table {
            cols,
            materialized: true,
        })
    }

    pub fn head(&self, n: usize) -> Table {
        let n = n.min(self.num_rows());
        let indices: Vec<usize> = (0..n).collect();
        // indices are in-bounds by construction
        self.take(&indices).unwrap_or_else(|_| Table::new())
    }

    pub fn tail(&self, n: usize) -> Table {
        let rows = self.num_rows();
        let n = n.min(rows);
        let indices: Vec<usize> = (rows - n..rows).collect();
        self.take(&indices).unwrap_or_else(|_| Table::new())
    }

    pub fn slice(&self, start: usize, end: usize) -> Result<Table> {
        self.slice_stride(start, end, 1)
    }

    pub fn slice_stride(&self, start: usize, end: usize, stride: usize) -> Result<Table> {
        if stride == 0 {
            return Err(Error::InvalidArgument("slice stride must be >= 1".into()));
        }
        if start > end || end > self.num_rows() {
            return Err(Error::Range(format!(
                "slice [{start}, {end}) out of bounds (len {})",
                self.num_rows()
            )));
        }
        let indices: Vec<usize> = (start..end).step_by(stride).collect();
        self.take(&indices)
    }

    /// Vertical concatenation. Both tables must have the same column names
    /// in the same order; column types must agree unless one side is all
    /// undefined.
    pub fn append(&self, other: &Table) -> Result<Table> {
        if self.num_columns() != other.num_columns() {
            return Err(Error::InvalidArgument(format!(
                "cannot append a {}-column table to a {}-column table",
                other.num_columns(),
                self.num_columns()
            )));
        }
        let mut cols = Vec::with_capacity(self.cols.len());
        for (name, col) in &self.cols {
            let other_col = other.column(name)?;
            let dtype = match (col.dtype(), other_col.dtype()) {
                (a, b) if a == b => a,
                (ValueType::Undefined, b) => b,
                (a, ValueType::Undefined) => a,
                (a, b) => {
                    return Err(Error::Type(format!(
                        "column {name:?} has type {a} on one side and {b} on the other"
                    )))
                }
            };
            let mut values = col.values().to_vec();
            values.extend_from_slice(other_col.values());
            cols.push((name.clone(), Column::from_values(dtype, values)?));
        }
        Ok(Table {
            cols,
            materialized: true,
        })
    }

    fn row_key(&self, idx: usize, col_indices: &[usize]) -> Result<Vec<Value>> {
        col_indices
            .iter()
            .map(|&c| Ok(self.cols[c].1.get(idx)?.clone()))
            .collect()
    }

    /// Distinct rows, keeping the first occurrence of each.
    pub fn unique(&self) -> Result<Table> {
        let all: Vec<usize> = (0..self.num_columns()).collect();
        let mut seen = HashSet::new();
        let mut keep = Vec::new();
        for row in 0..self.num_rows() {
            if seen.insert(self.row_key(row, &all)?) {
                keep.push(row);
            }
        }
        self.take(&keep)
    }

    pub fn dropna(&self, columns: &[String], how: DropHow) -> Result<Table> {
        let inspect: Vec<usize> = if columns.is_empty() {
            (0..self.num_columns()).collect()
        } else {
            columns
                .iter()
                .map(|c| self.column_index(c))
                .collect::<Result<_>>()?
        };
        let mut keep = Vec::new();
        for row in 0..self.num_rows() {
            let undefined = inspect
                .iter()
                .filter(|&&c| self.cols[c].1.get(row).map(Value::is_undefined).unwrap_or(true))
                .count();
            let drop = match how {
                DropHow::Any => undefined > 0,
                DropHow::All => !inspect.is_empty() && undefined == inspect.len(),
            };
            if !drop {
                keep.push(row);
            }
        }
        self.take(&keep)
    }

    /// Stable sort by one or more key columns, all ascending or all
    /// descending.
    pub fn sort(&self, columns: &[String], ascending: bool) -> Result<Table> {
        let keys: Vec<usize> = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<_>>()?;
        let mut indices: Vec<usize> = (0..self.num_rows()).collect();
        let key_rows: Vec<Vec<Value>> = indices
            .iter()
            .map(|&row| self.row_key(row, &keys))
            .collect::<Result<_>>()?;
        indices.sort_by(|&a, &b| {
            let ord = key_rows[a].cmp(&key_rows[b]);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });
        self.take(&indices)
    }

    /// Top `k` rows by `column`. Descending by default, ascending when
    /// `reverse` is set.
    pub fn topk(&self, column: &str, k: usize, reverse: bool) -> Result<Table> {
        let sorted = self.sort(&[column.to_string()], reverse)?;
        Ok(sorted.head(k))
    }

    /// Keep (or exclude) rows whose `column` cell appears in `values`.
    pub fn filter_by(&self, values: &[Value], column: &str, exclude: bool) -> Result<Table> {
        let idx = self.column_index(column)?;
        let wanted: HashSet<&Value> = values.iter().collect();
        let mut keep = Vec::new();
        for row in 0..self.num_rows() {
            let hit = wanted.contains(self.cols[idx].1.get(row)?);
            if hit != exclude {
                keep.push(row);
            }
        }
        self.take(&keep)
    }

    /// Replace undefined cells of `column` with `value`.
    pub fn fillna(&self, column: &str, value: &Value) -> Result<Table> {
        let idx = self.column_index(column)?;
        let col = &self.cols[idx].1;
        let dtype = if col.dtype() == ValueType::Undefined {
            value.value_type()
        } else {
            col.dtype()
        };
        let filled: Vec<Value> = col
            .iter()
            .map(|v| {
                if v.is_undefined() {
                    value.cast(dtype)
                } else {
                    Ok(v.clone())
                }
            })
            .collect::<Result<_>>()?;
        let mut out = self.clone();
        out.cols[idx].1 = Column::from_values(dtype, filled)?;
        Ok(out)
    }

    /// Bernoulli sample of rows. `fraction` must lie in [0, 1].
    pub fn sample(&self, fraction: f64, seed: u64) -> Result<Table> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidArgument(format!(
                "sample fraction {fraction} not in [0, 1]"
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let keep: Vec<usize> = (0..self.num_rows())
            .filter(|_| rng.gen::<f64>() < fraction)
            .collect();
        self.take(&keep)
    }

    /// One-pass random partition: roughly `fraction` of the rows land in the
    /// first table, the rest in the second.
    pub fn random_split(&self, fraction: f64, seed: u64) -> Result<(Table, Table)> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::InvalidArgument(format!(
                "split fraction {fraction} not in [0, 1]"
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut left = Vec::new();
        let mut right = Vec::new();
        for row in 0..self.num_rows() {
            if rng.gen::<f64>() < fraction {
                left.push(row);
            } else {
                right.push(row);
            }
        }
        Ok((self.take(&left)?, self.take(&right)?))
    }

    /// Hash join on a single key column present in both tables. Clashing
    /// non-key column names from the right side get a `.1` suffix.
    pub fn join(&self, other: &Table, column: &str, how: JoinHow) -> Result<Table> {
        let left_key = self.column_index(column)?;
        let right_key = other.column_index(column)?;

        let mut right_rows: HashMap<&Value, Vec<usize>> = HashMap::new();
        for row in 0..other.num_rows() {
            right_rows
                .entry(other.cols[right_key].1.get(row)?)
                .or_default()
                .push(row);
        }

        // (left row, right row) pairs; None marks the unmatched side.
        let mut pairs: Vec<(Option<usize>, Option<usize>)> = Vec::new();
        let mut right_matched = vec![false; other.num_rows()];
        for row in 0..self.num_rows() {
            let key = self.cols[left_key].1.get(row)?;
            match right_rows.get(key) {
                Some(matches) => {
                    for &r in matches {
                        right_matched[r] = true;
                        pairs.push((Some(row), Some(r)));
                    }
                }
                None => {
                    if matches!(how, JoinHow::Left | JoinHow::Outer) {
                        pairs.push((Some(row), None));
                    }
                }
            }
        }
        if matches!(how, JoinHow::Right | JoinHow::Outer) {
            for (row, matched) in right_matched.iter().enumerate() {
                if !matched {
                    pairs.push((None, Some(row)));
                }
            }
        }

        let mut out = Table::new();
        // Key column first, taken from whichever side is present.
        let mut key_vals = Vec::with_capacity(pairs.len());
        for &(l, r) in &pairs {
            let v = match (l, r) {
                (Some(l), _) => self.cols[left_key].1.get(l)?.clone(),
                (None, Some(r)) => other.cols[right_key].1.get(r)?.clone(),
                (None, None) => Value::Undefined,
            };
            key_vals.push(v);
        }
        out.add_column(column, Column::infer(key_vals))?;

        for (ci, (name, col)) in self.cols.iter().enumerate() {
            if ci == left_key {
                continue;
            }
            let vals: Vec<Value> = pairs
                .iter()
                .map(|&(l, _)| match l {
                    Some(l) => col.get(l).cloned(),
                    None => Ok(Value::Undefined),
                })
                .collect::<Result<_>>()?;
            out.add_column(name, Column::infer(vals))?;
        }
        for (ci, (name, col)) in other.cols.iter().enumerate() {
            if ci == right_key {
                continue;
            }
            let vals: Vec<Value> = pairs
                .iter()
                .map(|&(_, r)| match r {
                    Some(r) => col.get(r).cloned(),
                    None => Ok(Value::Undefined),
                })
                .collect::<Result<_>>()?;
            let out_name = if out.contains_column(name) {
                format!("{name}.1")
            } else {
                name.clone()
            };
            out.add_column(&out_name, Column::infer(vals))?;
        }
        Ok(out)
    }

    /// Collapse `columns` into one list- or dict-typed column named
    /// `new_name`, substituting `na` for undefined cells.
    pub fn pack_columns(
        &self,
        columns: &[String],
        new_name: &str,
        dtype: ValueType,
        na: &Value,
    ) -> Result<Table> {
        if columns.is_empty() {
            return Err(Error::InvalidArgument("no columns to pack".into()));
        }
        if !matches!(dtype, ValueType::List | ValueType::Dict) {
            return Err(Error::Type(format!(
                "pack_columns output type must be list or dict, got {dtype}"
            )));
        }
        let indices: Vec<usize> = columns
            .iter()
            .map(|c| self.column_index(c))
            .collect::<Result<_>>()?;

        let mut packed = Vec::with_capacity(self.num_rows());
        for row in 0..self.num_rows() {
            let cells: Vec<Value> = indices
                .iter()
                .map(|&c| {
                    let v = self.cols[c].1.get(row)?;
                    Ok(if v.is_undefined() { na.clone() } else { v.clone() })
                })
                .collect::<Result<_>>()?;
            let v = match dtype {
                ValueType::List => Value::List(cells),
                _ => Value::Dict(columns.iter().cloned().zip(cells).collect()),
            };
            packed.push(v);
        }

        let mut out = Table::new();
        for (ci, (name, col)) in self.cols.iter().enumerate() {
            if !indices.contains(&ci) {
                out.add_column(name, col.clone())?;
            }
        }
        out.add_column(new_name, Column::from_values(dtype, packed)?)?;
        Ok(out)
    }

    /// Expand a list- or dict-typed column in place. Dict keys become column
    /// names (prefixed with `prefix.` when a prefix is given); list elements
    /// become positional columns.
    pub fn unpack(&self, column: &str, prefix: &str) -> Result<Table> {
        let idx = self.column_index(column)?;
        let col = &self.cols[idx].1;

        let named = |key: &str| {
            if prefix.is_empty() {
                key.to_string()
            } else {
                format!("{prefix}.{key}")
            }
        };

        let unpacked: Vec<(String, Column)> = match col.dtype() {
            ValueType::Dict => {
                // Key order: first appearance across rows.
                let mut keys: Vec<String> = Vec::new();
                for v in col.iter() {
                    if let Value::Dict(pairs) = v {
                        for (k, _) in pairs {
                            if !keys.iter().any(|have| have == k) {
                                keys.push(k.clone());
                            }
                        }
                    }
                }
                keys.iter()
                    .map(|key| {
                        let vals: Vec<Value> = col
                            .iter()
                            .map(|v| match v {
                                Value::Dict(pairs) => pairs
                                    .iter()
                                    .find(|(k, _)| k == key)
                                    .map(|(_, v)| v.clone())
                                    .unwrap_or(Value::Undefined),
                                _ => Value::Undefined,
                            })
                            .collect();
                        (named(key), Column::infer(vals))
                    })
                    .collect()
            }
            ValueType::List => {
                let width = col
                    .iter()
                    .map(|v| match v {
                        Value::List(items) => items.len(),
                        _ => 0,
                    })
                    .max()
                    .unwrap_or(0);
                let base = if prefix.is_empty() { column } else { prefix };
                (0..width)
                    .map(|i| {
                        let vals: Vec<Value> = col
                            .iter()
                            .map(|v| match v {
                                Value::List(items) => {
                                    items.get(i).cloned().unwrap_or(Value::Undefined)
                                }
                                _ => Value::Undefined,
                            })
                            .collect();
                        (format!("{base}.{i}"), Column::infer(vals))
                    })
                    .collect()
            }
            other => {
                return Err(Error::Type(format!(
                    "cannot unpack a column of type {other}"
                )))
            }
        };

        let mut out = Table::new();
        for (ci, (name, c)) in self.cols.iter().enumerate() {
            if ci == idx {
                for (uname, ucol) in &unpacked {
                    out.add_column(uname, ucol.clone())?;
                }
            } else {
                out.add_column(name, c.clone())?;
            }
        }
        Ok(out)
    }

    /// Explode a list- or dict-typed column into one row per element, the
    /// other columns repeating their row's value. `new_names` carries one
    /// name for a list column, two (key, value) for a dict column. A row
    /// whose cell is undefined or empty is dropped when `drop_na` is set
    /// and otherwise yields a single row of undefined cells.
    pub fn stack(&self, column: &str, new_names: &[String], drop_na: bool) -> Result<Table> {
        let idx = self.column_index(column)?;
        let col = &self.cols[idx].1;
        let want = match col.dtype() {
            ValueType::List => 1,
            ValueType::Dict => 2,
            other => {
                return Err(Error::Type(format!(
                    "cannot stack a column of type {other}"
                )))
            }
        };
        if new_names.len() != want {
            return Err(Error::InvalidArgument(format!(
                "stacking a {} column takes {} output name(s), got {}",
                col.dtype(),
                want,
                new_names.len()
            )));
        }

        let mut parents: Vec<usize> = Vec::new();
        let mut stacked: Vec<Vec<Value>> = vec![Vec::new(); want];
        for row in 0..self.num_rows() {
            match col.get(row)? {
                Value::List(items) if !items.is_empty() => {
                    for item in items {
                        parents.push(row);
                        stacked[0].push(item.clone());
                    }
                }
                Value::Dict(pairs) if !pairs.is_empty() => {
                    for (k, v) in pairs {
                        parents.push(row);
                        stacked[0].push(Value::Str(k.clone()));
                        stacked[1].push(v.clone());
                    }
                }
                _ => {
                    if !drop_na {
                        parents.push(row);
                        for out in &mut stacked {
                            out.push(Value::Undefined);
                        }
                    }
                }
            }
        }

        let mut out = Table::new();
        for (ci, (name, c)) in self.cols.iter().enumerate() {
            if ci == idx {
                for (new_name, vals) in new_names.iter().zip(std::mem::take(&mut stacked)) {
                    out.add_column(new_name, Column::infer(vals))?;
                }
            } else {
                out.add_column(name, c.take(&parents)?)?;
            }
        }
        Ok(out)
    }

    /// Inverse of [`Table::stack`]: group by every column not named in
    /// `columns` and collect the named ones back into a per-group list (one
    /// column) or dict (key and value columns) called `new_name`.
    pub fn unstack(&self, columns: &[String], new_name: &str) -> Result<Table> {
        let op = match columns {
            [c] => AggOp::Concat(c.clone()),
            [k, v] => AggOp::ConcatPairs(k.clone(), v.clone()),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "unstack takes one or two columns, got {}",
                    columns.len()
                )))
            }
        };
        let keys: Vec<String> = self
            .cols
            .iter()
            .map(|(n, _)| n.clone())
            .filter(|n| !columns.contains(n))
            .collect();
        if keys.is_empty() {
            return Err(Error::InvalidArgument(
                "unstack requires at least one remaining key column".into(),
            ));
        }
        let mut spec = AggSpec::new();
        spec.insert(new_name, op);
        self.groupby(&keys, &spec)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW_ROWS: usize = 10;
        writeln!(f, "{}", self.column_names().join("\t"))?;
        for row in 0..self.num_rows().min(PREVIEW_ROWS) {
            let cells: Vec<String> = self
                .cols
                .iter()
                .map(|(_, c)| c.get(row).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            writeln!(f, "{}", cells.join("\t"))?;
        }
        write!(
            f,
            "[{} rows x {} columns]",
            self.num_rows(),
            self.num_columns()
        )
    }
}
