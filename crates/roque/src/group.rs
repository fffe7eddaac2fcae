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

//! Group-by: aggregation descriptors and their evaluation.

use std::collections::{HashMap, HashSet};

use crate::column::Column;
use crate::table::Table;
use crate::value::Value;
use crate::{Error, Result};

/// One aggregation over a group's rows. Source columns are named; `Count`
/// takes none, `ConcatPairs`/`Argmax`/`Argmin` take two.
#[derive(Debug, Clone, PartialEq)]
pub enum AggOp {
    Count,
    Sum(String),
    Mean(String),
    Min(String),
    Max(String),
    Variance(String),
    Stdev(String),
    SelectOne(String),
    CountDistinct(String),
    /// Collect the group's values into a list.
    Concat(String),
    /// Collect `(key column, value column)` pairs into a dict.
    ConcatPairs(String, String),
    /// One or more quantile levels in [0, 1]. A single level yields a float;
    /// several yield a list.
    Quantile(String, Vec<f64>),
    /// Value of the second column at the row where the first is maximal.
    Argmax(String, String),
    Argmin(String, String),
}

/// Mapping from destination-column name to aggregation, in insertion order.
/// Re-inserting a destination overwrites the aggregation but keeps the
/// original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggSpec {
    entries: Vec<(String, AggOp)>,
}

impl AggSpec {
    pub fn new() -> AggSpec {
        AggSpec::default()
    }

    pub fn insert(&mut self, dest: &str, op: AggOp) {
        match self.entries.iter_mut().find(|(name, _)| name == dest) {
            Some((_, slot)) => *slot = op,
            None => self.entries.push((dest.to_string(), op)),
        }
    }

    pub fn entries(&self) -> &[(String, AggOp)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AggOp {
    fn source(&self) -> Option<&str> {
        match self {
            AggOp::Count => None,
            AggOp::Sum(c)
            | AggOp::Mean(c)
            | AggOp::Min(c)
            | AggOp::Max(c)
            | AggOp::Variance(c)
            | AggOp::Stdev(c)
            | AggOp::SelectOne(c)
            | AggOp::CountDistinct(c)
            | AggOp::Concat(c)
            | AggOp::Quantile(c, _) => Some(c),
            AggOp::ConcatPairs(c, _) | AggOp::Argmax(c, _) | AggOp::Argmin(c, _) => Some(c),
        }
    }

    fn second_source(&self) -> Option<&str> {
        match self {
            AggOp::ConcatPairs(_, c) | AggOp::Argmax(_, c) | AggOp::Argmin(_, c) => Some(c),
            _ => None,
        }
    }

    /// Evaluate over the rows of one group.
    fn evaluate(&self, table: &Table, rows: &[usize]) -> Result<Value> {
        let cells = |name: &str| -> Result<Vec<Value>> {
            let col = table.column(name)?;
            rows.iter().map(|&r| col.get(r).cloned()).collect()
        };
        // Defined numeric view; undefined cells are skipped, as groupby
        // aggregates treat missing values.
        let numbers = |name: &str| -> Result<Vec<f64>> {
            Ok(cells(name)?.iter().filter_map(Value::as_f64).collect())
        };

        match self {
            AggOp::Count => Ok(Value::Int(rows.len() as i64)),
            AggOp::Sum(c) => {
                let vals = cells(c)?;
                if vals
                    .iter()
                    .all(|v| v.is_undefined() || matches!(v, Value::Int(_)))
                {
                    Ok(Value::Int(vals.iter().filter_map(Value::as_i64).sum()))
                } else {
                    Ok(Value::Float(
                        vals.iter().filter_map(Value::as_f64).sum::<f64>(),
                    ))
                }
            }
            AggOp::Mean(c) => {
                let nums = numbers(c)?;
                if nums.is_empty() {
                    Ok(Value::Undefined)
                } else {
                    Ok(Value::Float(nums.iter().sum::<f64>() / nums.len() as f64))
                }
            }
            AggOp::Min(c) => Ok(defined(cells(c)?).into_iter().min().unwrap_or(Value::Undefined)),
            AggOp::Max(c) => Ok(defined(cells(c)?).into_iter().max().unwrap_or(Value::Undefined)),
            AggOp::Variance(c) => Ok(variance(&numbers(c)?).map(Value::Float).unwrap_or(Value::Undefined)),
            AggOp::Stdev(c) => Ok(variance(&numbers(c)?)
                .map(|v| Value::Float(v.sqrt()))
                .unwrap_or(Value::Undefined)),
            AggOp::SelectOne(c) => Ok(cells(c)?.into_iter().next().unwrap_or(Value::Undefined)),
            AggOp::CountDistinct(c) => {
                let distinct: HashSet<Value> = cells(c)?.into_iter().collect();
                Ok(Value::Int(distinct.len() as i64))
            }
            AggOp::Concat(c) => Ok(Value::List(defined(cells(c)?))),
            AggOp::ConcatPairs(k, v) => {
                let keys = cells(k)?;
                let vals = cells(v)?;
                let pairs = keys
                    .into_iter()
                    .zip(vals)
                    .filter(|(k, _)| !k.is_undefined())
                    .map(|(k, v)| (k.to_string(), v))
                    .collect();
                Ok(Value::Dict(pairs))
            }
            AggOp::Quantile(c, levels) => {
                let mut nums = numbers(c)?;
                nums.sort_by(|a, b| a.total_cmp(b));
                if nums.is_empty() {
                    return Ok(Value::Undefined);
                }
                let pick = |q: f64| -> Value {
                    let pos = (q.clamp(0.0, 1.0) * (nums.len() - 1) as f64).round() as usize;
                    Value::Float(nums[pos])
                };
                if levels.len() == 1 {
                    Ok(pick(levels[0]))
                } else {
                    Ok(Value::List(levels.iter().map(|&q| pick(q)).collect()))
                }
            }
            AggOp::Argmax(agg, out) | AggOp::Argmin(agg, out) => {
                let keys = cells(agg)?;
                let best = keys
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_undefined())
                    .max_by(|(_, a), (_, b)| {
                        let ord = a.cmp(b);
                        if matches!(self, AggOp::Argmin(..)) {
                            ord.reverse()
                        } else {
                            ord
                        }
                    })
                    .map(|(i, _)| i);
                match best {
                    Some(i) => Ok(table.column(out)?.get(rows[i])?.clone()),
                    None => Ok(Value::Undefined),
                }
            }
        }
    }
}

fn defined(values: Vec<Value>) -> Vec<Value> {
    values.into_iter().filter(|v| !v.is_undefined()).collect()
}

/// Sample variance over defined numeric cells; `None` for groups with fewer
/// than two of them.
fn variance(nums: &[f64]) -> Option<f64> {
    if nums.len() < 2 {
        return None;
    }
    let mean = nums.iter().sum::<f64>() / nums.len() as f64;
    let ss = nums.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
    Some(ss / (nums.len() - 1) as f64)
}

impl Table {
    /// Group by `keys` and evaluate every aggregation of `spec`. Output
    /// columns: the keys (group order is first-appearance order), then one
    /// column per spec entry in insertion order.
    pub fn groupby(&self, keys: &[String], spec: &AggSpec) -> Result<Table> {
        if keys.is_empty() {
            return Err(Error::InvalidArgument("groupby requires at least one key".into()));
        }
        // Validate every referenced column up front, before grouping work.
        for key in keys {
            self.column(key)?;
        }
        for (_, op) in spec.entries() {
            if let Some(c) = op.source() {
                self.column(c)?;
            }
            if let Some(c) = op.second_source() {
                self.column(c)?;
            }
        }

        let key_cols: Vec<&Column> = keys
            .iter()
            .map(|k| self.column(k))
            .collect::<Result<_>>()?;
        let mut order: Vec<Vec<Value>> = Vec::new();
        let mut groups: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
        for row in 0..self.num_rows() {
            let key: Vec<Value> = key_cols
                .iter()
                .map(|c| c.get(row).cloned())
                .collect::<Result<_>>()?;
            match groups.get_mut(&key) {
                Some(rows) => rows.push(row),
                None => {
                    order.push(key.clone());
                    groups.insert(key, vec![row]);
                }
            }
        }

        let mut out = Table::new();
        for (i, key) in keys.iter().enumerate() {
            let vals: Vec<Value> = order.iter().map(|k| k[i].clone()).collect();
            out.add_column(key, Column::infer(vals))?;
        }
        for (dest, op) in spec.entries() {
            let vals: Vec<Value> = order
                .iter()
                .map(|k| op.evaluate(self, &groups[k]))
                .collect::<Result<_>>()?;
            out.add_column(dest, Column::infer(vals))?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    fn table() -> Table {
        let mut t = Table::new();
        t.add_column(
            "k",
            Column::from_values(
                ValueType::Str,
                ["a", "a", "b", "b", "b"]
                    .iter()
                    .map(|s| Value::Str(s.to_string()))
                    .collect(),
            )
            .unwrap(),
        )
        .unwrap();
        t.add_column(
            "x",
            Column::from_values(
                ValueType::Int,
                vec![
                    Value::Int(1),
                    Value::Int(3),
                    Value::Int(10),
                    Value::Int(20),
                    Value::Undefined,
                ],
            )
            .unwrap(),
        )
        .unwrap();
        t
    }

    #[test]
    fn groupby_count_sum_mean() {
        let mut spec = AggSpec::new();
        spec.insert("n", AggOp::Count);
        spec.insert("total", AggOp::Sum("x".into()));
        spec.insert("avg", AggOp::Mean("x".into()));
        let out = table().groupby(&["k".to_string()], &spec).unwrap();

        assert_eq!(out.column_names(), vec!["k", "n", "total", "avg"]);
        assert_eq!(out.num_rows(), 2);
        // groups appear in first-seen order
        assert_eq!(out.extract_row(0).unwrap()[0], Value::Str("a".into()));
        assert_eq!(out.extract_row(0).unwrap()[1], Value::Int(2));
        assert_eq!(out.extract_row(0).unwrap()[2], Value::Int(4));
        assert_eq!(out.extract_row(1).unwrap()[2], Value::Int(30));
        // mean skips the undefined cell
        assert_eq!(out.extract_row(1).unwrap()[3], Value::Float(15.0));
    }

    #[test]
    fn insert_overwrites_destination_in_place() {
        let mut spec = AggSpec::new();
        spec.insert("total", AggOp::Sum("x".into()));
        spec.insert("n", AggOp::Count);
        spec.insert("total", AggOp::Sum("y".into()));
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.entries()[0].0, "total");
        assert_eq!(spec.entries()[0].1, AggOp::Sum("y".into()));
    }

    #[test]
    fn argmax_picks_output_column_value() {
        let mut spec = AggSpec::new();
        spec.insert("best", AggOp::Argmax("x".into(), "k".into()));
        let out = table().groupby(&["k".to_string()], &spec).unwrap();
        assert_eq!(out.extract_row(1).unwrap()[1], Value::Str("b".into()));
    }

    #[test]
    fn quantile_single_and_many() {
        let mut spec = AggSpec::new();
        spec.insert("med", AggOp::Quantile("x".into(), vec![0.5]));
        spec.insert("qs", AggOp::Quantile("x".into(), vec![0.0, 1.0]));
        let out = table().groupby(&["k".to_string()], &spec).unwrap();
        assert_eq!(out.extract_row(0).unwrap()[1], Value::Float(3.0));
        assert_eq!(
            out.extract_row(1).unwrap()[2],
            Value::List(vec![Value::Float(10.0), Value::Float(20.0)])
        );
    }

    #[test]
    fn concat_collects_defined_values() {
        let mut spec = AggSpec::new();
        spec.insert("all", AggOp::Concat("x".into()));
        let out = table().groupby(&["k".to_string()], &spec).unwrap();
        assert_eq!(
            out.extract_row(1).unwrap()[1],
            Value::List(vec![Value::Int(10), Value::Int(20)])
        );
    }

    #[test]
    fn groupby_unknown_column_fails_before_grouping() {
        let mut spec = AggSpec::new();
        spec.insert("s", AggOp::Sum("missing".into()));
        assert!(table().groupby(&["k".to_string()], &spec).is_err());
    }
}
