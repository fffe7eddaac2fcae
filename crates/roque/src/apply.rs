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

//! Row-wise `apply` over an internal worker pool.
//!
//! Rows are split into contiguous shards, one per worker. Within a shard the
//! callback sees rows in order; across shards no ordering is promised, but
//! every result lands at its row index. The first error aborts the whole
//! operation and the partial output is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::debug;

use crate::column::Column;
use crate::runtime;
use crate::table::Table;
use crate::value::{Value, ValueType};
use crate::{Error, Result};

/// Below this row count the shard split is not worth the thread spawn.
const PARALLEL_THRESHOLD: usize = 256;

impl Table {
    /// Evaluate `f` once per row (receiving the row's cells in column order)
    /// and collect the results into a new column of type `out_type`.
    ///
    /// `f` may be invoked concurrently from several worker threads; it must
    /// be internally synchronized or side-effect-free.
    pub fn apply<F>(&self, f: F, out_type: ValueType) -> Result<Column>
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync,
    {
        let rows = self.num_rows();
        let workers = runtime::workers().min(rows.max(1));

        let mut out = vec![Value::Undefined; rows];
        if rows == 0 {
            return Column::from_values(out_type, out);
        }

        if workers == 1 || rows < PARALLEL_THRESHOLD {
            for (row, slot) in out.iter_mut().enumerate() {
                *slot = f(&self.extract_row(row)?)?;
            }
            return Column::from_values(out_type, out);
        }

        let shard = rows.div_ceil(workers);
        debug!(rows, workers, shard, "parallel apply");

        let failed = AtomicBool::new(false);
        let first_error: Mutex<Option<Error>> = Mutex::new(None);

        std::thread::scope(|scope| {
            let mut rest: &mut [Value] = &mut out;
            let mut start = 0usize;
            while !rest.is_empty() {
                let len = shard.min(rest.len());
                let (chunk, tail) = rest.split_at_mut(len);
                rest = tail;
                let base = start;
                start += len;

                let f = &f;
                let failed = &failed;
                let first_error = &first_error;
                scope.spawn(move || {
                    for (offset, slot) in chunk.iter_mut().enumerate() {
                        if failed.load(Ordering::Relaxed) {
                            return;
                        }
                        let row = base + offset;
                        let result = self.extract_row(row).and_then(|cells| f(&cells));
                        match result {
                            Ok(v) => *slot = v,
                            Err(e) => {
                                let mut guard = match first_error.lock() {
                                    Ok(g) => g,
                                    Err(poisoned) => poisoned.into_inner(),
                                };
                                if guard.is_none() {
                                    *guard = Some(e);
                                }
                                failed.store(true, Ordering::Relaxed);
                                return;
                            }
                        }
                    }
                });
            }
        });

        let taken = match first_error.lock() {
            Ok(mut g) => g.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(e) = taken {
            return Err(e);
        }
        Column::from_values(out_type, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn int_table(n: usize) -> Table {
        let mut t = Table::new();
        t.add_column(
            "x",
            Column::from_values(ValueType::Int, (0..n as i64).map(Value::Int).collect()).unwrap(),
        )
        .unwrap();
        t
    }

    #[test]
    fn apply_preserves_row_positions() {
        let t = int_table(5000);
        let col = t
            .apply(
                |row| Ok(Value::Int(row[0].as_i64().unwrap() * 2)),
                ValueType::Int,
            )
            .unwrap();
        assert_eq!(col.len(), 5000);
        for (i, v) in col.iter().enumerate() {
            assert_eq!(*v, Value::Int(2 * i as i64));
        }
    }

    #[test]
    fn apply_aborts_on_first_error() {
        let t = int_table(5000);
        let calls = AtomicUsize::new(0);
        let err = t
            .apply(
                |row| {
                    calls.fetch_add(1, Ordering::Relaxed);
                    if row[0] == Value::Int(1234) {
                        Err(Error::Callback("boom".into()))
                    } else {
                        Ok(Value::Int(0))
                    }
                },
                ValueType::Int,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Callback(m) if m == "boom"));
        // the abort flag keeps later shards from running all their rows
        assert!(calls.load(Ordering::Relaxed) <= 5000);
    }

    #[test]
    fn apply_on_empty_table_yields_empty_column() {
        let t = int_table(0);
        let col = t.apply(|_| Ok(Value::Int(1)), ValueType::Int).unwrap();
        assert!(col.is_empty());
    }

    #[test]
    fn apply_rejects_mistyped_results() {
        let t = int_table(4);
        let err = t.apply(|_| Ok(Value::Float(1.0)), ValueType::Int);
        assert!(err.is_err());
    }
}
