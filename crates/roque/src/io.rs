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

//! Table ingestion and persistence: delimited text, JSON-Lines, and the
//! JSON-encoded binary table format.

use std::fs;
use std::io::{BufWriter, Write};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::column::Column;
use crate::table::Table;
use crate::value::{Value, ValueType};
use crate::{Error, Result};

// ---------------------------------------------------------------------------
// CSV configuration
// ---------------------------------------------------------------------------

/// Delimited-text reader options. One field per recognized option; `None`
/// means "unset, use the default".
#[derive(Debug, Clone, Default)]
pub struct CsvConfig {
    /// First record holds column names (default true).
    pub header: Option<bool>,
    pub delimiter: Option<String>,
    pub comment_char: Option<String>,
    pub escape_char: Option<String>,
    pub quote_char: Option<String>,
    /// Fail the read on a malformed row instead of skipping it.
    pub error_bad_lines: Option<bool>,
    pub double_quote: Option<bool>,
    pub skip_initial_space: Option<bool>,
    pub column_type_hints: Option<Vec<(String, ValueType)>>,
    pub na_values: Option<Vec<String>>,
    pub line_terminator: Option<String>,
    pub usecols: Option<Vec<String>>,
    pub nrows: Option<usize>,
    pub skiprows: Option<usize>,
    pub verbose: Option<bool>,
}

fn single_byte(name: &str, s: &str) -> Result<u8> {
    let bytes = s.as_bytes();
    if bytes.len() != 1 {
        return Err(Error::InvalidArgument(format!(
            "{name} must be a single character, got {s:?}"
        )));
    }
    Ok(bytes[0])
}

impl Table {
    /// Read a delimited-text file.
    pub fn read_csv(path: &str, config: &CsvConfig) -> Result<Table> {
        let mut builder = csv::ReaderBuilder::new();
        // Header handling is manual so the no-header path can synthesize
        // X1..XN names.
        builder.has_headers(false).flexible(true);

        if let Some(d) = &config.delimiter {
            builder.delimiter(single_byte("delimiter", d)?);
        }
        if let Some(q) = &config.quote_char {
            builder.quote(single_byte("quote_char", q)?);
        }
        if let Some(e) = &config.escape_char {
            builder.escape(Some(single_byte("escape_char", e)?));
        }
        if let Some(c) = &config.comment_char {
            builder.comment(Some(single_byte("comment_char", c)?));
        }
        if let Some(dq) = config.double_quote {
            builder.double_quote(dq);
        }
        if config.skip_initial_space.unwrap_or(false) {
            builder.trim(csv::Trim::All);
        }
        if let Some(t) = &config.line_terminator {
            let term = if t == "\r\n" {
                csv::Terminator::CRLF
            } else {
                csv::Terminator::Any(single_byte("line_terminator", t)?)
            };
            builder.terminator(term);
        }

        let mut reader = builder.from_path(path)?;
        let mut records = reader.records();

        let header = config.header.unwrap_or(true);
        let first = match records.next() {
            Some(r) => r?,
            None => return Ok(Table::new()),
        };
        // Without a header the first record is data and must run through
        // the same skiprows/nrows accounting as every other record.
        let (names, carried): (Vec<String>, Option<csv::StringRecord>) = if header {
            (first.iter().map(|s| s.to_string()).collect(), None)
        } else {
            (
                (1..=first.len()).map(|i| format!("X{i}")).collect(),
                Some(first),
            )
        };

        let error_bad_lines = config.error_bad_lines.unwrap_or(false);
        let skiprows = config.skiprows.unwrap_or(0);
        let nrows = config.nrows.unwrap_or(usize::MAX);

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut seen = 0usize;
        for record in carried
            .into_iter()
            .map(Ok::<csv::StringRecord, csv::Error>)
            .chain(records)
        {
            let record = record?;
            seen += 1;
            if seen <= skiprows {
                continue;
            }
            if rows.len() >= nrows {
                break;
            }
            if record.len() != names.len() {
                if error_bad_lines {
                    return Err(Error::Format(format!(
                        "row {seen} has {} fields, expected {}",
                        record.len(),
                        names.len()
                    )));
                }
                warn!(row = seen, fields = record.len(), "skipping malformed row");
                continue;
            }
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        if config.verbose.unwrap_or(false) {
            info!(path, rows = rows.len(), columns = names.len(), "read csv");
        }

        let na_values = config.na_values.as_deref().unwrap_or(&[]);
        let hints = config.column_type_hints.as_deref().unwrap_or(&[]);

        let keep: Vec<usize> = match &config.usecols {
            None => (0..names.len()).collect(),
            Some(cols) => cols
                .iter()
                .map(|c| {
                    names
                        .iter()
                        .position(|n| n == c)
                        .ok_or_else(|| Error::ColumnNotFound(c.clone()))
                })
                .collect::<Result<_>>()?,
        };

        let mut table = Table::new();
        for &ci in &keep {
            let name = &names[ci];
            let cells: Vec<Option<&str>> = rows
                .iter()
                .map(|row| {
                    let cell = row[ci].as_str();
                    if cell.is_empty() || na_values.iter().any(|na| na == cell) {
                        None
                    } else {
                        Some(cell)
                    }
                })
                .collect();
            let hint = hints.iter().find(|(n, _)| n == name).map(|(_, t)| *t);
            table.add_column(name, parse_column(&cells, hint)?)?;
        }
        Ok(table)
    }

    /// Write the table as comma-delimited text with a header row.
    pub fn write_csv(&self, path: &str) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.column_names())?;
        for row in 0..self.num_rows() {
            let cells: Vec<String> = self
                .extract_row(row)?
                .iter()
                .map(|v| match v {
                    Value::Undefined => String::new(),
                    v => v.to_string(),
                })
                .collect();
            writer.write_record(&cells)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read a JSON-Lines file. When every line parses as a JSON object the
    /// result has one column per key; otherwise the raw lines land in a
    /// single string column named `X1`. This mirrors the single-column
    /// delimited-text degrade of the original surface and is intentionally
    /// narrow: it assumes one JSON object per line.
    pub fn read_json_lines(path: &str) -> Result<Table> {
        let text = fs::read_to_string(path)?;
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

        let mut dicts = Vec::with_capacity(lines.len());
        let mut all_objects = true;
        for line in &lines {
            match serde_json::from_str::<serde_json::Value>(line) {
                Ok(serde_json::Value::Object(_)) => {
                    if all_objects {
                        dicts.push(json_to_value(&serde_json::from_str(line)?));
                    }
                }
                _ => {
                    all_objects = false;
                }
            }
        }

        let mut table = Table::new();
        if all_objects && !lines.is_empty() {
            table.add_column("X1", Column::from_values(ValueType::Dict, dicts)?)?;
            table.unpack("X1", "")
        } else {
            let vals: Vec<Value> = lines.iter().map(|l| Value::Str(l.to_string())).collect();
            table.add_column("X1", Column::from_values(ValueType::Str, vals)?)?;
            Ok(table)
        }
    }

    /// Persist in the given format: `"csv"` or `"binary"` (the JSON-encoded
    /// table file that [`Table::load`] reads back).
    pub fn save(&self, path: &str, format: &str) -> Result<()> {
        match format {
            "csv" => self.write_csv(path),
            "binary" => {
                let file = TableFile::from_table(self)?;
                let out = fs::File::create(path)?;
                let mut w = BufWriter::new(out);
                serde_json::to_writer(&mut w, &file)?;
                w.flush()?;
                Ok(())
            }
            other => Err(Error::InvalidArgument(format!(
                "unknown save format {other:?}; expected csv or binary"
            ))),
        }
    }

    /// Load a table saved with the `"binary"` format.
    pub fn load(path: &str) -> Result<Table> {
        let text = fs::read_to_string(path)?;
        let file: TableFile = serde_json::from_str(&text)?;
        file.into_table()
    }
}

/// Parse one column of raw cells, honoring a type hint or inferring
/// int → float → string.
fn parse_column(cells: &[Option<&str>], hint: Option<ValueType>) -> Result<Column> {
    let dtype = match hint {
        Some(t) => t,
        None => {
            let defined = cells.iter().flatten();
            if cells.iter().flatten().next().is_none() {
                ValueType::Str
            } else if defined.clone().all(|c| c.trim().parse::<i64>().is_ok()) {
                ValueType::Int
            } else if defined.clone().all(|c| c.trim().parse::<f64>().is_ok()) {
                ValueType::Float
            } else {
                ValueType::Str
            }
        }
    };
    let values: Vec<Value> = cells
        .iter()
        .map(|cell| match cell {
            None => Ok(Value::Undefined),
            Some(s) => Value::Str(s.to_string()).cast(dtype),
        })
        .collect::<Result<_>>()?;
    Column::from_values(dtype, values)
}

/// Convert parsed JSON into an engine value. Booleans become 0/1 ints;
/// numbers outside i64 become floats.
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Undefined,
        serde_json::Value::Bool(b) => Value::Int(*b as i64),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Dict(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_value(v)))
                .collect(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Binary table file
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct ColumnFile {
    name: String,
    dtype: ValueType,
    values: Vec<Value>,
}

#[derive(Serialize, Deserialize)]
struct TableFile {
    columns: Vec<ColumnFile>,
}

impl TableFile {
    fn from_table(table: &Table) -> Result<TableFile> {
        let mut columns = Vec::with_capacity(table.num_columns());
        for name in table.column_names() {
            let col = table.column(&name)?;
            columns.push(ColumnFile {
                name,
                dtype: col.dtype(),
                values: col.values().to_vec(),
            });
        }
        Ok(TableFile { columns })
    }

    fn into_table(self) -> Result<Table> {
        let mut table = Table::new();
        for col in self.columns {
            table.add_column(&col.name, Column::from_values(col.dtype, col.values)?)?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(contents: &str, suffix: &str) -> (tempfile::NamedTempFile, String) {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        let path = f.path().to_str().unwrap().to_string();
        (f, path)
    }

    #[test]
    fn csv_infers_types_and_na() {
        let (_f, path) = write_temp("a,b,c\n1,1.5,x\n2,,y\n3,2.5,NA\n", ".csv");
        let config = CsvConfig {
            na_values: Some(vec!["NA".to_string()]),
            ..CsvConfig::default()
        };
        let t = Table::read_csv(&path, &config).unwrap();
        assert_eq!(t.num_rows(), 3);
        assert_eq!(t.column_type("a").unwrap(), ValueType::Int);
        assert_eq!(t.column_type("b").unwrap(), ValueType::Float);
        assert_eq!(t.column_type("c").unwrap(), ValueType::Str);
        assert_eq!(t.column("b").unwrap().get(1).unwrap(), &Value::Undefined);
        assert_eq!(t.column("c").unwrap().get(2).unwrap(), &Value::Undefined);
    }

    #[test]
    fn csv_without_header_names_columns_x1_xn() {
        let (_f, path) = write_temp("1,2\n3,4\n", ".csv");
        let config = CsvConfig {
            header: Some(false),
            ..CsvConfig::default()
        };
        let t = Table::read_csv(&path, &config).unwrap();
        assert_eq!(t.column_names(), vec!["X1", "X2"]);
        assert_eq!(t.num_rows(), 2);
    }

    #[test]
    fn csv_respects_delimiter_usecols_nrows_skiprows() {
        let (_f, path) = write_temp("a;b\n1;10\n2;20\n3;30\n4;40\n", ".csv");
        let config = CsvConfig {
            delimiter: Some(";".to_string()),
            usecols: Some(vec!["b".to_string()]),
            skiprows: Some(1),
            nrows: Some(2),
            ..CsvConfig::default()
        };
        let t = Table::read_csv(&path, &config).unwrap();
        assert_eq!(t.column_names(), vec!["b"]);
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.column("b").unwrap().get(0).unwrap(), &Value::Int(20));
    }

    #[test]
    fn csv_without_header_counts_first_record_for_skiprows_and_nrows() {
        let (_f, path) = write_temp("1,10\n2,20\n3,30\n", ".csv");
        let config = CsvConfig {
            header: Some(false),
            skiprows: Some(1),
            ..CsvConfig::default()
        };
        let t = Table::read_csv(&path, &config).unwrap();
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.column("X1").unwrap().get(0).unwrap(), &Value::Int(2));

        let limited = CsvConfig {
            header: Some(false),
            nrows: Some(1),
            ..CsvConfig::default()
        };
        let t = Table::read_csv(&path, &limited).unwrap();
        assert_eq!(t.num_rows(), 1);
        assert_eq!(t.column("X1").unwrap().get(0).unwrap(), &Value::Int(1));
    }

    #[test]
    fn csv_bad_lines_skip_or_fail() {
        let (_f, path) = write_temp("a,b\n1,2\n3\n4,5\n", ".csv");
        let t = Table::read_csv(&path, &CsvConfig::default()).unwrap();
        assert_eq!(t.num_rows(), 2);

        let strict = CsvConfig {
            error_bad_lines: Some(true),
            ..CsvConfig::default()
        };
        assert!(Table::read_csv(&path, &strict).is_err());
    }

    #[test]
    fn csv_type_hints_override_inference() {
        let (_f, path) = write_temp("a\n1\n2\n", ".csv");
        let config = CsvConfig {
            column_type_hints: Some(vec![("a".to_string(), ValueType::Str)]),
            ..CsvConfig::default()
        };
        let t = Table::read_csv(&path, &config).unwrap();
        assert_eq!(t.column_type("a").unwrap(), ValueType::Str);
    }

    #[test]
    fn json_lines_unpacks_objects() {
        let (_f, path) = write_temp(
            "{\"x\": 1, \"y\": \"a\"}\n{\"x\": 2, \"y\": \"b\"}\n",
            ".jsonl",
        );
        let t = Table::read_json_lines(&path).unwrap();
        assert_eq!(t.column_names(), vec!["x", "y"]);
        assert_eq!(t.column("x").unwrap().get(1).unwrap(), &Value::Int(2));
    }

    #[test]
    fn json_lines_degrades_to_single_string_column() {
        let (_f, path) = write_temp("not json\n[1,2]\n", ".jsonl");
        let t = Table::read_json_lines(&path).unwrap();
        assert_eq!(t.column_names(), vec!["X1"]);
        assert_eq!(t.column_type("X1").unwrap(), ValueType::Str);
        assert_eq!(t.num_rows(), 2);
    }

    #[test]
    fn binary_save_load_round_trip() {
        let (_f, path) = write_temp("a,b\n1,x\n2,y\n", ".csv");
        let t = Table::read_csv(&path, &CsvConfig::default()).unwrap();

        let out = tempfile::Builder::new().suffix(".rqt").tempfile().unwrap();
        let out_path = out.path().to_str().unwrap().to_string();
        t.save(&out_path, "binary").unwrap();
        let back = Table::load(&out_path).unwrap();
        assert_eq!(t, back);

        assert!(t.save(&out_path, "parquet").is_err());
    }
}
