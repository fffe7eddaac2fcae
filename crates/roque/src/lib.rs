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

//! roque: a columnar table engine with value-semantic tables and typed
//! columns.
//!
//! Tables and columns are cheap to clone (`Arc`-backed, copy-on-write).
//! Row-wise `apply` runs across an internal worker pool; everything else is
//! single-threaded and eager. The `roque-capi` crate exposes this engine
//! through a C ABI.

pub mod apply;
pub mod column;
pub mod group;
pub mod io;
pub mod runtime;
pub mod table;
pub mod value;

pub use column::Column;
pub use group::{AggOp, AggSpec};
pub use io::CsvConfig;
pub use table::{DropHow, JoinHow, Table};
pub use value::{Value, ValueType};

use thiserror::Error as ThisError;

/// Engine-level failures. The boundary layer flattens these to a string
/// message; the variants exist for diagnostics inside the engine.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("column {0:?} not found")]
    ColumnNotFound(String),
    #[error("column {0:?} already exists")]
    DuplicateColumn(String),
    #[error("column length {got} does not match table length {want}")]
    LengthMismatch { got: usize, want: usize },
    #[error("type error: {0}")]
    Type(String),
    #[error("range error: {0}")]
    Range(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("malformed input: {0}")]
    Format(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A failure raised by a caller-injected row callback, re-raised into
    /// the engine's error domain by the boundary marshaller.
    #[error("{0}")]
    Callback(String),
}

pub type Result<T> = std::result::Result<T, Error>;
