// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Common Parquet errors and macros.

use std::error::Error;
use std::fmt;

/// The error taxonomy surfaced to callers of this crate. Decoders never retry or
/// recover locally: any inconsistency fails the chunk, which fails the row-group
/// read, and the reader remains usable afterwards (metadata caches are untouched).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParquetError {
    /// The file is too short, the leading/trailing magic is missing, or a declared
    /// length exceeds the available bytes.
    TruncatedFile(String),
    /// A level/value stream ended inside a run.
    TruncatedData(String),
    /// Footer length is <= 0 or exceeds the available space.
    InvalidFooter(String),
    /// A violated invariant while parsing a page header, dictionary, levels, or
    /// values.
    ParquetFormat(String),
    /// An (encoding, physical type) combination this crate does not implement.
    UnsupportedEncoding(String),
    /// A dictionary-encoded data page with no preceding dictionary page in the chunk.
    MissingDictionary(String),
    /// A codec not plumbed into the decompressor.
    UnsupportedCodec(String),
    /// A row-group index outside `[0, num_row_groups)`.
    ArgumentOutOfRange(String),
    /// A requested dotted path not present in the schema.
    ColumnNotFound(String),
    /// Propagated from the I/O collaborator.
    IoError(String),
    /// Anything else raised by ambient plumbing (thrift decode, etc.) that does not
    /// map cleanly onto the above.
    General(String),
}

impl fmt::Display for ParquetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParquetError::TruncatedFile(s) => write!(f, "truncated file: {}", s),
            ParquetError::TruncatedData(s) => write!(f, "truncated data: {}", s),
            ParquetError::InvalidFooter(s) => write!(f, "invalid footer: {}", s),
            ParquetError::ParquetFormat(s) => write!(f, "parquet format: {}", s),
            ParquetError::UnsupportedEncoding(s) => write!(f, "unsupported encoding: {}", s),
            ParquetError::MissingDictionary(s) => write!(f, "missing dictionary: {}", s),
            ParquetError::UnsupportedCodec(s) => write!(f, "unsupported codec: {}", s),
            ParquetError::ArgumentOutOfRange(s) => write!(f, "argument out of range: {}", s),
            ParquetError::ColumnNotFound(s) => write!(f, "column not found: {}", s),
            ParquetError::IoError(s) => write!(f, "IO error: {}", s),
            ParquetError::General(s) => write!(f, "{}", s),
        }
    }
}

impl Error for ParquetError {}

impl From<std::io::Error> for ParquetError {
    fn from(e: std::io::Error) -> ParquetError {
        ParquetError::IoError(e.to_string())
    }
}

impl From<thrift::Error> for ParquetError {
    fn from(e: thrift::Error) -> ParquetError {
        ParquetError::General(format!("underlying Thrift error: {}", e))
    }
}

impl From<arrow_schema::ArrowError> for ParquetError {
    fn from(e: arrow_schema::ArrowError) -> ParquetError {
        ParquetError::General(format!("underlying Arrow error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, ParquetError>;

/// Builds a [`ParquetError::ParquetFormat`] from a format string, the catch-all for
/// format invariant violations raised inline where they're detected.
macro_rules! general_err {
    ($fmt:expr) => (crate::errors::ParquetError::ParquetFormat($fmt.to_string()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetError::ParquetFormat(format!($fmt, $($args),*)));
}

/// Builds a [`ParquetError::TruncatedData`], used whenever a stream ends before a
/// decoder expected it to.
macro_rules! eof_err {
    ($fmt:expr) => (crate::errors::ParquetError::TruncatedData($fmt.to_string()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetError::TruncatedData(format!($fmt, $($args),*)));
}

/// Builds a [`ParquetError::UnsupportedEncoding`], used for encoding × physical-type
/// combinations this crate does not implement.
macro_rules! nyi_err {
    ($fmt:expr) => (crate::errors::ParquetError::UnsupportedEncoding($fmt.to_string()));
    ($fmt:expr, $($args:expr),*) => (crate::errors::ParquetError::UnsupportedEncoding(format!($fmt, $($args),*)));
}

pub(crate) use eof_err;
pub(crate) use general_err;
pub(crate) use nyi_err;
