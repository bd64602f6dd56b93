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

//! Decodes Apache Parquet column chunks straight into Apache Arrow arrays.
//!
//! The pipeline runs bottom-up: [`file::footer`] and [`file::metadata`] turn the
//! file's thrift-encoded footer into a [`file::metadata::ParquetMetaData`];
//! [`schema::types`] builds the schema arena and derives per-leaf
//! nullability/nesting depth; [`column::chunk_decoder`] drives one column chunk's
//! pages through the bit-level codecs in [`encodings`] into a
//! [`column::build_state::ColumnBuildState`]; [`arrow::array_builder`] turns that
//! into a flat Arrow array and [`arrow::nested`] reassembles struct/list/map
//! nesting from repetition/definition levels; [`row_group`] orchestrates all of
//! the above across a row group's columns and packages the result as a
//! [`arrow_array::RecordBatch`].
//!
//! Callers needing a single column family's bytes bring their own
//! [`file::reader::ChunkReader`] (implemented here for `std::fs::File` and
//! `bytes::Bytes`); this crate only ever asks it for byte ranges, never for the
//! whole file up front.

pub mod arrow;
pub mod basic;
pub mod column;
pub mod compression;
pub mod data_type;
pub mod encodings;
pub mod errors;
pub mod file;
pub mod row_group;
pub mod schema;
pub mod util;

pub use errors::{ParquetError, Result};
pub use file::footer::parse_metadata;
pub use file::metadata::ParquetMetaData;
pub use file::reader::{ChunkReader, Length};
pub use row_group::{read_row_group, read_row_groups, ExecutionMode};
