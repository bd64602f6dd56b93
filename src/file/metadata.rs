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

//! The decoded metadata collaborator (spec §6.2), realized concretely from the
//! thrift-decoded `FileMetaData` by [`crate::file::footer::parse_metadata`]. Cached
//! once per reader and read-only thereafter (spec §5, "Shared mutability").

use crate::basic::{Compression, Encoding, Type};
use crate::errors::{general_err, Result};
use crate::schema::types::SchemaDescriptor;

#[derive(Debug, Clone)]
pub struct ColumnChunkMetaData {
    pub physical_type: Type,
    pub encodings: Vec<Encoding>,
    pub path_in_schema: Vec<String>,
    pub codec: Compression,
    pub num_values: i64,
    pub total_uncompressed_size: i64,
    pub total_compressed_size: i64,
    pub data_page_offset: i64,
    /// `None` iff the chunk carries no dictionary page. A raw `dictionary_page_offset`
    /// of 0 (the legacy writer sentinel, spec §3) is normalized to `None` here.
    pub dictionary_page_offset: Option<i64>,
}

impl ColumnChunkMetaData {
    pub fn dotted_path(&self) -> String {
        self.path_in_schema.join(".")
    }

    /// The byte range a full chunk read must cover (spec §4.L "Range planning"):
    /// starts at the dictionary page when present, ends at the close of the last
    /// data page.
    pub fn byte_range(&self) -> (u64, u64) {
        let start = match self.dictionary_page_offset {
            Some(off) if off > 0 => off.min(self.data_page_offset),
            _ => self.data_page_offset,
        } as u64;
        (start, self.total_compressed_size as u64)
    }

    fn from_thrift(meta: parquet_format::ColumnMetaData) -> Result<Self> {
        let dictionary_page_offset = match meta.dictionary_page_offset {
            Some(0) | None => None,
            Some(off) => Some(off),
        };
        Ok(ColumnChunkMetaData {
            physical_type: Type::from(meta.type_),
            encodings: meta.encodings.into_iter().map(Encoding::from).collect(),
            path_in_schema: meta.path_in_schema,
            codec: Compression::from(meta.codec),
            num_values: meta.num_values,
            total_uncompressed_size: meta.total_uncompressed_size,
            total_compressed_size: meta.total_compressed_size,
            data_page_offset: meta.data_page_offset,
            dictionary_page_offset,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RowGroupMetaData {
    pub columns: Vec<ColumnChunkMetaData>,
    pub num_rows: i64,
    pub total_byte_size: i64,
}

impl RowGroupMetaData {
    pub fn columns(&self) -> &[ColumnChunkMetaData] {
        &self.columns
    }

    pub fn column(&self, i: usize) -> &ColumnChunkMetaData {
        &self.columns[i]
    }

    fn from_thrift(rg: parquet_format::RowGroup) -> Result<Self> {
        let mut columns = Vec::with_capacity(rg.columns.len());
        for col in rg.columns {
            let meta = col
                .meta_data
                .ok_or_else(|| general_err!("column chunk missing meta_data"))?;
            columns.push(ColumnChunkMetaData::from_thrift(meta)?);
        }
        Ok(RowGroupMetaData {
            columns,
            num_rows: rg.num_rows,
            total_byte_size: rg.total_byte_size,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ParquetMetaData {
    pub schema_descr: SchemaDescriptor,
    pub row_groups: Vec<RowGroupMetaData>,
    pub num_rows: i64,
    pub created_by: Option<String>,
}

impl ParquetMetaData {
    pub fn schema_descr(&self) -> &SchemaDescriptor {
        &self.schema_descr
    }

    pub fn row_groups(&self) -> &[RowGroupMetaData] {
        &self.row_groups
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    pub fn row_group(&self, i: usize) -> Result<&RowGroupMetaData> {
        self.row_groups
            .get(i)
            .ok_or_else(|| crate::errors::ParquetError::ArgumentOutOfRange(format!(
                "row group index {} out of range [0, {})",
                i,
                self.row_groups.len()
            )))
    }

    pub(crate) fn from_thrift(file_metadata: parquet_format::FileMetaData) -> Result<Self> {
        let schema_descr = SchemaDescriptor::from_thrift(&file_metadata.schema)?;
        let mut row_groups = Vec::with_capacity(file_metadata.row_groups.len());
        for rg in file_metadata.row_groups {
            row_groups.push(RowGroupMetaData::from_thrift(rg)?);
        }
        Ok(ParquetMetaData {
            schema_descr,
            row_groups,
            num_rows: file_metadata.num_rows,
            created_by: file_metadata.created_by,
        })
    }
}
