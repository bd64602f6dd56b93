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

//! Component L: the row-group orchestrator. Plans which columns to read, pulls
//! their chunk bytes through the [`ChunkReader`](crate::file::reader::ChunkReader)
//! collaborator, drives each one through the column-chunk decoder (G), the flat
//! array builder (J), and the nested assembler (K), and packages the result as
//! one [`RecordBatch`] per row group (spec §4.L).
//!
//! The four [`ExecutionMode`]s differ only in scheduling, never in result: the
//! two "batched read" modes fetch every selected column's bytes with one
//! `read_ranges` call before decoding anything (spec §6.1), the two "bounded
//! memory" modes fetch and decode one column at a time so only one column's
//! compressed bytes are live at once, and the two "parallel" modes fan decode
//! out across a `std::thread::scope` pool bounded by a counting semaphore sized
//! to `std::thread::available_parallelism()` (SPEC_FULL.md §5).

use std::sync::{Arc, Condvar, Mutex};

use arrow_array::{BooleanArray, RecordBatch};

use crate::arrow::array_builder::build_leaf_array;
use crate::arrow::nested::{assemble_root_children, LeafArray};
use crate::arrow::schema::{build_schema_for_selection, leaf_arrow_type};
use crate::column::chunk_decoder::{decode_column_chunk, ChunkDecodeInput};
use crate::errors::{general_err, Result};
use crate::file::metadata::{ParquetMetaData, RowGroupMetaData};
use crate::file::reader::ChunkReader;
use crate::schema::types::SchemaDescriptor;

/// The four ways the orchestrator can drive chunk read and decode across the
/// columns of a row group (spec §4.L, "Execution modes").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Fetch every selected column's bytes with one `read_ranges` call, then
    /// decode them one after another on the calling thread.
    SequentialBatchedRead,
    /// Fetch and decode one column at a time, dropping its bytes before the
    /// next column is read: bounded peak memory at the cost of one I/O
    /// round-trip per column instead of a single batched range read.
    SequentialBoundedMemory,
    /// Fetch every selected column's bytes with one `read_ranges` call, then
    /// decode them concurrently, bounded by `available_parallelism()`.
    ParallelBatchedRead,
    /// Fetch and decode each column concurrently, each on its own worker,
    /// bounded by `available_parallelism()`.
    ParallelBoundedConcurrency,
}

/// A simple blocking counting semaphore, sized to the hardware parallelism
/// budget the orchestrator fans column decode out across (spec §5).
struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    fn new(permits: usize) -> Self {
        Semaphore {
            permits: Mutex::new(permits.max(1)),
            available: Condvar::new(),
        }
    }

    fn acquire(&self) {
        let mut guard = self.permits.lock().unwrap();
        while *guard == 0 {
            guard = self.available.wait(guard).unwrap();
        }
        *guard -= 1;
    }

    fn release(&self) {
        let mut guard = self.permits.lock().unwrap();
        *guard += 1;
        self.available.notify_one();
    }
}

fn hardware_parallelism() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Reads one row group, applying `columns` (dotted leaf paths; `None` selects
/// every root column) and materializing the result as a single [`RecordBatch`].
pub fn read_row_group<R: ChunkReader>(
    reader: &R,
    metadata: &ParquetMetaData,
    row_group_index: usize,
    columns: Option<&[String]>,
    mode: ExecutionMode,
) -> Result<RecordBatch> {
    let rg = metadata.row_group(row_group_index)?;
    let row_count = rg.num_rows.max(0) as usize;
    let descr = metadata.schema_descr();
    let (root_children, schema) = build_schema_for_selection(descr, columns)?;

    let leaf_indices: Vec<usize> = root_children
        .iter()
        .flat_map(|&root| descr.leaf_range_for_node(root))
        .collect();

    let mut leaves: Vec<Option<LeafArray>> = (0..descr.num_leaves()).map(|_| None).collect();

    match mode {
        ExecutionMode::SequentialBatchedRead => {
            let ranges: Vec<(u64, usize)> = leaf_indices.iter().map(|&i| chunk_range(rg, i)).collect();
            let chunk_bytes = reader.read_ranges(&ranges)?;
            for (&leaf_idx, bytes) in leaf_indices.iter().zip(chunk_bytes.iter()) {
                leaves[leaf_idx] = Some(decode_leaf_bytes(descr, rg, leaf_idx, row_count, bytes)?);
            }
        }
        ExecutionMode::SequentialBoundedMemory => {
            for &leaf_idx in &leaf_indices {
                leaves[leaf_idx] = Some(decode_one_leaf(reader, descr, rg, leaf_idx, row_count)?);
            }
        }
        ExecutionMode::ParallelBatchedRead => {
            let ranges: Vec<(u64, usize)> = leaf_indices.iter().map(|&i| chunk_range(rg, i)).collect();
            let chunk_bytes = reader.read_ranges(&ranges)?;
            let semaphore = Semaphore::new(hardware_parallelism());
            let decoded: Vec<Result<LeafArray>> = std::thread::scope(|scope| {
                let handles: Vec<_> = leaf_indices
                    .iter()
                    .zip(chunk_bytes.iter())
                    .map(|(&leaf_idx, bytes)| {
                        let semaphore = &semaphore;
                        scope.spawn(move || {
                            semaphore.acquire();
                            let result = decode_leaf_bytes(descr, rg, leaf_idx, row_count, bytes);
                            semaphore.release();
                            result
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().expect("column decode thread panicked")).collect()
            });
            for (&leaf_idx, leaf) in leaf_indices.iter().zip(decoded) {
                leaves[leaf_idx] = Some(leaf?);
            }
        }
        ExecutionMode::ParallelBoundedConcurrency => {
            let semaphore = Semaphore::new(hardware_parallelism());
            let decoded: Vec<Result<LeafArray>> = std::thread::scope(|scope| {
                let handles: Vec<_> = leaf_indices
                    .iter()
                    .map(|&leaf_idx| {
                        let semaphore = &semaphore;
                        scope.spawn(move || {
                            semaphore.acquire();
                            let result = decode_one_leaf(reader, descr, rg, leaf_idx, row_count);
                            semaphore.release();
                            result
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().expect("column decode thread panicked")).collect()
            });
            for (&leaf_idx, leaf) in leaf_indices.iter().zip(decoded) {
                leaves[leaf_idx] = Some(leaf?);
            }
        }
    }

    // Only the leaves reachable from `root_children` (i.e. `leaf_indices`) were
    // decoded above; `assemble_root_children` never looks at any other slot, so an
    // unselected leaf is filled with a placeholder rather than failing the read.
    for &leaf_idx in &leaf_indices {
        if leaves[leaf_idx].is_none() {
            return Err(general_err!("leaf column {} was not decoded", leaf_idx));
        }
    }
    let leaves: Vec<LeafArray> = leaves.into_iter().map(|l| l.unwrap_or_else(placeholder_leaf)).collect();
    let columns_out = assemble_root_children(descr, &root_children, &leaves, row_count)?;
    RecordBatch::try_new(Arc::new(schema), columns_out).map_err(|e| e.into())
}

/// Reads several row groups with the same `mode` and column selection,
/// returning one [`RecordBatch`] per index in order.
pub fn read_row_groups<R: ChunkReader>(
    reader: &R,
    metadata: &ParquetMetaData,
    row_group_indices: &[usize],
    columns: Option<&[String]>,
    mode: ExecutionMode,
) -> Result<Vec<RecordBatch>> {
    row_group_indices
        .iter()
        .map(|&idx| read_row_group(reader, metadata, idx, columns, mode))
        .collect()
}

/// Stands in for a leaf that column projection (spec §6, `columns: Option<&[String]>`)
/// excluded from this read. `assemble_root_children` only dereferences `leaves` at
/// indices reachable from the selected root children, so this value is never read.
fn placeholder_leaf() -> LeafArray {
    LeafArray {
        array: Arc::new(BooleanArray::from(Vec::<bool>::new())),
        def_levels: None,
        rep_levels: None,
    }
}

/// The byte range a leaf's column chunk occupies (spec §4.L, "Range planning").
fn chunk_range(rg: &RowGroupMetaData, leaf_idx: usize) -> (u64, usize) {
    let (start, len) = rg.column(leaf_idx).byte_range();
    (start, len as usize)
}

fn decode_one_leaf<R: ChunkReader>(
    reader: &R,
    descr: &SchemaDescriptor,
    rg: &RowGroupMetaData,
    leaf_idx: usize,
    row_count: usize,
) -> Result<LeafArray> {
    let (start, len) = chunk_range(rg, leaf_idx);
    let chunk_bytes = reader.get_bytes(start, len)?;
    decode_leaf_bytes(descr, rg, leaf_idx, row_count, &chunk_bytes)
}

fn decode_leaf_bytes(
    descr: &SchemaDescriptor,
    rg: &RowGroupMetaData,
    leaf_idx: usize,
    row_count: usize,
    chunk_bytes: &[u8],
) -> Result<LeafArray> {
    let column_descr = &descr.leaves()[leaf_idx];
    let column_meta = rg.column(leaf_idx);
    let node = descr.node(column_descr.node_index);

    let result = decode_column_chunk(ChunkDecodeInput {
        chunk_bytes,
        column: column_meta,
        max_def_level: column_descr.max_def_level,
        max_rep_level: column_descr.max_rep_level,
        row_count,
        type_length: node.type_length,
    })?;
    let (max_def_level, max_rep_level, def_levels, rep_levels, storage) = result.state.into_parts();
    let data_type = leaf_arrow_type(node)?;
    let array = build_leaf_array(storage, &data_type, &def_levels, max_def_level, max_rep_level, row_count)?;
    Ok(LeafArray {
        array,
        def_levels: if max_def_level > 0 { Some(def_levels) } else { None },
        rep_levels: if max_rep_level > 0 { Some(rep_levels) } else { None },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::{Compression, Encoding, Type};
    use crate::file::metadata::ColumnChunkMetaData;
    use arrow_array::Int32Array;
    use thrift::protocol::{TCompactOutputProtocol, TOutputProtocol};

    fn page_bytes() -> Vec<u8> {
        let mut chunk = Vec::new();
        let v1_header = parquet_format::DataPageHeader {
            num_values: 3,
            encoding: parquet_format::Encoding::PLAIN,
            definition_level_encoding: parquet_format::Encoding::RLE,
            repetition_level_encoding: parquet_format::Encoding::RLE,
            statistics: None,
        };
        let header = parquet_format::PageHeader {
            type_: parquet_format::PageType::DATA_PAGE,
            uncompressed_page_size: 12,
            compressed_page_size: 12,
            crc: None,
            data_page_header: Some(v1_header),
            index_page_header: None,
            dictionary_page_header: None,
            data_page_header_v2: None,
        };
        let mut prot = TCompactOutputProtocol::new(&mut chunk);
        header.write_to_out_protocol(&mut prot).unwrap();
        prot.flush().unwrap();
        chunk.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0]);
        chunk
    }

    fn flat_int32_metadata(chunk_len: i64) -> ParquetMetaData {
        let elements = vec![
            parquet_format::SchemaElement {
                type_: None,
                type_length: None,
                repetition_type: None,
                name: "schema".to_string(),
                num_children: Some(1),
                converted_type: None,
                scale: None,
                precision: None,
                field_id: None,
                logical_type: None,
            },
            parquet_format::SchemaElement {
                type_: Some(parquet_format::Type::INT32),
                type_length: None,
                repetition_type: Some(parquet_format::FieldRepetitionType::REQUIRED),
                name: "a".to_string(),
                num_children: None,
                converted_type: None,
                scale: None,
                precision: None,
                field_id: None,
                logical_type: None,
            },
        ];
        let schema_descr = SchemaDescriptor::from_thrift(&elements).unwrap();
        let column = ColumnChunkMetaData {
            physical_type: Type::Int32,
            encodings: vec![Encoding::Plain],
            path_in_schema: vec!["a".to_string()],
            codec: Compression::Uncompressed,
            num_values: 3,
            total_uncompressed_size: chunk_len,
            total_compressed_size: chunk_len,
            data_page_offset: 0,
            dictionary_page_offset: None,
        };
        ParquetMetaData {
            schema_descr,
            row_groups: vec![RowGroupMetaData {
                columns: vec![column],
                num_rows: 3,
                total_byte_size: chunk_len,
            }],
            num_rows: 3,
            created_by: None,
        }
    }

    fn two_column_int32_metadata(page_len: i64) -> ParquetMetaData {
        let leaf = |name: &str| parquet_format::SchemaElement {
            type_: Some(parquet_format::Type::INT32),
            type_length: None,
            repetition_type: Some(parquet_format::FieldRepetitionType::REQUIRED),
            name: name.to_string(),
            num_children: None,
            converted_type: None,
            scale: None,
            precision: None,
            field_id: None,
            logical_type: None,
        };
        let elements = vec![
            parquet_format::SchemaElement {
                type_: None,
                type_length: None,
                repetition_type: None,
                name: "schema".to_string(),
                num_children: Some(2),
                converted_type: None,
                scale: None,
                precision: None,
                field_id: None,
                logical_type: None,
            },
            leaf("a"),
            leaf("b"),
        ];
        let schema_descr = SchemaDescriptor::from_thrift(&elements).unwrap();
        let column = |name: &str, offset: i64| ColumnChunkMetaData {
            physical_type: Type::Int32,
            encodings: vec![Encoding::Plain],
            path_in_schema: vec![name.to_string()],
            codec: Compression::Uncompressed,
            num_values: 3,
            total_uncompressed_size: page_len,
            total_compressed_size: page_len,
            data_page_offset: offset,
            dictionary_page_offset: None,
        };
        ParquetMetaData {
            schema_descr,
            row_groups: vec![RowGroupMetaData {
                columns: vec![column("a", 0), column("b", page_len)],
                num_rows: 3,
                total_byte_size: page_len * 2,
            }],
            num_rows: 3,
            created_by: None,
        }
    }

    #[test]
    fn column_projection_decodes_only_the_selected_leaf() {
        let page = page_bytes();
        let page_len = page.len() as i64;
        let mut file_bytes = page.clone();
        file_bytes.extend_from_slice(&page);
        let bytes = bytes::Bytes::from(file_bytes);
        let metadata = two_column_int32_metadata(page_len);

        let selected = vec!["a".to_string()];
        let batch = read_row_group(&bytes, &metadata, 0, Some(&selected), ExecutionMode::SequentialBatchedRead).unwrap();
        assert_eq!(batch.num_columns(), 1);
        let col = batch.column(0).as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(col.values(), &[1, 2, 3]);
    }

    fn assert_decodes_to_one_two_three(mode: ExecutionMode) {
        let bytes = bytes::Bytes::from(page_bytes());
        let metadata = flat_int32_metadata(bytes.len() as i64);
        let batch = read_row_group(&bytes, &metadata, 0, None, mode).unwrap();
        assert_eq!(batch.num_rows(), 3);
        let col = batch.column(0).as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(col.values(), &[1, 2, 3]);
    }

    #[test]
    fn sequential_batched_read_decodes_flat_required_column() {
        assert_decodes_to_one_two_three(ExecutionMode::SequentialBatchedRead);
    }

    #[test]
    fn sequential_bounded_memory_decodes_flat_required_column() {
        assert_decodes_to_one_two_three(ExecutionMode::SequentialBoundedMemory);
    }

    #[test]
    fn parallel_batched_read_decodes_flat_required_column() {
        assert_decodes_to_one_two_three(ExecutionMode::ParallelBatchedRead);
    }

    #[test]
    fn parallel_bounded_concurrency_decodes_flat_required_column() {
        assert_decodes_to_one_two_three(ExecutionMode::ParallelBoundedConcurrency);
    }

    #[test]
    fn out_of_range_row_group_index_errors() {
        let bytes = bytes::Bytes::from(page_bytes());
        let metadata = flat_int32_metadata(bytes.len() as i64);
        assert!(read_row_group(&bytes, &metadata, 1, None, ExecutionMode::SequentialBatchedRead).is_err());
    }
}
