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

//! Component J: turns one leaf's [`ColumnBuildState`] (already consumed into its
//! parts) into a flat Arrow array. Required/optional columns scatter the dense
//! values back out to `row_count` positions; repeated columns scatter to
//! `num_values` positions instead and leave the rest to the nested assembler
//! (component K, spec §4.K) by way of the level streams it receives alongside.

use arrow_array::{make_array, ArrayRef};
use arrow_buffer::Buffer;
use arrow_data::ArrayData;
use arrow_schema::DataType;

use crate::column::build_state::ValueStorage;
use crate::data_type::Int96;
use crate::errors::{general_err, Result};
use crate::util::memory::{build_validity_bitmap, TypedBuffer};

/// Builds the flat Arrow array for one leaf. `physical_len` is `row_count` for
/// a non-repeated column and `def_levels.len()` (== `num_values`) for a
/// repeated one (spec §4.J, "Repeated column").
pub fn build_leaf_array(
    storage: ValueStorage,
    data_type: &DataType,
    def_levels: &[i32],
    max_def_level: i32,
    max_rep_level: i32,
    row_count: usize,
) -> Result<ArrayRef> {
    let len = if max_rep_level > 0 { def_levels.len() } else { row_count };
    let validity = if max_def_level > 0 {
        Some(build_validity_bitmap(len, |i| def_levels[i] == max_def_level).0)
    } else {
        None
    };
    match storage {
        ValueStorage::Boolean(values) => build_boolean_array(&values, validity, def_levels, max_def_level, len),
        ValueStorage::Int32(values) => build_int32_like_array(&values, data_type, validity, def_levels, max_def_level, len),
        ValueStorage::Int64(values) => build_int64_like_array(&values, data_type, validity, def_levels, max_def_level, len),
        ValueStorage::Int96(values) => build_int96_timestamp_array(&values, validity, def_levels, max_def_level, len),
        ValueStorage::Float(values) => {
            let scattered = scatter(&values, def_levels, max_def_level, len);
            finish_array(DataType::Float32, len, validity, build_numeric_buffer(&scattered))
        }
        ValueStorage::Double(values) => {
            let scattered = scatter(&values, def_levels, max_def_level, len);
            finish_array(DataType::Float64, len, validity, build_numeric_buffer(&scattered))
        }
        ValueStorage::ByteArray { offsets, data } => {
            build_byte_array_array(offsets, data, data_type.clone(), validity, def_levels, max_def_level, len)
        }
        ValueStorage::FixedLenByteArray { data, width } => {
            build_fixed_len_array(data, width, data_type.clone(), validity, def_levels, max_def_level, len)
        }
    }
}

/// Scatters `dense` (one entry per non-null position) back out to `len`
/// positions, leaving a default value at every position the def levels mark
/// null. A no-op copy when the column has no nulls at all (`dense.len() ==
/// len`), the common required-column case.
fn scatter<T: Copy + Default>(dense: &[T], def_levels: &[i32], max_def_level: i32, len: usize) -> Vec<T> {
    if dense.len() == len {
        return dense.to_vec();
    }
    let mut out = vec![T::default(); len];
    let mut cursor = 0usize;
    for (i, slot) in out.iter_mut().enumerate() {
        if def_levels[i] == max_def_level {
            *slot = dense[cursor];
            cursor += 1;
        }
    }
    out
}

fn build_numeric_buffer<T: crate::util::memory::ArrowNativeTypeMarker>(values: &[T]) -> Buffer {
    let mut buf = TypedBuffer::<T>::with_capacity(values.len());
    buf.reserve(values.len()).copy_from_slice(values);
    buf.into_buffer()
}

fn finish_array(data_type: DataType, len: usize, validity: Option<Buffer>, value_buffer: Buffer) -> Result<ArrayRef> {
    let mut builder = ArrayData::builder(data_type).len(len).add_buffer(value_buffer);
    if let Some(v) = validity {
        builder = builder.null_bit_buffer(Some(v));
    }
    Ok(make_array(builder.build()?))
}

fn build_boolean_array(
    dense: &[bool],
    validity: Option<Buffer>,
    def_levels: &[i32],
    max_def_level: i32,
    len: usize,
) -> Result<ArrayRef> {
    let scattered = if dense.len() == len {
        dense.to_vec()
    } else {
        let mut out = vec![false; len];
        let mut cursor = 0usize;
        for (i, slot) in out.iter_mut().enumerate() {
            if def_levels[i] == max_def_level {
                *slot = dense[cursor];
                cursor += 1;
            }
        }
        out
    };
    let (value_buffer, _) = build_validity_bitmap(len, |i| scattered[i]);
    finish_array(DataType::Boolean, len, validity, value_buffer)
}

macro_rules! narrowing_cast {
    ($name:ident, $dst:ty) => {
        fn $name(values: &[i32], is_valid: impl Fn(usize) -> bool) -> Result<Vec<$dst>> {
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    if !is_valid(i) {
                        return Ok(<$dst>::default());
                    }
                    <$dst>::try_from(v)
                        .map_err(|_| general_err!("value {} does not fit the narrowed INTEGER logical type", v))
                })
                .collect()
        }
    };
}
narrowing_cast!(narrow_to_i8, i8);
narrowing_cast!(narrow_to_i16, i16);
narrowing_cast!(narrow_to_u8, u8);
narrowing_cast!(narrow_to_u16, u16);

fn build_int32_like_array(
    dense: &[i32],
    data_type: &DataType,
    validity: Option<Buffer>,
    def_levels: &[i32],
    max_def_level: i32,
    len: usize,
) -> Result<ArrayRef> {
    let scattered = scatter(dense, def_levels, max_def_level, len);
    let is_valid = |i: usize| max_def_level == 0 || def_levels[i] == max_def_level;
    match data_type {
        DataType::Int32 | DataType::Date32 | DataType::Time32(_) => {
            finish_array(data_type.clone(), len, validity, build_numeric_buffer(&scattered))
        }
        DataType::Int8 => {
            let narrowed = narrow_to_i8(&scattered, is_valid)?;
            finish_array(data_type.clone(), len, validity, build_numeric_buffer(&narrowed))
        }
        DataType::Int16 => {
            let narrowed = narrow_to_i16(&scattered, is_valid)?;
            finish_array(data_type.clone(), len, validity, build_numeric_buffer(&narrowed))
        }
        DataType::UInt8 => {
            let narrowed = narrow_to_u8(&scattered, is_valid)?;
            finish_array(data_type.clone(), len, validity, build_numeric_buffer(&narrowed))
        }
        DataType::UInt16 => {
            let narrowed = narrow_to_u16(&scattered, is_valid)?;
            finish_array(data_type.clone(), len, validity, build_numeric_buffer(&narrowed))
        }
        DataType::UInt32 => {
            let bitcast: Vec<u32> = scattered.iter().map(|&v| v as u32).collect();
            finish_array(data_type.clone(), len, validity, build_numeric_buffer(&bitcast))
        }
        other => Err(general_err!("physical INT32 cannot be materialized as arrow type {:?}", other)),
    }
}

fn build_int64_like_array(
    dense: &[i64],
    data_type: &DataType,
    validity: Option<Buffer>,
    def_levels: &[i32],
    max_def_level: i32,
    len: usize,
) -> Result<ArrayRef> {
    let scattered = scatter(dense, def_levels, max_def_level, len);
    match data_type {
        DataType::Int64 | DataType::Timestamp(_, _) | DataType::Time64(_) => {
            finish_array(data_type.clone(), len, validity, build_numeric_buffer(&scattered))
        }
        DataType::UInt64 => {
            let bitcast: Vec<u64> = scattered.iter().map(|&v| v as u64).collect();
            finish_array(data_type.clone(), len, validity, build_numeric_buffer(&bitcast))
        }
        other => Err(general_err!("physical INT64 cannot be materialized as arrow type {:?}", other)),
    }
}

fn build_int96_timestamp_array(
    dense: &[Int96],
    validity: Option<Buffer>,
    def_levels: &[i32],
    max_def_level: i32,
    len: usize,
) -> Result<ArrayRef> {
    let nanos: Vec<i64> = dense.iter().map(Int96::to_nanos_since_epoch).collect();
    let scattered = scatter(&nanos, def_levels, max_def_level, len);
    finish_array(
        DataType::Timestamp(arrow_schema::TimeUnit::Nanosecond, None),
        len,
        validity,
        build_numeric_buffer(&scattered),
    )
}

/// Rebuilds the offsets buffer so a null row repeats the preceding offset
/// (zero-width gap); the data buffer is reused as-is (spec §4.J).
fn build_byte_array_array(
    offsets: Vec<i32>,
    data: Vec<u8>,
    data_type: DataType,
    validity: Option<Buffer>,
    def_levels: &[i32],
    max_def_level: i32,
    len: usize,
) -> Result<ArrayRef> {
    let value_count = offsets.len() - 1;
    let new_offsets = if value_count == len {
        offsets
    } else {
        let mut out = Vec::with_capacity(len + 1);
        out.push(0i32);
        let mut cursor = 0usize;
        for i in 0..len {
            if def_levels[i] == max_def_level {
                cursor += 1;
            }
            out.push(offsets[cursor]);
        }
        out
    };
    let offsets_buf = build_numeric_buffer(&new_offsets);
    let data_buf = Buffer::from(data);
    let mut builder = ArrayData::builder(data_type)
        .len(len)
        .add_buffer(offsets_buf)
        .add_buffer(data_buf);
    if let Some(v) = validity {
        builder = builder.null_bit_buffer(Some(v));
    }
    Ok(make_array(builder.build()?))
}

/// Scatters fixed-width chunks into a new `len * width` buffer, zero-filling
/// null positions; `width` is validated against the `FixedSizeBinary` arrow
/// type the schema walk already chose.
fn build_fixed_len_array(
    data: Vec<u8>,
    stored_width: Option<usize>,
    data_type: DataType,
    validity: Option<Buffer>,
    def_levels: &[i32],
    max_def_level: i32,
    len: usize,
) -> Result<ArrayRef> {
    let width = match &data_type {
        DataType::FixedSizeBinary(w) => *w as usize,
        other => return Err(general_err!("physical FIXED_LEN_BYTE_ARRAY cannot be materialized as arrow type {:?}", other)),
    };
    if let Some(w) = stored_width {
        if w != width {
            return Err(general_err!("FixedLenByteArray stored width {} disagrees with arrow width {}", w, width));
        }
    }
    let value_count = if width == 0 { 0 } else { data.len() / width };
    let new_data = if value_count == len {
        data
    } else {
        let mut out = vec![0u8; len * width];
        let mut cursor = 0usize;
        for i in 0..len {
            if def_levels[i] == max_def_level {
                out[i * width..(i + 1) * width].copy_from_slice(&data[cursor * width..(cursor + 1) * width]);
                cursor += 1;
            }
        }
        out
    };
    let data_buf = Buffer::from(new_data);
    let mut builder = ArrayData::builder(data_type).len(len).add_buffer(data_buf);
    if let Some(v) = validity {
        builder = builder.null_bit_buffer(Some(v));
    }
    Ok(make_array(builder.build()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Array, Int32Array, StringArray};

    #[test]
    fn required_int32_column_builds_dense_array() {
        let storage = ValueStorage::Int32(vec![1, 2, 3]);
        let array = build_leaf_array(storage, &DataType::Int32, &[], 0, 0, 3).unwrap();
        let array = array.as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(array.values(), &[1, 2, 3]);
        assert_eq!(array.null_count(), 0);
    }

    #[test]
    fn optional_int32_column_scatters_nulls() {
        let storage = ValueStorage::Int32(vec![10, 30]);
        let def_levels = [1, 0, 1];
        let array = build_leaf_array(storage, &DataType::Int32, &def_levels, 1, 0, 3).unwrap();
        let array = array.as_any().downcast_ref::<Int32Array>().unwrap();
        assert!(array.is_valid(0));
        assert!(array.is_null(1));
        assert!(array.is_valid(2));
        assert_eq!(array.value(0), 10);
        assert_eq!(array.value(2), 30);
    }

    #[test]
    fn integer_logical_type_narrows_and_rejects_out_of_range() {
        let storage = ValueStorage::Int32(vec![1, 300]);
        let err = build_leaf_array(storage, &DataType::Int8, &[], 0, 0, 2);
        assert!(err.is_err());
    }

    #[test]
    fn optional_utf8_column_repeats_preceding_offset_at_nulls() {
        let storage = ValueStorage::ByteArray {
            offsets: vec![0, 2, 4],
            data: b"abcd".to_vec(),
        };
        let def_levels = [1, 0, 1];
        let array = build_leaf_array(storage, &DataType::Utf8, &def_levels, 1, 0, 3).unwrap();
        let array = array.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(array.value(0), "ab");
        assert!(array.is_null(1));
        assert_eq!(array.value(2), "cd");
    }

    #[test]
    fn repeated_column_scatters_to_num_values_not_row_count() {
        // Two physical entries (num_values=2) feeding a single row via repetition.
        let storage = ValueStorage::Int32(vec![7, 9]);
        let def_levels = [3, 3];
        let array = build_leaf_array(storage, &DataType::Int32, &def_levels, 3, 1, 1).unwrap();
        assert_eq!(array.len(), 2);
    }
}
