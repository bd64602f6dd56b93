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

//! Component H: the per-column, per-row-group mutable accumulator. Holds dense
//! non-null values plus raw def/rep level streams in native buffers pre-sized to
//! the chunk's capacity (spec §3, §4.H).

use crate::basic::Type;
use crate::data_type::{ByteArray, Int96};
use crate::errors::{general_err, Result};

/// The typed value storage, one of spec §3's four shapes. `width` for
/// `FixedLenByteArray` is established lazily on first write, per spec §4.H.
#[derive(Debug)]
pub enum ValueStorage {
    Boolean(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int96(Vec<Int96>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ByteArray { offsets: Vec<i32>, data: Vec<u8> },
    FixedLenByteArray { data: Vec<u8>, width: Option<usize> },
}

impl ValueStorage {
    fn new(physical_type: Type, capacity: usize) -> Self {
        match physical_type {
            Type::Boolean => ValueStorage::Boolean(Vec::with_capacity(capacity)),
            Type::Int32 => ValueStorage::Int32(Vec::with_capacity(capacity)),
            Type::Int64 => ValueStorage::Int64(Vec::with_capacity(capacity)),
            Type::Int96 => ValueStorage::Int96(Vec::with_capacity(capacity)),
            Type::Float => ValueStorage::Float(Vec::with_capacity(capacity)),
            Type::Double => ValueStorage::Double(Vec::with_capacity(capacity)),
            Type::ByteArray => ValueStorage::ByteArray {
                offsets: {
                    let mut v = Vec::with_capacity(capacity + 1);
                    v.push(0);
                    v
                },
                data: Vec::new(),
            },
            Type::FixedLenByteArray => ValueStorage::FixedLenByteArray {
                data: Vec::new(),
                width: None,
            },
        }
    }

    pub fn value_count(&self) -> usize {
        match self {
            ValueStorage::Boolean(v) => v.len(),
            ValueStorage::Int32(v) => v.len(),
            ValueStorage::Int64(v) => v.len(),
            ValueStorage::Int96(v) => v.len(),
            ValueStorage::Float(v) => v.len(),
            ValueStorage::Double(v) => v.len(),
            ValueStorage::ByteArray { offsets, .. } => offsets.len() - 1,
            ValueStorage::FixedLenByteArray { data, width } => {
                width.map(|w| if w == 0 { 0 } else { data.len() / w }).unwrap_or(0)
            }
        }
    }
}

/// The per-column accumulator itself. `capacity` is `num_values` when the column is
/// repeated, else the row-group's row count (spec §4.G).
pub struct ColumnBuildState {
    pub max_def_level: i32,
    pub max_rep_level: i32,
    def_levels: Vec<i32>,
    rep_levels: Vec<i32>,
    pub storage: ValueStorage,
}

impl ColumnBuildState {
    pub fn new(physical_type: Type, max_def_level: i32, max_rep_level: i32, capacity: usize) -> Self {
        ColumnBuildState {
            max_def_level,
            max_rep_level,
            def_levels: if max_def_level > 0 {
                Vec::with_capacity(capacity)
            } else {
                Vec::new()
            },
            rep_levels: if max_rep_level > 0 {
                Vec::with_capacity(capacity)
            } else {
                Vec::new()
            },
            storage: ValueStorage::new(physical_type, capacity),
        }
    }

    /// Consumes the accumulator, handing its parts to the Arrow array builder
    /// (component J). Once called, the column's native buffers are owned by
    /// whatever Arrow buffers the builder constructs from them (spec §4.H, "on
    /// build(), each native buffer is transferred").
    pub fn into_parts(self) -> (i32, i32, Vec<i32>, Vec<i32>, ValueStorage) {
        (self.max_def_level, self.max_rep_level, self.def_levels, self.rep_levels, self.storage)
    }

    pub fn has_def_levels(&self) -> bool {
        self.max_def_level > 0
    }

    pub fn has_rep_levels(&self) -> bool {
        self.max_rep_level > 0
    }

    pub fn append_def_levels(&mut self, levels: &[i32]) {
        self.def_levels.extend_from_slice(levels);
    }

    pub fn append_rep_levels(&mut self, levels: &[i32]) {
        self.rep_levels.extend_from_slice(levels);
    }

    pub fn def_levels(&self) -> &[i32] {
        &self.def_levels
    }

    pub fn rep_levels(&self) -> &[i32] {
        &self.rep_levels
    }

    /// Non-null count for a page, per spec §4.G: positions where
    /// `def_levels[i] == max_def_level` within the most recently appended range.
    pub fn count_non_null(def_levels: &[i32], max_def_level: i32) -> usize {
        def_levels.iter().filter(|&&d| d == max_def_level).count()
    }

    pub fn add_bool_values(&mut self, values: &[bool]) -> Result<()> {
        match &mut self.storage {
            ValueStorage::Boolean(v) => {
                v.extend_from_slice(values);
                Ok(())
            }
            other => Err(type_mismatch(other, "Boolean")),
        }
    }

    pub fn add_i32_values(&mut self, values: &[i32]) -> Result<()> {
        match &mut self.storage {
            ValueStorage::Int32(v) => {
                v.extend_from_slice(values);
                Ok(())
            }
            other => Err(type_mismatch(other, "Int32")),
        }
    }

    pub fn add_i64_values(&mut self, values: &[i64]) -> Result<()> {
        match &mut self.storage {
            ValueStorage::Int64(v) => {
                v.extend_from_slice(values);
                Ok(())
            }
            other => Err(type_mismatch(other, "Int64")),
        }
    }

    pub fn add_int96_values(&mut self, values: &[Int96]) -> Result<()> {
        match &mut self.storage {
            ValueStorage::Int96(v) => {
                v.extend_from_slice(values);
                Ok(())
            }
            other => Err(type_mismatch(other, "Int96")),
        }
    }

    pub fn add_f32_values(&mut self, values: &[f32]) -> Result<()> {
        match &mut self.storage {
            ValueStorage::Float(v) => {
                v.extend_from_slice(values);
                Ok(())
            }
            other => Err(type_mismatch(other, "Float")),
        }
    }

    pub fn add_f64_values(&mut self, values: &[f64]) -> Result<()> {
        match &mut self.storage {
            ValueStorage::Double(v) => {
                v.extend_from_slice(values);
                Ok(())
            }
            other => Err(type_mismatch(other, "Double")),
        }
    }

    /// Appends `n` byte-array values, copying `data` and shifting `offsets` by the
    /// existing data cursor, per spec §4.H.
    pub fn add_byte_array_values(&mut self, values: &[ByteArray]) -> Result<()> {
        match &mut self.storage {
            ValueStorage::ByteArray { offsets, data } => {
                for v in values {
                    data.extend_from_slice(v.data());
                    offsets.push(data.len() as i32);
                }
                Ok(())
            }
            other => Err(type_mismatch(other, "ByteArray")),
        }
    }

    /// Appends `n` fixed-length values of `width` bytes each. `width` is fixed on
    /// first call; subsequent calls must agree.
    pub fn add_fixed_len_byte_array_values(&mut self, values: &[ByteArray], width: usize) -> Result<()> {
        match &mut self.storage {
            ValueStorage::FixedLenByteArray { data, width: w } => {
                match w {
                    None => *w = Some(width),
                    Some(existing) if *existing != width => {
                        return Err(general_err!(
                            "FixedLenByteArray width changed from {} to {} mid-chunk",
                            existing,
                            width
                        ))
                    }
                    _ => {}
                }
                for v in values {
                    if v.len() != width {
                        return Err(general_err!(
                            "FixedLenByteArray value has length {}, expected {}",
                            v.len(),
                            width
                        ));
                    }
                    data.extend_from_slice(v.data());
                }
                Ok(())
            }
            other => Err(type_mismatch(other, "FixedLenByteArray")),
        }
    }
}

fn type_mismatch(storage: &ValueStorage, expected: &str) -> crate::errors::ParquetError {
    let found = match storage {
        ValueStorage::Boolean(_) => "Boolean",
        ValueStorage::Int32(_) => "Int32",
        ValueStorage::Int64(_) => "Int64",
        ValueStorage::Int96(_) => "Int96",
        ValueStorage::Float(_) => "Float",
        ValueStorage::Double(_) => "Double",
        ValueStorage::ByteArray { .. } => "ByteArray",
        ValueStorage::FixedLenByteArray { .. } => "FixedLenByteArray",
    };
    general_err!(
        "column build state holds {} storage, cannot append {} values",
        found,
        expected
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_array_invariant_offsets_len_is_value_count_plus_one() {
        let mut state = ColumnBuildState::new(Type::ByteArray, 0, 0, 4);
        let values = vec![ByteArray::from(b"ab".to_vec()), ByteArray::from(b"".to_vec())];
        state.add_byte_array_values(&values).unwrap();
        match &state.storage {
            ValueStorage::ByteArray { offsets, data } => {
                assert_eq!(offsets, &vec![0, 2, 2]);
                assert_eq!(data, b"ab");
            }
            _ => panic!("wrong storage"),
        }
    }

    #[test]
    fn non_null_count_matches_max_def_level_positions() {
        let levels = [2, 1, 2, 0, 2];
        assert_eq!(ColumnBuildState::count_non_null(&levels, 2), 3);
    }

    #[test]
    fn fixed_len_byte_array_rejects_width_change() {
        let mut state = ColumnBuildState::new(Type::FixedLenByteArray, 0, 0, 2);
        let a = vec![ByteArray::from(vec![1, 2])];
        state.add_fixed_len_byte_array_values(&a, 2).unwrap();
        let b = vec![ByteArray::from(vec![1, 2, 3])];
        assert!(state.add_fixed_len_byte_array_values(&b, 3).is_err());
    }
}
