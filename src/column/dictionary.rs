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

//! Component F: the per-chunk dictionary cache. A tagged variant by physical type
//! (spec §9, "Tagged variants over inheritance"), immutable once loaded, holding at
//! most one dictionary per column chunk.

use crate::basic::Type;
use crate::data_type::{ByteArray, Int96};
use crate::errors::{general_err, Result};

#[derive(Debug, Clone)]
pub enum Dictionary {
    Boolean(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Int96(Vec<Int96>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    ByteArray(Vec<ByteArray>),
    FixedLenByteArray(Vec<ByteArray>),
}

impl Dictionary {
    pub fn len(&self) -> usize {
        match self {
            Dictionary::Boolean(v) => v.len(),
            Dictionary::Int32(v) => v.len(),
            Dictionary::Int64(v) => v.len(),
            Dictionary::Int96(v) => v.len(),
            Dictionary::Float(v) => v.len(),
            Dictionary::Double(v) => v.len(),
            Dictionary::ByteArray(v) => v.len(),
            Dictionary::FixedLenByteArray(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn physical_type(&self) -> Type {
        match self {
            Dictionary::Boolean(_) => Type::Boolean,
            Dictionary::Int32(_) => Type::Int32,
            Dictionary::Int64(_) => Type::Int64,
            Dictionary::Int96(_) => Type::Int96,
            Dictionary::Float(_) => Type::Float,
            Dictionary::Double(_) => Type::Double,
            Dictionary::ByteArray(_) => Type::ByteArray,
            Dictionary::FixedLenByteArray(_) => Type::FixedLenByteArray,
        }
    }

    /// Resolves `indices` against this dictionary, producing a fresh byte-array
    /// batch. Used for `ByteArray`/`FixedLenByteArray` columns, which per spec §4.D
    /// "must not reference dictionary storage by borrow": the decoder always
    /// copies into a batch-sized buffer.
    pub fn gather_byte_array(&self, indices: &[i32]) -> Result<Vec<ByteArray>> {
        let values = match self {
            Dictionary::ByteArray(v) | Dictionary::FixedLenByteArray(v) => v,
            other => {
                return Err(general_err!(
                    "dictionary of physical type {:?} cannot be gathered as byte arrays",
                    other.physical_type()
                ))
            }
        };
        gather(values, indices)
    }

    pub fn gather_bool(&self, indices: &[i32]) -> Result<Vec<bool>> {
        match self {
            Dictionary::Boolean(v) => gather(v, indices),
            other => Err(mismatch(other, Type::Boolean)),
        }
    }

    pub fn gather_i32(&self, indices: &[i32]) -> Result<Vec<i32>> {
        match self {
            Dictionary::Int32(v) => gather(v, indices),
            other => Err(mismatch(other, Type::Int32)),
        }
    }

    pub fn gather_i64(&self, indices: &[i32]) -> Result<Vec<i64>> {
        match self {
            Dictionary::Int64(v) => gather(v, indices),
            other => Err(mismatch(other, Type::Int64)),
        }
    }

    pub fn gather_int96(&self, indices: &[i32]) -> Result<Vec<Int96>> {
        match self {
            Dictionary::Int96(v) => gather(v, indices),
            other => Err(mismatch(other, Type::Int96)),
        }
    }

    pub fn gather_f32(&self, indices: &[i32]) -> Result<Vec<f32>> {
        match self {
            Dictionary::Float(v) => gather(v, indices),
            other => Err(mismatch(other, Type::Float)),
        }
    }

    pub fn gather_f64(&self, indices: &[i32]) -> Result<Vec<f64>> {
        match self {
            Dictionary::Double(v) => gather(v, indices),
            other => Err(mismatch(other, Type::Double)),
        }
    }
}

fn mismatch(found: &Dictionary, expected: Type) -> crate::errors::ParquetError {
    general_err!(
        "dictionary physical type {:?} does not match expected {:?}",
        found.physical_type(),
        expected
    )
}

fn gather<T: Clone>(values: &[T], indices: &[i32]) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(indices.len());
    for &idx in indices {
        let idx = idx as usize;
        let v = values
            .get(idx)
            .ok_or_else(|| general_err!("dictionary index {} out of range [0, {})", idx, values.len()))?;
        out.push(v.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gather_resolves_indices_in_order() {
        let dict = Dictionary::Int32(vec![10, 20, 30]);
        let resolved = dict.gather_i32(&[2, 0, 1, 1]).unwrap();
        assert_eq!(resolved, vec![30, 10, 20, 20]);
    }

    #[test]
    fn gather_out_of_range_index_errors() {
        let dict = Dictionary::Int32(vec![10, 20]);
        assert!(dict.gather_i32(&[5]).is_err());
    }

    #[test]
    fn gather_wrong_variant_errors() {
        let dict = Dictionary::Int32(vec![10, 20]);
        assert!(dict.gather_f64(&[0]).is_err());
    }
}
