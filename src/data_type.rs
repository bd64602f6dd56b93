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

//! Marker types binding a physical [`Type`](crate::basic::Type) to a Rust value
//! representation, plus the two value structs (`Int96`, `ByteArray`) the physical
//! layer needs that have no built-in Rust equivalent.

use crate::basic::Type;
use std::cmp::Ordering;

/// A 12-byte Parquet `INT96`, historically used for timestamps. No arithmetic is
/// defined on it; the type-mapping layer reinterprets the bytes as a nanosecond
/// timestamp where a numeric value is required.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int96([u32; 3]);

impl Int96 {
    pub fn new(v0: u32, v1: u32, v2: u32) -> Self {
        Int96([v0, v1, v2])
    }

    pub fn data(&self) -> &[u32; 3] {
        &self.0
    }

    /// Julian-day + nanosecond-of-day decomposition used by the legacy INT96
    /// timestamp convention: low 8 bytes are nanoseconds since midnight, high 4
    /// bytes are the Julian day number.
    pub fn to_nanos_since_epoch(&self) -> i64 {
        const JULIAN_DAY_OF_EPOCH: i64 = 2_440_588;
        const NANOS_PER_DAY: i64 = 86_400_000_000_000;
        let nanos_of_day = ((self.0[1] as i64) << 32) | (self.0[0] as i64);
        let day = self.0[2] as i64 - JULIAN_DAY_OF_EPOCH;
        day * NANOS_PER_DAY + nanos_of_day
    }
}

/// A reference-counted, immutable byte sequence used to represent `BYTE_ARRAY` and
/// `FIXED_LEN_BYTE_ARRAY` values without an extra copy when shared between the
/// dictionary and a decoded batch.
#[derive(Clone, Eq)]
pub struct ByteArray(bytes::Bytes);

impl ByteArray {
    pub fn new(data: bytes::Bytes) -> Self {
        ByteArray(data)
    }

    pub fn data(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ByteArray {
    fn from(v: Vec<u8>) -> Self {
        ByteArray(bytes::Bytes::from(v))
    }
}

impl From<&[u8]> for ByteArray {
    fn from(v: &[u8]) -> Self {
        ByteArray(bytes::Bytes::copy_from_slice(v))
    }
}

impl std::fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ByteArray({} bytes)", self.0.len())
    }
}

impl PartialEq for ByteArray {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl PartialOrd for ByteArray {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.0.cmp(&other.0))
    }
}

impl Ord for ByteArray {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// Binds a physical type to a fixed-width Rust value representation. Implemented
/// only for the fixed-width physical types; `ByteArray`/`FixedLenByteArray` are
/// handled specially throughout the decode pipeline since they are variable-width
/// (or externally-sized) and do not fit a `reserve_values::<T>()` slice.
pub trait DataType: 'static {
    type T: Copy + Default + Send + Sync;

    fn get_physical_type() -> Type;
}

macro_rules! make_type {
    ($name:ident, $physical_ty:expr, $native_ty:ty) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl DataType for $name {
            type T = $native_ty;

            fn get_physical_type() -> Type {
                $physical_ty
            }
        }
    };
}

make_type!(BoolType, Type::Boolean, bool);
make_type!(Int32Type, Type::Int32, i32);
make_type!(Int64Type, Type::Int64, i64);
make_type!(Int96Type, Type::Int96, Int96);
make_type!(FloatType, Type::Float, f32);
make_type!(DoubleType, Type::Double, f64);
