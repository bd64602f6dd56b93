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

//! 64-byte aligned native buffer helpers backing `ColumnBuildState` (component H).
//! `arrow_buffer::MutableBuffer` already allocates with Arrow's alignment and growth
//! policy, so this module is a thin, typed front door rather than a reimplementation.

use arrow_buffer::{Buffer, MutableBuffer};

/// A growable, 64-byte aligned buffer of `T`, pre-sized where the caller knows the
/// final capacity (the hot path described in spec §4.H) and otherwise doubling.
pub struct TypedBuffer<T: ArrowNativeTypeMarker> {
    inner: MutableBuffer,
    len: usize,
    _marker: std::marker::PhantomData<T>,
}

/// Marker for fixed-width types storable directly in an `arrow_buffer::Buffer`.
pub trait ArrowNativeTypeMarker: Copy + Default {}
impl ArrowNativeTypeMarker for bool {}
impl ArrowNativeTypeMarker for i8 {}
impl ArrowNativeTypeMarker for i16 {}
impl ArrowNativeTypeMarker for i32 {}
impl ArrowNativeTypeMarker for i64 {}
impl ArrowNativeTypeMarker for u8 {}
impl ArrowNativeTypeMarker for u16 {}
impl ArrowNativeTypeMarker for u32 {}
impl ArrowNativeTypeMarker for u64 {}
impl ArrowNativeTypeMarker for f32 {}
impl ArrowNativeTypeMarker for f64 {}

impl<T: ArrowNativeTypeMarker> TypedBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        TypedBuffer {
            inner: MutableBuffer::new(capacity * std::mem::size_of::<T>()),
            len: 0,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reserves `n` more writable slots at the end of the buffer and returns a
    /// mutable slice covering exactly them. Never reallocates beyond the initial
    /// capacity plan except via `MutableBuffer`'s own doubling growth.
    pub fn reserve(&mut self, n: usize) -> &mut [T] {
        let byte_len = (self.len + n) * std::mem::size_of::<T>();
        if self.inner.len() < byte_len {
            self.inner.resize(byte_len, 0);
        }
        let start = self.len;
        self.len += n;
        let typed: &mut [T] = unsafe {
            std::slice::from_raw_parts_mut(self.inner.as_mut_ptr() as *mut T, self.len)
        };
        &mut typed[start..self.len]
    }

    pub fn as_slice(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.inner.as_ptr() as *const T, self.len) }
    }

    /// Transfers ownership of the native allocation into an immutable Arrow buffer.
    pub fn into_buffer(mut self) -> Buffer {
        self.inner.resize(self.len * std::mem::size_of::<T>(), 0);
        self.inner.into()
    }
}

/// A growable byte buffer for variable-width data (the byte-array data buffer of
/// `ColumnBuildState`), doubling at minimum per spec §4.H.
pub struct ByteBuffer {
    inner: MutableBuffer,
}

impl ByteBuffer {
    pub fn with_capacity(byte_capacity: usize) -> Self {
        ByteBuffer {
            inner: MutableBuffer::new(byte_capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.inner.extend_from_slice(data);
    }

    pub fn as_slice(&self) -> &[u8] {
        self.inner.as_slice()
    }

    pub fn into_buffer(self) -> Buffer {
        self.inner.into()
    }
}

/// Builds a validity bitmap (LSB-first, 1 = valid) from a predicate evaluated over
/// `len` row positions. Shared by the flat array builder (J) and the nested
/// assembler (K), both of which derive validity from a definition-level threshold.
pub fn build_validity_bitmap<F: FnMut(usize) -> bool>(len: usize, mut is_valid: F) -> (Buffer, usize) {
    let mut buffer = MutableBuffer::new(ceil_div_bytes(len));
    buffer.resize(ceil_div_bytes(len), 0);
    let bytes = buffer.as_slice_mut();
    let mut null_count = 0usize;
    for i in 0..len {
        if is_valid(i) {
            bytes[i / 8] |= 1 << (i % 8);
        } else {
            null_count += 1;
        }
    }
    (buffer.into(), null_count)
}

fn ceil_div_bytes(n_bits: usize) -> usize {
    (n_bits + 7) / 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_buffer_reserve_and_build() {
        let mut buf = TypedBuffer::<i32>::with_capacity(4);
        {
            let slice = buf.reserve(3);
            slice.copy_from_slice(&[1, 2, 3]);
        }
        assert_eq!(buf.as_slice(), &[1, 2, 3]);
        let built = buf.into_buffer();
        assert_eq!(built.len(), 12);
    }

    #[test]
    fn validity_bitmap_matches_predicate() {
        let (buf, nulls) = build_validity_bitmap(10, |i| i % 3 != 0);
        assert_eq!(nulls, 4); // 0,3,6,9
        let bytes = buf.as_slice();
        assert_eq!(bytes[0] & 1, 0); // row 0 invalid
        assert_eq!((bytes[0] >> 1) & 1, 1); // row 1 valid
    }
}
