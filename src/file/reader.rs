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

//! SPEC_FULL.md §4.P / spec §6.1: the random-access byte-range contract the core
//! consumes. `Length` + `ChunkReader` are implemented here for `std::fs::File` and
//! `bytes::Bytes`; both satisfy the "owned buffer, exact length" contract.

use crate::errors::Result;
use std::fs::File;
use std::io::{self, Read};
use std::sync::Arc;

/// Something with a known byte length.
pub trait Length {
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A source of byte ranges. `get_read` returns a `Read` scoped to exactly
/// `[start, start+length)`; the caller then reads exactly `length` bytes from it.
pub trait ChunkReader: Length + Send + Sync {
    type T: Read;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T>;

    /// Reads and returns an owned buffer of exactly `length` bytes at `start`.
    fn get_bytes(&self, start: u64, length: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; length];
        self.get_read(start, length)?.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Batch form of `get_bytes`, returned in input order (spec §6.1 `read_ranges`).
    /// No concurrency is implied here; the row-group orchestrator is the layer
    /// that parallelizes across chunks.
    fn read_ranges(&self, ranges: &[(u64, usize)]) -> Result<Vec<Vec<u8>>> {
        ranges
            .iter()
            .map(|&(start, length)| self.get_bytes(start, length))
            .collect()
    }
}

impl Length for File {
    fn len(&self) -> u64 {
        self.metadata().map(|m| m.len()).unwrap_or(0)
    }
}

/// A bounded window over a `File`, reading from `offset` up to `offset + length`.
pub struct FileSource<R> {
    reader: Arc<std::sync::Mutex<R>>,
    start: u64,
    end: u64,
    pos: u64,
}

impl<R> FileSource<R> {
    pub fn new(reader: &R, start: u64, length: usize) -> Self
    where
        R: TryCloneFile,
    {
        FileSource {
            reader: Arc::new(std::sync::Mutex::new(reader.try_clone_file())),
            start,
            end: start + length as u64,
            pos: start,
        }
    }
}

/// Narrow cloning contract so `FileSource` can hold its own file handle/cursor
/// independent of the reader it was constructed from.
pub trait TryCloneFile {
    fn try_clone_file(&self) -> Self;
}

impl TryCloneFile for File {
    fn try_clone_file(&self) -> Self {
        self.try_clone().expect("failed to clone file handle")
    }
}

impl<R: Read + std::io::Seek> Read for FileSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut guard = self.reader.lock().unwrap();
        if self.pos >= self.end {
            return Ok(0);
        }
        let remaining = (self.end - self.pos) as usize;
        let to_read = remaining.min(buf.len());
        guard.seek(std::io::SeekFrom::Start(self.pos))?;
        let n = guard.read(&mut buf[..to_read])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl ChunkReader for File {
    type T = FileSource<File>;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T> {
        Ok(FileSource::new(self, start, length))
    }
}

impl Length for bytes::Bytes {
    fn len(&self) -> u64 {
        bytes::Buf::remaining(self) as u64
    }
}

impl ChunkReader for bytes::Bytes {
    type T = bytes::buf::Reader<bytes::Bytes>;

    fn get_read(&self, start: u64, length: usize) -> Result<Self::T> {
        use bytes::Buf;
        let start = start as usize;
        Ok(self.slice(start..start + length).reader())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_chunk_reader_returns_exact_range() {
        let data = bytes::Bytes::from_static(b"0123456789");
        let slice = data.get_bytes(3, 4).unwrap();
        assert_eq!(slice, b"3456");
    }

    #[test]
    fn bytes_read_ranges_preserves_order() {
        let data = bytes::Bytes::from_static(b"abcdefghij");
        let out = data.read_ranges(&[(0, 3), (5, 2)]).unwrap();
        assert_eq!(out, vec![b"abc".to_vec(), b"fg".to_vec()]);
    }
}
