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

//! SPEC_FULL.md §4.O: compression codec bindings. The core decode pipeline only
//! ever calls `decompress`; `Uncompressed` is special-cased by its caller to a
//! no-op borrow and never reaches `create_codec`.

use crate::basic::Compression;
use crate::errors::{general_err, nyi_err, Result};

/// A single column chunk's decompressor. Implementations may hold scratch state
/// (e.g. a reusable zstd context) across pages within the same chunk.
pub trait Codec: Send {
    /// Decompresses `src` into `dst`, clearing it first and leaving exactly
    /// `uncompressed_size` bytes in it. `uncompressed_size` comes from the page
    /// header and lets codecs without self-describing output length (LZ4_RAW) size
    /// their target buffer up front.
    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>, uncompressed_size: usize) -> Result<()>;
}

pub fn create_codec(codec: Compression) -> Result<Option<Box<dyn Codec>>> {
    match codec {
        Compression::Uncompressed => Ok(None),
        #[cfg(feature = "snap")]
        Compression::Snappy => Ok(Some(Box::new(SnappyCodec))),
        #[cfg(not(feature = "snap"))]
        Compression::Snappy => Err(nyi_err!("snappy support not compiled in")),
        #[cfg(feature = "flate2")]
        Compression::Gzip => Ok(Some(Box::new(GzipCodec))),
        #[cfg(not(feature = "flate2"))]
        Compression::Gzip => Err(nyi_err!("gzip support not compiled in")),
        #[cfg(feature = "brotli")]
        Compression::Brotli => Ok(Some(Box::new(BrotliCodec))),
        #[cfg(not(feature = "brotli"))]
        Compression::Brotli => Err(nyi_err!("brotli support not compiled in")),
        #[cfg(feature = "zstd")]
        Compression::Zstd => Ok(Some(Box::new(ZstdCodec))),
        #[cfg(not(feature = "zstd"))]
        Compression::Zstd => Err(nyi_err!("zstd support not compiled in")),
        #[cfg(feature = "lz4")]
        Compression::Lz4 => Ok(Some(Box::new(Lz4HadoopCodec))),
        #[cfg(not(feature = "lz4"))]
        Compression::Lz4 => Err(nyi_err!("lz4 support not compiled in")),
        #[cfg(feature = "lz4")]
        Compression::Lz4Raw => Ok(Some(Box::new(Lz4RawCodec))),
        #[cfg(not(feature = "lz4"))]
        Compression::Lz4Raw => Err(nyi_err!("lz4_raw support not compiled in")),
    }
}

#[cfg(feature = "snap")]
struct SnappyCodec;

#[cfg(feature = "snap")]
impl Codec for SnappyCodec {
    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>, uncompressed_size: usize) -> Result<()> {
        let mut decoder = snap::raw::Decoder::new();
        let decoded = decoder
            .decompress_vec(src)
            .map_err(|e| general_err!("snappy decompression failed: {}", e))?;
        if decoded.len() != uncompressed_size {
            return Err(general_err!(
                "snappy block declared {} bytes but produced {}",
                uncompressed_size,
                decoded.len()
            ));
        }
        dst.clear();
        dst.extend_from_slice(&decoded);
        Ok(())
    }
}

#[cfg(feature = "flate2")]
struct GzipCodec;

#[cfg(feature = "flate2")]
impl Codec for GzipCodec {
    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>, uncompressed_size: usize) -> Result<()> {
        use std::io::Read;
        dst.clear();
        let mut decoder = flate2::read::MultiGzDecoder::new(src);
        decoder
            .read_to_end(dst)
            .map_err(|e| general_err!("gzip decompression failed: {}", e))?;
        if dst.len() != uncompressed_size {
            return Err(general_err!(
                "gzip block declared {} bytes but produced {}",
                uncompressed_size,
                dst.len()
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "brotli")]
struct BrotliCodec;

#[cfg(feature = "brotli")]
impl Codec for BrotliCodec {
    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>, uncompressed_size: usize) -> Result<()> {
        use std::io::Read;
        dst.clear();
        let mut decoder = brotli::Decompressor::new(src, 4096);
        decoder
            .read_to_end(dst)
            .map_err(|e| general_err!("brotli decompression failed: {}", e))?;
        if dst.len() != uncompressed_size {
            return Err(general_err!(
                "brotli block declared {} bytes but produced {}",
                uncompressed_size,
                dst.len()
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "zstd")]
struct ZstdCodec;

#[cfg(feature = "zstd")]
impl Codec for ZstdCodec {
    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>, uncompressed_size: usize) -> Result<()> {
        dst.clear();
        zstd::stream::copy_decode(src, &mut *dst)
            .map_err(|e| general_err!("zstd decompression failed: {}", e))?;
        if dst.len() != uncompressed_size {
            return Err(general_err!(
                "zstd block declared {} bytes but produced {}",
                uncompressed_size,
                dst.len()
            ));
        }
        Ok(())
    }
}

/// Parquet's historical "LZ4" codec uses Hadoop's block framing: each block is
/// prefixed with a big-endian `(uncompressed_size, compressed_size)` pair.
#[cfg(feature = "lz4")]
struct Lz4HadoopCodec;

#[cfg(feature = "lz4")]
impl Codec for Lz4HadoopCodec {
    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>, uncompressed_size: usize) -> Result<()> {
        dst.clear();
        let mut pos = 0usize;
        while pos < src.len() {
            if pos + 8 > src.len() {
                return Err(general_err!("truncated LZ4 Hadoop block header"));
            }
            let uncompressed_size =
                u32::from_be_bytes(src[pos..pos + 4].try_into().unwrap()) as usize;
            let compressed_size =
                u32::from_be_bytes(src[pos + 4..pos + 8].try_into().unwrap()) as usize;
            pos += 8;
            if pos + compressed_size > src.len() {
                return Err(general_err!("truncated LZ4 Hadoop block body"));
            }
            let block = &src[pos..pos + compressed_size];
            pos += compressed_size;
            let before = dst.len();
            dst.resize(before + uncompressed_size, 0);
            let n = lz4::block::decompress_to_buffer(block, Some(uncompressed_size as i32), &mut dst[before..])
                .map_err(|e| general_err!("lz4 decompression failed: {}", e))?;
            if n != uncompressed_size {
                return Err(general_err!(
                    "lz4 block declared {} bytes but produced {}",
                    uncompressed_size,
                    n
                ));
            }
        }
        if dst.len() != uncompressed_size {
            return Err(general_err!(
                "lz4 Hadoop stream declared total {} bytes but produced {}",
                uncompressed_size,
                dst.len()
            ));
        }
        Ok(())
    }
}

/// The modern `LZ4_RAW` codec: no Hadoop framing, a single raw LZ4 block. Its
/// output length is not self-describing, so `uncompressed_size` (from the page
/// header) must be supplied up front to size the target buffer.
#[cfg(feature = "lz4")]
struct Lz4RawCodec;

#[cfg(feature = "lz4")]
impl Codec for Lz4RawCodec {
    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>, uncompressed_size: usize) -> Result<()> {
        dst.clear();
        dst.resize(uncompressed_size, 0);
        let n = lz4::block::decompress_to_buffer(src, Some(uncompressed_size as i32), dst)
            .map_err(|e| general_err!("lz4_raw decompression failed: {}", e))?;
        if n != uncompressed_size {
            return Err(general_err!(
                "lz4_raw block declared {} bytes but produced {}",
                uncompressed_size,
                n
            ));
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "flate2"))]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn gzip_roundtrip() {
        let original = b"the quick brown fox jumps over the lazy dog";
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut codec = create_codec(Compression::Gzip).unwrap().unwrap();
        let mut out = Vec::new();
        codec.decompress(&compressed, &mut out, original.len()).unwrap();
        assert_eq!(out, original);
    }
}
