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

//! SPEC_FULL.md §4.N: parses the Parquet file footer per spec §6.5's exact byte
//! framing: `[footer_bytes][footer_length: u32 LE]["PAR1"]`, with a leading "PAR1"
//! magic validated too.

use crate::errors::{ParquetError, Result};
use crate::file::metadata::ParquetMetaData;
use crate::file::reader::{ChunkReader, Length};
use thrift::protocol::TCompactInputProtocol;

const FOOTER_MAGIC: &[u8; 4] = b"PAR1";
/// 4-byte length + 4-byte magic trailer.
const FOOTER_SUFFIX_LEN: u64 = 8;
const MIN_FILE_SIZE: u64 = 12;

pub fn parse_metadata<R: ChunkReader>(reader: &R) -> Result<ParquetMetaData> {
    let file_size = reader.len();
    if file_size < MIN_FILE_SIZE {
        return Err(ParquetError::TruncatedFile(format!(
            "file is {} bytes, smaller than the minimum valid Parquet file of {} bytes",
            file_size, MIN_FILE_SIZE
        )));
    }

    let leading_magic = reader.get_bytes(0, 4)?;
    if leading_magic.as_slice() != FOOTER_MAGIC {
        return Err(ParquetError::InvalidFooter(
            "invalid Parquet file: leading magic is not 'PAR1'".to_string(),
        ));
    }

    let suffix = reader.get_bytes(file_size - FOOTER_SUFFIX_LEN, FOOTER_SUFFIX_LEN as usize)?;
    let trailing_magic = &suffix[4..8];
    if trailing_magic != FOOTER_MAGIC {
        return Err(ParquetError::InvalidFooter(
            "invalid Parquet file: trailing magic is not 'PAR1'".to_string(),
        ));
    }

    let footer_len = u32::from_le_bytes(suffix[0..4].try_into().unwrap()) as u64;
    let footer_start = file_size
        .checked_sub(FOOTER_SUFFIX_LEN)
        .and_then(|v| v.checked_sub(footer_len))
        .ok_or_else(|| {
            ParquetError::InvalidFooter(format!(
                "footer length {} exceeds the space available before the trailing magic",
                footer_len
            ))
        })?;
    if footer_start < 4 {
        return Err(ParquetError::InvalidFooter(format!(
            "footer length {} overlaps the leading magic",
            footer_len
        )));
    }

    let footer_bytes = reader.get_bytes(footer_start, footer_len as usize)?;
    let mut cursor: &[u8] = &footer_bytes;
    let mut prot = TCompactInputProtocol::new(&mut cursor);
    let file_metadata = parquet_format::FileMetaData::read_from_in_protocol(&mut prot)?;

    ParquetMetaData::from_thrift(file_metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_shorter_than_minimum_is_truncated_file() {
        let data = bytes::Bytes::from_static(b"short");
        let err = parse_metadata(&data).unwrap_err();
        assert!(format!("{}", err).contains("smaller than the minimum"));
    }

    #[test]
    fn missing_leading_magic_is_rejected() {
        let mut data = vec![0u8; 12];
        data[8..12].copy_from_slice(b"PAR1");
        let bytes = bytes::Bytes::from(data);
        let err = parse_metadata(&bytes).unwrap_err();
        assert!(format!("{}", err).contains("leading magic"));
    }

    #[test]
    fn missing_trailing_magic_is_rejected() {
        let mut data = vec![0u8; 12];
        data[0..4].copy_from_slice(b"PAR1");
        let bytes = bytes::Bytes::from(data);
        let err = parse_metadata(&bytes).unwrap_err();
        assert!(format!("{}", err).contains("trailing magic"));
    }
}
