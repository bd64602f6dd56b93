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

//! Component G: the column-chunk decoder. Drives the pages of one column chunk
//! through the page-header/level/value decoders (E, C, D) into a
//! [`ColumnBuildState`] (H), with the correct page-to-page ordering (spec §5).

use crate::basic::{Encoding, Type};
use crate::column::build_state::ColumnBuildState;
use crate::column::dictionary::Dictionary;
use crate::compression::{create_codec, Codec};
use crate::data_type::ByteArray;
use crate::encodings::decoders;
use crate::encodings::levels;
use crate::errors::{general_err, nyi_err, Result};
use crate::file::metadata::ColumnChunkMetaData;
use crate::file::page_header::{read_page_header, PageHeaderBody};

/// Output of decoding one column chunk: the filled build state plus whether its
/// levels must survive for nested assembly (spec §4.G, "Output").
pub struct ColumnResult {
    pub state: ColumnBuildState,
}

pub struct ChunkDecodeInput<'a> {
    pub chunk_bytes: &'a [u8],
    pub column: &'a ColumnChunkMetaData,
    pub max_def_level: i32,
    pub max_rep_level: i32,
    pub row_count: usize,
    pub type_length: i32,
}

pub fn decode_column_chunk(input: ChunkDecodeInput) -> Result<ColumnResult> {
    let ChunkDecodeInput {
        chunk_bytes,
        column,
        max_def_level,
        max_rep_level,
        row_count,
        type_length,
    } = input;

    let capacity = if max_rep_level > 0 {
        column.num_values as usize
    } else {
        row_count
    };
    let mut state = ColumnBuildState::new(column.physical_type, max_def_level, max_rep_level, capacity);

    let mut decompressor: Option<Box<dyn Codec>> = create_codec(column.codec)?;
    let mut dictionary: Option<Dictionary> = None;

    let mut pos: usize = 0;
    let mut values_read: i64 = 0;
    let num_values = column.num_values;

    while values_read < num_values {
        if pos >= chunk_bytes.len() {
            return Err(general_err!(
                "column chunk ended after {} of {} values",
                values_read,
                num_values
            ));
        }
        let mut cursor: &[u8] = &chunk_bytes[pos..];
        let before_len = cursor.len();
        let header = read_page_header(&mut cursor)?;
        let header_len = before_len - cursor.len();
        pos += header_len;

        if pos + header.compressed_page_size > chunk_bytes.len() {
            return Err(general_err!(
                "page declares {} compressed bytes but only {} remain",
                header.compressed_page_size,
                chunk_bytes.len() - pos
            ));
        }
        let page_bytes = &chunk_bytes[pos..pos + header.compressed_page_size];
        pos += header.compressed_page_size;

        match header.body {
            PageHeaderBody::Dictionary(dict_header) => {
                if dictionary.is_some() {
                    return Err(general_err!("column chunk declares more than one dictionary page"));
                }
                let decompressed = decompress_whole_page(
                    page_bytes,
                    header.uncompressed_page_size,
                    decompressor.as_mut(),
                )?;
                dictionary = Some(load_dictionary(
                    &decompressed,
                    column.physical_type,
                    dict_header.num_values as usize,
                    type_length,
                )?);
            }
            PageHeaderBody::DataPageV1(v1) => {
                let decompressed = decompress_whole_page(
                    page_bytes,
                    header.uncompressed_page_size,
                    decompressor.as_mut(),
                )?;
                let mut data = decompressed.as_slice();

                let rep_levels = if max_rep_level > 0 {
                    let (levels, consumed) =
                        levels::decode_levels_v1(data, max_rep_level, v1.num_values as usize)?;
                    data = &data[consumed..];
                    levels
                } else {
                    vec![0; v1.num_values as usize]
                };
                let def_levels = if max_def_level > 0 {
                    let (levels, consumed) =
                        levels::decode_levels_v1(data, max_def_level, v1.num_values as usize)?;
                    data = &data[consumed..];
                    levels
                } else {
                    vec![max_def_level; v1.num_values as usize]
                };

                let non_null_count = if max_def_level > 0 {
                    ColumnBuildState::count_non_null(&def_levels, max_def_level)
                } else {
                    v1.num_values as usize
                };

                let value_data = if v1.encoding == Encoding::Rle && column.physical_type == Type::Boolean {
                    // spec §4.D: value-level RLE "begins with a 4-byte little-endian
                    // length prefix in DataPageV1 (never used in practice)".
                    if data.len() >= 4 {
                        &data[4..]
                    } else {
                        data
                    }
                } else {
                    data
                };

                decode_and_append_values(
                    &mut state,
                    v1.encoding,
                    column.physical_type,
                    value_data,
                    non_null_count,
                    dictionary.as_ref(),
                    type_length,
                )?;

                if max_rep_level > 0 {
                    state.append_rep_levels(&rep_levels);
                }
                if max_def_level > 0 {
                    state.append_def_levels(&def_levels);
                }
                values_read += v1.num_values as i64;
            }
            PageHeaderBody::DataPageV2(v2) => {
                let rep_bytes = v2.rep_levels_byte_length;
                let def_bytes = v2.def_levels_byte_length;
                if rep_bytes + def_bytes > page_bytes.len() {
                    return Err(general_err!("DATA_PAGE_V2 level section exceeds page size"));
                }
                let levels_region = &page_bytes[..rep_bytes + def_bytes];
                let rep_region = &levels_region[..rep_bytes];
                let def_region = &levels_region[rep_bytes..];

                let rep_levels = if max_rep_level > 0 {
                    levels::decode_levels_v2(rep_region, max_rep_level, v2.num_values as usize, rep_bytes)?
                } else {
                    vec![0; v2.num_values as usize]
                };
                let def_levels = if max_def_level > 0 {
                    levels::decode_levels_v2(def_region, max_def_level, v2.num_values as usize, def_bytes)?
                } else {
                    vec![max_def_level; v2.num_values as usize]
                };

                let non_null_count = (v2.num_values - v2.num_nulls).max(0) as usize;

                let value_section = &page_bytes[rep_bytes + def_bytes..];
                let uncompressed_value_size =
                    header.uncompressed_page_size.saturating_sub(rep_bytes + def_bytes);

                if non_null_count > 0 {
                    let decompressed_values = if v2.is_compressed {
                        decompress_whole_page(
                            value_section,
                            uncompressed_value_size,
                            decompressor.as_mut(),
                        )?
                    } else {
                        value_section.to_vec()
                    };
                    decode_and_append_values(
                        &mut state,
                        v2.encoding,
                        column.physical_type,
                        &decompressed_values,
                        non_null_count,
                        dictionary.as_ref(),
                        type_length,
                    )?;
                }

                if max_rep_level > 0 {
                    state.append_rep_levels(&rep_levels);
                }
                if max_def_level > 0 {
                    state.append_def_levels(&def_levels);
                }
                values_read += v2.num_values as i64;
            }
            PageHeaderBody::Other => {
                // Unknown page type (e.g. INDEX_PAGE): already skipped by advancing
                // past compressed_page_size above.
            }
        }
    }

    Ok(ColumnResult { state })
}

fn decompress_whole_page(
    page_bytes: &[u8],
    uncompressed_size: usize,
    decompressor: Option<&mut Box<dyn Codec>>,
) -> Result<Vec<u8>> {
    match decompressor {
        Some(codec) => {
            let mut out = Vec::with_capacity(uncompressed_size);
            codec.decompress(page_bytes, &mut out, uncompressed_size)?;
            Ok(out)
        }
        None => Ok(page_bytes.to_vec()),
    }
}

fn load_dictionary(
    data: &[u8],
    physical_type: Type,
    num_values: usize,
    type_length: i32,
) -> Result<Dictionary> {
    Ok(match physical_type {
        Type::Boolean => Dictionary::Boolean(decoders::decode_plain_bool(data, num_values)?),
        Type::Int32 => Dictionary::Int32(decoders::decode_plain_i32(data, num_values)?),
        Type::Int64 => Dictionary::Int64(decoders::decode_plain_i64(data, num_values)?),
        Type::Int96 => Dictionary::Int96(decoders::decode_plain_int96(data, num_values)?),
        Type::Float => Dictionary::Float(decoders::decode_plain_f32(data, num_values)?),
        Type::Double => Dictionary::Double(decoders::decode_plain_f64(data, num_values)?),
        Type::ByteArray => Dictionary::ByteArray(decoders::decode_plain_byte_array(data, num_values)?),
        Type::FixedLenByteArray => Dictionary::FixedLenByteArray(decoders::decode_plain_fixed_len_byte_array(
            data,
            num_values,
            type_length.max(0) as usize,
        )?),
    })
}

/// Component G's "Encoding dispatch" table: decodes `count` values of `encoding` ×
/// `physical_type` from `data` and appends them to `state`.
fn decode_and_append_values(
    state: &mut ColumnBuildState,
    encoding: Encoding,
    physical_type: Type,
    data: &[u8],
    count: usize,
    dictionary: Option<&Dictionary>,
    type_length: i32,
) -> Result<()> {
    match (encoding, physical_type) {
        (Encoding::Plain, Type::Boolean) => {
            state.add_bool_values(&decoders::decode_plain_bool(data, count)?)
        }
        (Encoding::Plain, Type::Int32) => state.add_i32_values(&decoders::decode_plain_i32(data, count)?),
        (Encoding::Plain, Type::Int64) => state.add_i64_values(&decoders::decode_plain_i64(data, count)?),
        (Encoding::Plain, Type::Int96) => {
            state.add_int96_values(&decoders::decode_plain_int96(data, count)?)
        }
        (Encoding::Plain, Type::Float) => state.add_f32_values(&decoders::decode_plain_f32(data, count)?),
        (Encoding::Plain, Type::Double) => state.add_f64_values(&decoders::decode_plain_f64(data, count)?),
        (Encoding::Plain, Type::ByteArray) => {
            state.add_byte_array_values(&decoders::decode_plain_byte_array(data, count)?)
        }
        (Encoding::Plain, Type::FixedLenByteArray) => state.add_fixed_len_byte_array_values(
            &decoders::decode_plain_fixed_len_byte_array(data, count, type_length.max(0) as usize)?,
            type_length.max(0) as usize,
        ),

        (Encoding::PlainDictionary, _) | (Encoding::RleDictionary, _) => {
            let dict = dictionary.ok_or_else(|| {
                crate::errors::ParquetError::MissingDictionary(
                    "dictionary-encoded data page with no preceding dictionary page".to_string(),
                )
            })?;
            let indices = decoders::decode_dictionary_indices(data, count)?;
            match physical_type {
                Type::Boolean => state.add_bool_values(&dict.gather_bool(&indices)?),
                Type::Int32 => state.add_i32_values(&dict.gather_i32(&indices)?),
                Type::Int64 => state.add_i64_values(&dict.gather_i64(&indices)?),
                Type::Int96 => state.add_int96_values(&dict.gather_int96(&indices)?),
                Type::Float => state.add_f32_values(&dict.gather_f32(&indices)?),
                Type::Double => state.add_f64_values(&dict.gather_f64(&indices)?),
                Type::ByteArray => state.add_byte_array_values(&dict.gather_byte_array(&indices)?),
                Type::FixedLenByteArray => state.add_fixed_len_byte_array_values(
                    &dict.gather_byte_array(&indices)?,
                    type_length.max(0) as usize,
                ),
            }
        }

        (Encoding::DeltaBinaryPacked, Type::Int32) => {
            state.add_i32_values(&decoders::decode_delta_binary_packed_i32(data)?)
        }
        (Encoding::DeltaBinaryPacked, Type::Int64) => {
            state.add_i64_values(&decoders::decode_delta_binary_packed_i64(data)?)
        }

        (Encoding::DeltaLengthByteArray, Type::ByteArray) => {
            state.add_byte_array_values(&decoders::decode_delta_length_byte_array(data)?)
        }

        (Encoding::DeltaByteArray, Type::ByteArray) => {
            state.add_byte_array_values(&decoders::decode_delta_byte_array(data)?)
        }
        (Encoding::DeltaByteArray, Type::FixedLenByteArray) => state.add_fixed_len_byte_array_values(
            &decoders::decode_delta_byte_array(data)?,
            type_length.max(0) as usize,
        ),

        (Encoding::ByteStreamSplit, Type::Int32) => {
            let bytes = decoders::decode_byte_stream_split(data, count, 4)?;
            state.add_i32_values(&reinterpret_le::<i32, 4>(&bytes, i32::from_le_bytes))
        }
        (Encoding::ByteStreamSplit, Type::Int64) => {
            let bytes = decoders::decode_byte_stream_split(data, count, 8)?;
            state.add_i64_values(&reinterpret_le::<i64, 8>(&bytes, i64::from_le_bytes))
        }
        (Encoding::ByteStreamSplit, Type::Float) => {
            let bytes = decoders::decode_byte_stream_split(data, count, 4)?;
            state.add_f32_values(&reinterpret_le::<f32, 4>(&bytes, f32::from_le_bytes))
        }
        (Encoding::ByteStreamSplit, Type::Double) => {
            let bytes = decoders::decode_byte_stream_split(data, count, 8)?;
            state.add_f64_values(&reinterpret_le::<f64, 8>(&bytes, f64::from_le_bytes))
        }
        (Encoding::ByteStreamSplit, Type::FixedLenByteArray) => {
            let width = type_length.max(0) as usize;
            let bytes = decoders::decode_byte_stream_split(data, count, width)?;
            let values: Vec<ByteArray> = bytes.chunks_exact(width).map(ByteArray::from).collect();
            state.add_fixed_len_byte_array_values(&values, width)
        }

        (Encoding::Rle, Type::Boolean) => {
            state.add_bool_values(&decoders::decode_rle_bool_values(data, count)?)
        }

        (other_encoding, other_type) => Err(nyi_err!(
            "encoding {:?} is not supported for physical type {:?}",
            other_encoding,
            other_type
        )),
    }
}

fn reinterpret_le<T, const W: usize>(bytes: &[u8], from_bytes: fn([u8; W]) -> T) -> Vec<T> {
    bytes
        .chunks_exact(W)
        .map(|c| from_bytes(c.try_into().unwrap()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::Compression;
    use crate::file::metadata::ColumnChunkMetaData;

    fn column_meta(physical_type: Type, num_values: i64) -> ColumnChunkMetaData {
        ColumnChunkMetaData {
            physical_type,
            encodings: vec![Encoding::Plain],
            path_in_schema: vec!["a".to_string()],
            codec: Compression::Uncompressed,
            num_values,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
            data_page_offset: 0,
            dictionary_page_offset: None,
        }
    }

    fn write_page_header(buf: &mut Vec<u8>, page_type: parquet_format::PageType, uncompressed: i32, compressed: i32, v1: Option<parquet_format::DataPageHeader>, v2: Option<parquet_format::DataPageHeaderV2>) {
        use thrift::protocol::{TCompactOutputProtocol, TOutputProtocol};
        let header = parquet_format::PageHeader {
            type_: page_type,
            uncompressed_page_size: uncompressed,
            compressed_page_size: compressed,
            crc: None,
            data_page_header: v1,
            index_page_header: None,
            dictionary_page_header: None,
            data_page_header_v2: v2,
        };
        let mut prot = TCompactOutputProtocol::new(buf);
        header.write_to_out_protocol(&mut prot).unwrap();
        prot.flush().unwrap();
    }

    #[test]
    fn decodes_trivial_plain_int32_required_column_s1() {
        let mut chunk = Vec::new();
        let v1_header = parquet_format::DataPageHeader {
            num_values: 3,
            encoding: parquet_format::Encoding::PLAIN,
            definition_level_encoding: parquet_format::Encoding::RLE,
            repetition_level_encoding: parquet_format::Encoding::RLE,
            statistics: None,
        };
        let payload = [
            0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00,
        ];
        write_page_header(
            &mut chunk,
            parquet_format::PageType::DATA_PAGE,
            payload.len() as i32,
            payload.len() as i32,
            Some(v1_header),
            None,
        );
        chunk.extend_from_slice(&payload);

        let column = column_meta(Type::Int32, 3);
        let result = decode_column_chunk(ChunkDecodeInput {
            chunk_bytes: &chunk,
            column: &column,
            max_def_level: 0,
            max_rep_level: 0,
            row_count: 3,
            type_length: -1,
        })
        .unwrap();

        match result.state.storage {
            crate::column::build_state::ValueStorage::Int32(v) => assert_eq!(v, vec![1, 2, 3]),
            _ => panic!("wrong storage"),
        }
    }
}
