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

//! Physical types, encodings, compression codecs and repetition, mirrored from the
//! thrift-decoded metadata records so the rest of the crate never depends on
//! `parquet_format` directly outside of `file::footer` and `file::page_header`.

use crate::errors::{general_err, ParquetError, Result};
use std::fmt;

/// Physical (on-disk) type of a leaf column. Fixed 8-value enum per spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Boolean,
    Int32,
    Int64,
    Int96,
    Float,
    Double,
    ByteArray,
    FixedLenByteArray,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<parquet_format::Type> for Type {
    fn from(t: parquet_format::Type) -> Self {
        match t {
            parquet_format::Type::BOOLEAN => Type::Boolean,
            parquet_format::Type::INT32 => Type::Int32,
            parquet_format::Type::INT64 => Type::Int64,
            parquet_format::Type::INT96 => Type::Int96,
            parquet_format::Type::FLOAT => Type::Float,
            parquet_format::Type::DOUBLE => Type::Double,
            parquet_format::Type::BYTE_ARRAY => Type::ByteArray,
            parquet_format::Type::FIXED_LEN_BYTE_ARRAY => Type::FixedLenByteArray,
            other => panic!("unknown physical type {:?}", other),
        }
    }
}

/// Repetition of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    Required,
    Optional,
    Repeated,
}

impl From<parquet_format::FieldRepetitionType> for Repetition {
    fn from(t: parquet_format::FieldRepetitionType) -> Self {
        match t {
            parquet_format::FieldRepetitionType::REQUIRED => Repetition::Required,
            parquet_format::FieldRepetitionType::OPTIONAL => Repetition::Optional,
            parquet_format::FieldRepetitionType::REPEATED => Repetition::Repeated,
            other => panic!("unknown repetition {:?}", other),
        }
    }
}

/// Value encodings the core decode pipeline implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Plain,
    PlainDictionary,
    Rle,
    DeltaBinaryPacked,
    DeltaLengthByteArray,
    DeltaByteArray,
    RleDictionary,
    ByteStreamSplit,
    /// Legacy bit-packed encoding: accepted only as a level encoding (where it is
    /// equivalent to the RLE/bit-packed hybrid's bit-packed run) and otherwise
    /// rejected with `UnsupportedEncoding`.
    BitPacked,
}

impl Encoding {
    pub fn is_dictionary(self) -> bool {
        matches!(self, Encoding::PlainDictionary | Encoding::RleDictionary)
    }
}

impl From<parquet_format::Encoding> for Encoding {
    fn from(e: parquet_format::Encoding) -> Self {
        match e {
            parquet_format::Encoding::PLAIN => Encoding::Plain,
            parquet_format::Encoding::PLAIN_DICTIONARY => Encoding::PlainDictionary,
            parquet_format::Encoding::RLE => Encoding::Rle,
            parquet_format::Encoding::BIT_PACKED => Encoding::BitPacked,
            parquet_format::Encoding::DELTA_BINARY_PACKED => Encoding::DeltaBinaryPacked,
            parquet_format::Encoding::DELTA_LENGTH_BYTE_ARRAY => {
                Encoding::DeltaLengthByteArray
            }
            parquet_format::Encoding::DELTA_BYTE_ARRAY => Encoding::DeltaByteArray,
            parquet_format::Encoding::RLE_DICTIONARY => Encoding::RleDictionary,
            parquet_format::Encoding::BYTE_STREAM_SPLIT => Encoding::ByteStreamSplit,
            other => panic!("unknown encoding {:?}", other),
        }
    }
}

/// Compression codec of a column chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    Uncompressed,
    Snappy,
    Gzip,
    Brotli,
    Zstd,
    Lz4,
    Lz4Raw,
}

impl From<parquet_format::CompressionCodec> for Compression {
    fn from(c: parquet_format::CompressionCodec) -> Self {
        match c {
            parquet_format::CompressionCodec::UNCOMPRESSED => Compression::Uncompressed,
            parquet_format::CompressionCodec::SNAPPY => Compression::Snappy,
            parquet_format::CompressionCodec::GZIP => Compression::Gzip,
            parquet_format::CompressionCodec::BROTLI => Compression::Brotli,
            parquet_format::CompressionCodec::ZSTD => Compression::Zstd,
            parquet_format::CompressionCodec::LZ4 => Compression::Lz4,
            parquet_format::CompressionCodec::LZ4_RAW => Compression::Lz4Raw,
            other => panic!("unknown compression codec {:?}", other),
        }
    }
}

/// Page type, a collaborator surface per spec §4.E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    DataPage,
    IndexPage,
    DictionaryPage,
    DataPageV2,
}

impl From<parquet_format::PageType> for PageType {
    fn from(t: parquet_format::PageType) -> Self {
        match t {
            parquet_format::PageType::DATA_PAGE => PageType::DataPage,
            parquet_format::PageType::INDEX_PAGE => PageType::IndexPage,
            parquet_format::PageType::DICTIONARY_PAGE => PageType::DictionaryPage,
            parquet_format::PageType::DATA_PAGE_V2 => PageType::DataPageV2,
            other => panic!("unknown page type {:?}", other),
        }
    }
}

/// Converted type (the legacy, pre-`LogicalType` annotation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvertedType {
    Utf8,
    Map,
    MapKeyValue,
    List,
    Enum,
    Decimal,
    Date,
    TimeMillis,
    TimeMicros,
    TimestampMillis,
    TimestampMicros,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Json,
    Bson,
    Interval,
}

impl From<parquet_format::ConvertedType> for ConvertedType {
    fn from(c: parquet_format::ConvertedType) -> Self {
        use parquet_format::ConvertedType as C;
        match c {
            C::UTF8 => ConvertedType::Utf8,
            C::MAP => ConvertedType::Map,
            C::MAP_KEY_VALUE => ConvertedType::MapKeyValue,
            C::LIST => ConvertedType::List,
            C::ENUM => ConvertedType::Enum,
            C::DECIMAL => ConvertedType::Decimal,
            C::DATE => ConvertedType::Date,
            C::TIME_MILLIS => ConvertedType::TimeMillis,
            C::TIME_MICROS => ConvertedType::TimeMicros,
            C::TIMESTAMP_MILLIS => ConvertedType::TimestampMillis,
            C::TIMESTAMP_MICROS => ConvertedType::TimestampMicros,
            C::UINT_8 => ConvertedType::Uint8,
            C::UINT_16 => ConvertedType::Uint16,
            C::UINT_32 => ConvertedType::Uint32,
            C::UINT_64 => ConvertedType::Uint64,
            C::INT_8 => ConvertedType::Int8,
            C::INT_16 => ConvertedType::Int16,
            C::INT_32 => ConvertedType::Int32,
            C::INT_64 => ConvertedType::Int64,
            C::JSON => ConvertedType::Json,
            C::BSON => ConvertedType::Bson,
            C::INTERVAL => ConvertedType::Interval,
            other => panic!("unknown converted type {:?}", other),
        }
    }
}

/// Logical type, the modern schema annotation. Only the variants the type-mapping
/// component (SPEC_FULL.md §3) acts on are modeled; anything else decodes to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogicalType {
    String,
    Map,
    List,
    Enum,
    Decimal { scale: i32, precision: i32 },
    Date,
    Time { unit: TimeUnit, is_adjusted_to_utc: bool },
    Timestamp { unit: TimeUnit, is_adjusted_to_utc: bool },
    Integer { bit_width: i8, is_signed: bool },
    Float16,
    Json,
    Bson,
    Uuid,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Millis,
    Micros,
    Nanos,
}

impl LogicalType {
    pub(crate) fn from_thrift(l: parquet_format::LogicalType) -> Self {
        use parquet_format::LogicalType as L;
        match l {
            L::STRING(_) => LogicalType::String,
            L::MAP(_) => LogicalType::Map,
            L::LIST(_) => LogicalType::List,
            L::ENUM(_) => LogicalType::Enum,
            L::DECIMAL(d) => LogicalType::Decimal {
                scale: d.scale,
                precision: d.precision,
            },
            L::DATE(_) => LogicalType::Date,
            L::TIME(t) => LogicalType::Time {
                unit: time_unit_from_thrift(&t.unit),
                is_adjusted_to_utc: t.is_adjusted_to_u_t_c,
            },
            L::TIMESTAMP(t) => LogicalType::Timestamp {
                unit: time_unit_from_thrift(&t.unit),
                is_adjusted_to_utc: t.is_adjusted_to_u_t_c,
            },
            L::INTEGER(i) => LogicalType::Integer {
                bit_width: i.bit_width,
                is_signed: i.is_signed,
            },
            L::FLOAT16(_) => LogicalType::Float16,
            L::JSON(_) => LogicalType::Json,
            L::BSON(_) => LogicalType::Bson,
            L::UUID(_) => LogicalType::Uuid,
            L::UNKNOWN(_) => LogicalType::Unknown,
        }
    }
}

fn time_unit_from_thrift(u: &parquet_format::TimeUnit) -> TimeUnit {
    use parquet_format::TimeUnit as U;
    match u {
        U::MILLIS(_) => TimeUnit::Millis,
        U::MICROS(_) => TimeUnit::Micros,
        U::NANOS(_) => TimeUnit::Nanos,
    }
}

/// Validates that `encoding` is one this crate's column-chunk decoder dispatches for
/// `physical_type`, per spec §4.G's encoding dispatch table. Does not itself decode
/// anything; used by the chunk decoder to fail fast with `UnsupportedEncoding`
/// before attempting to build a per-page decoder.
pub(crate) fn check_dispatchable(encoding: Encoding, physical_type: Type) -> Result<()> {
    use Encoding::*;
    use Type::*;
    let ok = match (encoding, physical_type) {
        (Plain, _) => true,
        (PlainDictionary, _) | (RleDictionary, _) => true,
        (DeltaBinaryPacked, Int32) | (DeltaBinaryPacked, Int64) => true,
        (DeltaLengthByteArray, ByteArray) => true,
        (DeltaByteArray, ByteArray) | (DeltaByteArray, FixedLenByteArray) => true,
        (ByteStreamSplit, Int32)
        | (ByteStreamSplit, Int64)
        | (ByteStreamSplit, Float)
        | (ByteStreamSplit, Double)
        | (ByteStreamSplit, FixedLenByteArray) => true,
        (Rle, Boolean) => true,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(general_err!(
            "encoding {:?} is not supported for physical type {:?}",
            encoding,
            physical_type
        ))
    }
}

pub(crate) fn unsupported_encoding(encoding: Encoding, physical_type: Type) -> ParquetError {
    crate::errors::nyi_err!(
        "encoding {:?} is not supported for physical type {:?}",
        encoding,
        physical_type
    )
}
