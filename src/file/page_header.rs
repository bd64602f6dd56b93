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

//! Component E: the decoded page-header contract (spec §4.E / §6.3), plus its
//! ambient thrift realization (SPEC_FULL.md §4.N).

use crate::basic::{Encoding, PageType};
use crate::errors::{general_err, nyi_err, Result};
use std::io::Read;
use thrift::protocol::TCompactInputProtocol;

#[derive(Debug, Clone)]
pub struct DictionaryPageHeader {
    pub num_values: i32,
    pub encoding: Encoding,
    pub is_sorted: bool,
}

#[derive(Debug, Clone)]
pub struct DataPageHeaderV1 {
    pub num_values: i32,
    pub encoding: Encoding,
}

#[derive(Debug, Clone)]
pub struct DataPageHeaderV2 {
    pub num_values: i32,
    pub num_nulls: i32,
    pub num_rows: i32,
    pub encoding: Encoding,
    pub def_levels_byte_length: usize,
    pub rep_levels_byte_length: usize,
    pub is_compressed: bool,
}

#[derive(Debug, Clone)]
pub enum PageHeaderBody {
    Dictionary(DictionaryPageHeader),
    DataPageV1(DataPageHeaderV1),
    DataPageV2(DataPageHeaderV2),
    /// Index pages and any other page type the core does not interpret. The
    /// column-chunk decoder skips exactly `compressed_page_size` bytes for these.
    Other,
}

#[derive(Debug, Clone)]
pub struct PageHeaderMeta {
    pub page_type: PageType,
    pub uncompressed_page_size: usize,
    pub compressed_page_size: usize,
    pub body: PageHeaderBody,
}

/// Reads one `parquet_format::PageHeader` via the Thrift Compact Protocol and
/// translates it into [`PageHeaderMeta`]. The level-encoding Open Question (spec
/// §9) is enforced here: a `definition_level_encoding` or
/// `repetition_level_encoding` other than `RLE` surfaces `UnsupportedEncoding`
/// rather than silently misinterpreting the stream.
pub fn read_page_header<T: Read>(input: &mut T) -> Result<PageHeaderMeta> {
    let mut prot = TCompactInputProtocol::new(input);
    let header = parquet_format::PageHeader::read_from_in_protocol(&mut prot)?;
    translate_page_header(header)
}

fn translate_page_header(header: parquet_format::PageHeader) -> Result<PageHeaderMeta> {
    let page_type = PageType::from(header.type_);
    let uncompressed_page_size = header.uncompressed_page_size.max(0) as usize;
    let compressed_page_size = header.compressed_page_size.max(0) as usize;

    let body = match page_type {
        PageType::DictionaryPage => {
            let dict = header
                .dictionary_page_header
                .ok_or_else(|| general_err!("DICTIONARY_PAGE header missing dictionary_page_header"))?;
            PageHeaderBody::Dictionary(DictionaryPageHeader {
                num_values: dict.num_values,
                encoding: Encoding::from(dict.encoding),
                is_sorted: dict.is_sorted.unwrap_or(false),
            })
        }
        PageType::DataPage => {
            let v1 = header
                .data_page_header
                .ok_or_else(|| general_err!("DATA_PAGE header missing data_page_header"))?;
            check_level_encoding(v1.definition_level_encoding)?;
            check_level_encoding(v1.repetition_level_encoding)?;
            PageHeaderBody::DataPageV1(DataPageHeaderV1 {
                num_values: v1.num_values,
                encoding: Encoding::from(v1.encoding),
            })
        }
        PageType::DataPageV2 => {
            let v2 = header
                .data_page_header_v2
                .ok_or_else(|| general_err!("DATA_PAGE_V2 header missing data_page_header_v2"))?;
            PageHeaderBody::DataPageV2(DataPageHeaderV2 {
                num_values: v2.num_values,
                num_nulls: v2.num_nulls,
                num_rows: v2.num_rows,
                encoding: Encoding::from(v2.encoding),
                def_levels_byte_length: v2.definition_levels_byte_length.max(0) as usize,
                rep_levels_byte_length: v2.repetition_levels_byte_length.max(0) as usize,
                is_compressed: v2.is_compressed.unwrap_or(true),
            })
        }
        PageType::IndexPage => PageHeaderBody::Other,
    };

    Ok(PageHeaderMeta {
        page_type,
        uncompressed_page_size,
        compressed_page_size,
        body,
    })
}

fn check_level_encoding(encoding: parquet_format::Encoding) -> Result<()> {
    match Encoding::from(encoding) {
        Encoding::Rle => Ok(()),
        other => Err(nyi_err!(
            "level encoding {:?} is not supported; only RLE is",
            other
        )),
    }
}
