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

//! Component I: the logical/converted/physical type fallthrough table
//! (SPEC_FULL.md §3) and the recursive schema-node-to-`arrow_schema::Field`
//! walk that drives components J and K.

use std::sync::Arc;

use arrow_schema::{DataType, Field, Fields, Schema, TimeUnit as ArrowTimeUnit};

use crate::basic::{ConvertedType, LogicalType, Repetition, TimeUnit, Type};
use crate::errors::{general_err, Result};
use crate::schema::types::{GroupShape, SchemaDescriptor};

/// Maps a leaf node's physical type, together with whatever logical or
/// converted type annotates it, to an Arrow `DataType`. Logical type wins over
/// converted type; an unrecognized annotation (or none at all) falls through to
/// the physical type's natural mapping (SPEC_FULL.md §3).
pub fn leaf_arrow_type(node: &crate::schema::types::SchemaNode) -> Result<DataType> {
    let physical = node
        .physical_type
        .ok_or_else(|| general_err!("leaf node {:?} has no physical type", node.name))?;

    if let Some(logical) = &node.logical_type {
        if let Some(dt) = logical_arrow_type(logical, physical, node.type_length)? {
            return Ok(dt);
        }
    }
    if let Some(converted) = node.converted_type {
        if let Some(dt) = converted_arrow_type(converted, physical, node.type_length)? {
            return Ok(dt);
        }
    }
    natural_arrow_type(physical, node.type_length)
}

fn logical_arrow_type(logical: &LogicalType, physical: Type, type_length: i32) -> Result<Option<DataType>> {
    let dt = match logical {
        LogicalType::String | LogicalType::Enum | LogicalType::Json | LogicalType::Bson | LogicalType::Uuid => {
            DataType::Utf8
        }
        LogicalType::Decimal { .. } => DataType::FixedSizeBinary(decimal_width(physical, type_length)?),
        LogicalType::Date => DataType::Date32,
        LogicalType::Time { unit, .. } => time_arrow_type(*unit),
        LogicalType::Timestamp { unit, is_adjusted_to_utc } => {
            timestamp_arrow_type(*unit, *is_adjusted_to_utc)
        }
        LogicalType::Integer { bit_width, is_signed } => integer_arrow_type(*bit_width, *is_signed, physical)?,
        LogicalType::Float16 => DataType::FixedSizeBinary(2),
        LogicalType::Map | LogicalType::List | LogicalType::Unknown => return Ok(None),
    };
    Ok(Some(dt))
}

fn converted_arrow_type(converted: ConvertedType, physical: Type, type_length: i32) -> Result<Option<DataType>> {
    let dt = match converted {
        ConvertedType::Utf8 | ConvertedType::Enum | ConvertedType::Json | ConvertedType::Bson => DataType::Utf8,
        ConvertedType::Decimal => DataType::FixedSizeBinary(decimal_width(physical, type_length)?),
        ConvertedType::Date => DataType::Date32,
        ConvertedType::TimeMillis => DataType::Time32(ArrowTimeUnit::Millisecond),
        ConvertedType::TimeMicros => DataType::Time64(ArrowTimeUnit::Microsecond),
        ConvertedType::TimestampMillis => DataType::Timestamp(ArrowTimeUnit::Millisecond, None),
        ConvertedType::TimestampMicros => DataType::Timestamp(ArrowTimeUnit::Microsecond, None),
        ConvertedType::Uint8 => DataType::UInt8,
        ConvertedType::Uint16 => DataType::UInt16,
        ConvertedType::Uint32 => DataType::UInt32,
        ConvertedType::Uint64 => DataType::UInt64,
        ConvertedType::Int8 => DataType::Int8,
        ConvertedType::Int16 => DataType::Int16,
        ConvertedType::Int32 => DataType::Int32,
        ConvertedType::Int64 => DataType::Int64,
        ConvertedType::Map
        | ConvertedType::MapKeyValue
        | ConvertedType::List
        | ConvertedType::Interval => return Ok(None),
    };
    Ok(Some(dt))
}

fn natural_arrow_type(physical: Type, type_length: i32) -> Result<DataType> {
    Ok(match physical {
        Type::Boolean => DataType::Boolean,
        Type::Int32 => DataType::Int32,
        Type::Int64 => DataType::Int64,
        Type::Int96 => DataType::Timestamp(ArrowTimeUnit::Nanosecond, None),
        Type::Float => DataType::Float32,
        Type::Double => DataType::Float64,
        Type::ByteArray => DataType::Binary,
        Type::FixedLenByteArray => {
            if type_length <= 0 {
                return Err(general_err!(
                    "FIXED_LEN_BYTE_ARRAY leaf has non-positive type_length {}",
                    type_length
                ));
            }
            DataType::FixedSizeBinary(type_length)
        }
    })
}

fn decimal_width(physical: Type, type_length: i32) -> Result<i32> {
    match physical {
        Type::FixedLenByteArray => {
            if type_length <= 0 {
                Err(general_err!("decimal FIXED_LEN_BYTE_ARRAY has non-positive type_length {}", type_length))
            } else {
                Ok(type_length)
            }
        }
        Type::Int32 => Ok(4),
        Type::Int64 => Ok(8),
        other => Err(general_err!("decimal logical type is not valid on physical type {:?}", other)),
    }
}

fn time_arrow_type(unit: TimeUnit) -> DataType {
    match unit {
        TimeUnit::Millis => DataType::Time32(ArrowTimeUnit::Millisecond),
        TimeUnit::Micros => DataType::Time64(ArrowTimeUnit::Microsecond),
        TimeUnit::Nanos => DataType::Time64(ArrowTimeUnit::Nanosecond),
    }
}

fn timestamp_arrow_type(unit: TimeUnit, is_adjusted_to_utc: bool) -> DataType {
    let tz = if is_adjusted_to_utc { Some(Arc::from("UTC")) } else { None };
    let arrow_unit = match unit {
        TimeUnit::Millis => ArrowTimeUnit::Millisecond,
        TimeUnit::Micros => ArrowTimeUnit::Microsecond,
        TimeUnit::Nanos => ArrowTimeUnit::Nanosecond,
    };
    DataType::Timestamp(arrow_unit, tz)
}

fn integer_arrow_type(bit_width: i8, is_signed: bool, physical: Type) -> Result<DataType> {
    Ok(match (bit_width, is_signed, physical) {
        (8, true, Type::Int32) => DataType::Int8,
        (8, false, Type::Int32) => DataType::UInt8,
        (16, true, Type::Int32) => DataType::Int16,
        (16, false, Type::Int32) => DataType::UInt16,
        (32, true, Type::Int32) => DataType::Int32,
        (32, false, Type::Int32) => DataType::UInt32,
        (64, true, Type::Int64) => DataType::Int64,
        (64, false, Type::Int64) => DataType::UInt64,
        (bits, signed, phys) => {
            return Err(general_err!(
                "INTEGER(bitWidth={}, signed={}) is not valid on physical type {:?}",
                bits,
                signed,
                phys
            ))
        }
    })
}

/// Recursively derives the Arrow type for any schema node — leaf or group —
/// per spec §4.K's classification of List/Map/Struct group shapes.
pub fn arrow_type_for_node(descr: &SchemaDescriptor, node_index: usize) -> Result<DataType> {
    let node = descr.node(node_index);
    if node.is_leaf() {
        return leaf_arrow_type(node);
    }
    match descr.classify_group(node_index) {
        GroupShape::List { repeated_index } => Ok(DataType::List(Arc::new(list_element_field(descr, repeated_index)?))),
        GroupShape::Map { key_index, value_index, .. } => {
            let key_field = Field::new("key", arrow_type_for_node(descr, key_index)?, false);
            let value_field = match value_index {
                Some(vi) => Field::new(
                    "value",
                    arrow_type_for_node(descr, vi)?,
                    descr.node(vi).repetition == Repetition::Optional,
                ),
                None => Field::new("value", DataType::Null, true),
            };
            let entries = DataType::Struct(Fields::from(vec![key_field, value_field]));
            Ok(DataType::Map(Arc::new(Field::new("entries", entries, false)), false))
        }
        GroupShape::Struct => struct_arrow_type(descr, &node.children),
    }
}

/// The arrow type of a node's content, ignoring its own `Repeated` marker (used
/// when the caller already accounts for repetition via list-wrapping).
pub(crate) fn inner_type_ignoring_repetition(descr: &SchemaDescriptor, node_index: usize) -> Result<DataType> {
    let node = descr.node(node_index);
    if node.is_leaf() {
        return leaf_arrow_type(node);
    }
    arrow_type_for_node(descr, node_index)
}

pub(crate) fn list_element_field(descr: &SchemaDescriptor, repeated_index: usize) -> Result<Field> {
    let repeated = descr.node(repeated_index);
    if repeated.is_leaf() {
        Ok(Field::new("element", leaf_arrow_type(repeated)?, false))
    } else if repeated.children.len() == 1 {
        let elem_index = repeated.children[0];
        let elem = descr.node(elem_index);
        let dt = inner_type_ignoring_repetition(descr, elem_index)?;
        Ok(Field::new("element", dt, elem.repetition == Repetition::Optional))
    } else {
        let dt = struct_arrow_type(descr, &repeated.children)?;
        Ok(Field::new("element", dt, false))
    }
}

fn struct_arrow_type(descr: &SchemaDescriptor, children: &[usize]) -> Result<DataType> {
    let mut fields = Vec::with_capacity(children.len());
    for &child_index in children {
        fields.push(field_for_child(descr, child_index)?);
    }
    Ok(DataType::Struct(Fields::from(fields)))
}

pub(crate) fn field_for_child(descr: &SchemaDescriptor, child_index: usize) -> Result<Field> {
    let child = descr.node(child_index);
    if child.repetition == Repetition::Repeated {
        Ok(Field::new(&child.name, bare_repeated_list_type(descr, child_index)?, false))
    } else {
        let dt = inner_type_ignoring_repetition(descr, child_index)?;
        Ok(Field::new(&child.name, dt, child.repetition == Repetition::Optional))
    }
}

/// The `List(element)` type for a bare repeated node not wrapped in a
/// LIST-annotated group (spec §4.K, "Bare repeated primitive"). Shared by the
/// schema walk and the nested assembler, which both need the identical element
/// field to agree on naming/nullability.
pub(crate) fn bare_repeated_list_type(descr: &SchemaDescriptor, repeated_index: usize) -> Result<DataType> {
    let element_type = inner_type_ignoring_repetition(descr, repeated_index)?;
    let element_field = Field::new("element", element_type, false);
    Ok(DataType::List(Arc::new(element_field)))
}

/// Builds the Arrow schema for a selection of root-level columns, by dotted leaf
/// path. `None` selects every root child. Returns the selected root-child node
/// indices (in schema order) paired with the derived `Schema`.
pub fn build_schema_for_selection(
    descr: &SchemaDescriptor,
    paths: Option<&[String]>,
) -> Result<(Vec<usize>, Schema)> {
    let root = descr.root();
    let selected_children: Vec<usize> = match paths {
        None => root.children.clone(),
        Some(paths) => {
            let mut out = Vec::with_capacity(paths.len());
            for p in paths {
                let top = p.split('.').next().unwrap_or(p.as_str());
                let idx = root
                    .children
                    .iter()
                    .copied()
                    .find(|&c| descr.node(c).name == top)
                    .ok_or_else(|| general_err!("no root column named {:?}", top))?;
                if !out.contains(&idx) {
                    out.push(idx);
                }
            }
            out
        }
    };
    let mut fields = Vec::with_capacity(selected_children.len());
    for &child_index in &selected_children {
        fields.push(field_for_child(descr, child_index)?);
    }
    Ok((selected_children, Schema::new(fields)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::TimeUnit as PTimeUnit;
    use crate::schema::types::SchemaNode;

    fn leaf(physical: Type, logical: Option<LogicalType>, converted: Option<ConvertedType>, type_length: i32) -> SchemaNode {
        SchemaNode {
            name: "x".to_string(),
            repetition: Repetition::Required,
            physical_type: Some(physical),
            type_length,
            converted_type: converted,
            logical_type: logical,
            parent: Some(0),
            children: Vec::new(),
        }
    }

    #[test]
    fn string_logical_type_maps_to_utf8() {
        let node = leaf(Type::ByteArray, Some(LogicalType::String), None, -1);
        assert_eq!(leaf_arrow_type(&node).unwrap(), DataType::Utf8);
    }

    #[test]
    fn integer_logical_type_narrows_int32() {
        let node = leaf(
            Type::Int32,
            Some(LogicalType::Integer { bit_width: 16, is_signed: false }),
            None,
            -1,
        );
        assert_eq!(leaf_arrow_type(&node).unwrap(), DataType::UInt16);
    }

    #[test]
    fn timestamp_adjusted_to_utc_gets_utc_timezone() {
        let node = leaf(
            Type::Int64,
            Some(LogicalType::Timestamp { unit: PTimeUnit::Micros, is_adjusted_to_utc: true }),
            None,
            -1,
        );
        assert_eq!(
            leaf_arrow_type(&node).unwrap(),
            DataType::Timestamp(ArrowTimeUnit::Microsecond, Some(Arc::from("UTC")))
        );
    }

    #[test]
    fn int96_falls_through_to_nanosecond_timestamp() {
        let node = leaf(Type::Int96, None, None, -1);
        assert_eq!(leaf_arrow_type(&node).unwrap(), DataType::Timestamp(ArrowTimeUnit::Nanosecond, None));
    }

    #[test]
    fn decimal_on_fixed_len_byte_array_uses_type_length() {
        let node = leaf(
            Type::FixedLenByteArray,
            Some(LogicalType::Decimal { scale: 2, precision: 5 }),
            None,
            16,
        );
        assert_eq!(leaf_arrow_type(&node).unwrap(), DataType::FixedSizeBinary(16));
    }

    #[test]
    fn float16_maps_to_two_byte_fixed_size_binary() {
        let node = leaf(Type::FixedLenByteArray, Some(LogicalType::Float16), None, 2);
        assert_eq!(leaf_arrow_type(&node).unwrap(), DataType::FixedSizeBinary(2));
    }
}
