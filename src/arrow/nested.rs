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

//! Component K: assembles struct/list/map arrays out of the flat leaf arrays
//! component J built, using the per-leaf definition/repetition level streams and
//! the schema tree's [`GroupShape`] classification (spec §4.K).
//!
//! One simplification from the general Dremel algorithm: a repeated group
//! nested inside the element of another repeated group (list-of-list, beyond
//! one level of list/map nesting) is not supported. Every leaf directly or
//! indirectly reached through a single list/map boundary is assumed to share
//! that boundary's level-stream indexing, which holds for struct-of-primitives
//! and primitive list/map elements — the shapes spec.md's scenarios exercise —
//! but not for schemas with independently-nested repeated groups below a list
//! element (documented in DESIGN.md).

use std::sync::Arc;

use arrow_array::{make_array, Array, ArrayRef, UInt32Array};
use arrow_buffer::Buffer;
use arrow_data::ArrayData;
use arrow_schema::{DataType, Field, Fields};

use crate::arrow::schema::{bare_repeated_list_type, field_for_child, list_element_field};
use crate::basic::Repetition;
use crate::errors::{general_err, Result};
use crate::schema::types::{GroupShape, SchemaDescriptor};
use crate::util::memory::build_validity_bitmap;

/// One decoded leaf, as produced by component G plus J: the flat array and,
/// when the leaf is nullable or repeated, its full per-physical-position level
/// streams (length `num_values`). Indexed by global leaf index (the same order
/// as [`SchemaDescriptor::leaves`]).
pub struct LeafArray {
    pub array: ArrayRef,
    pub def_levels: Option<Vec<i32>>,
    pub rep_levels: Option<Vec<i32>>,
}

/// Assembles every root child named in `root_children` into its final Arrow
/// array. `leaves` must be indexed by global leaf index and cover every leaf
/// reachable from `root_children` (spec §4.L feeds this from the per-column
/// decode results of one row group).
pub fn assemble_root_children(
    descr: &SchemaDescriptor,
    root_children: &[usize],
    leaves: &[LeafArray],
    row_count: usize,
) -> Result<Vec<ArrayRef>> {
    root_children
        .iter()
        .map(|&child| assemble_field(descr, child, leaves, None, row_count))
        .collect()
}

/// Dispatches on a schema node reached as a struct field or root child: bare
/// repeated nodes (leaf or group) are list-wrapped regardless of their own
/// shape, matching how component I's schema walk treats them.
fn assemble_field(
    descr: &SchemaDescriptor,
    node_index: usize,
    leaves: &[LeafArray],
    selector: Option<&[u32]>,
    parent_count: usize,
) -> Result<ArrayRef> {
    let node = descr.node(node_index);
    if node.repetition == Repetition::Repeated {
        return assemble_bare_repeated(descr, node_index, leaves, selector, parent_count);
    }
    if node.is_leaf() {
        return materialize_leaf(descr, node_index, leaves, selector, parent_count);
    }
    match descr.classify_group(node_index) {
        GroupShape::Struct => assemble_struct(descr, node_index, leaves, selector, parent_count),
        GroupShape::List { repeated_index } => {
            let d_list = descr.accumulated_levels(node_index).0;
            let d_elem = descr.accumulated_levels(repeated_index).0;
            let r_list = descr.accumulated_levels(repeated_index).1;
            assemble_list(
                descr,
                repeated_index,
                list_element_field(descr, repeated_index)?,
                d_list,
                d_elem,
                r_list,
                leaves,
                selector,
                parent_count,
            )
        }
        GroupShape::Map { key_value_index, key_index, value_index } => {
            assemble_map(descr, node_index, key_value_index, key_index, value_index, leaves, selector, parent_count)
        }
    }
}

/// A bare repeated node (no enclosing LIST-annotated group) has no separate
/// "list" level of its own: the element def level doubles as the list's
/// presence level, so the list can only be empty or absent through an
/// *ancestor's* optionality, never its own (spec §4.K, "Bare repeated").
fn assemble_bare_repeated(
    descr: &SchemaDescriptor,
    repeated_index: usize,
    leaves: &[LeafArray],
    selector: Option<&[u32]>,
    parent_count: usize,
) -> Result<ArrayRef> {
    let d_elem = descr.accumulated_levels(repeated_index).0;
    let r_list = descr.accumulated_levels(repeated_index).1;
    let element_field = if descr.node(repeated_index).is_leaf() {
        Field::new("element", crate::arrow::schema::leaf_arrow_type(descr.node(repeated_index))?, false)
    } else if let DataType::List(f) = bare_repeated_list_type(descr, repeated_index)? {
        (*f).clone()
    } else {
        unreachable!("bare_repeated_list_type always returns a List")
    };
    assemble_list(descr, repeated_index, element_field, d_elem - 1, d_elem, r_list, leaves, selector, parent_count)
}

fn materialize_leaf(
    descr: &SchemaDescriptor,
    node_index: usize,
    leaves: &[LeafArray],
    selector: Option<&[u32]>,
    parent_count: usize,
) -> Result<ArrayRef> {
    let leaf_idx = descr.leaf_range_for_node(node_index).start;
    let leaf = &leaves[leaf_idx];
    apply_selector(&leaf.array, selector, parent_count)
}

fn apply_selector(array: &ArrayRef, selector: Option<&[u32]>, expected_len: usize) -> Result<ArrayRef> {
    match selector {
        None => {
            if array.len() != expected_len {
                return Err(general_err!(
                    "leaf array length {} does not match expected row count {}",
                    array.len(),
                    expected_len
                ));
            }
            Ok(array.clone())
        }
        Some(indices) => {
            let idx_array = UInt32Array::from(indices.to_vec());
            Ok(arrow_select::take::take(array.as_ref(), &idx_array, None)?)
        }
    }
}

fn select_levels(levels: &[i32], selector: Option<&[u32]>) -> Vec<i32> {
    match selector {
        None => levels.to_vec(),
        Some(indices) => indices.iter().map(|&i| levels[i as usize]).collect(),
    }
}

fn assemble_struct(
    descr: &SchemaDescriptor,
    node_index: usize,
    leaves: &[LeafArray],
    selector: Option<&[u32]>,
    parent_count: usize,
) -> Result<ArrayRef> {
    let node = descr.node(node_index);
    let mut fields = Vec::with_capacity(node.children.len());
    let mut arrays = Vec::with_capacity(node.children.len());
    for &child in &node.children {
        fields.push(field_for_child(descr, child)?);
        arrays.push(assemble_field(descr, child, leaves, selector, parent_count)?);
    }

    let validity = if node.repetition == Repetition::Optional {
        let d_struct = descr.accumulated_levels(node_index).0;
        let rep_leaf_idx = descr.leaf_range_for_node(node_index).start;
        let def_levels = leaves[rep_leaf_idx]
            .def_levels
            .as_ref()
            .ok_or_else(|| general_err!("optional struct's representative leaf carries no definition levels"))?;
        let restricted = select_levels(def_levels, selector);
        Some(build_validity_bitmap(parent_count, |i| restricted[i] >= d_struct).0)
    } else {
        None
    };

    let mut builder = ArrayData::builder(DataType::Struct(Fields::from(fields))).len(parent_count);
    for arr in &arrays {
        builder = builder.add_child_data(arr.to_data());
    }
    if let Some(v) = validity {
        builder = builder.null_bit_buffer(Some(v));
    }
    Ok(make_array(builder.build()?))
}

/// Walks the representative leaf's rep/def streams once, building the new
/// list's offsets, validity, and the selection of physical positions
/// (`take_indices`) that feed the element child, per spec §4.K's per-position
/// walk. `selector`/`parent_count` restrict this walk to an already-selected
/// subset of physical positions, for a list nested inside another list's
/// struct element.
#[allow(clippy::too_many_arguments)]
fn assemble_list(
    descr: &SchemaDescriptor,
    repeated_index: usize,
    element_field: Field,
    d_list: i32,
    d_elem: i32,
    r_list: i32,
    leaves: &[LeafArray],
    selector: Option<&[u32]>,
    parent_count: usize,
) -> Result<ArrayRef> {
    let rep_leaf_idx = descr.leaf_range_for_node(repeated_index).start;
    let rep_leaf = &leaves[rep_leaf_idx];
    let rep_levels = rep_leaf
        .rep_levels
        .as_ref()
        .ok_or_else(|| general_err!("repeated node's representative leaf carries no repetition levels"))?;
    let def_levels = rep_leaf
        .def_levels
        .as_ref()
        .ok_or_else(|| general_err!("repeated node's representative leaf carries no definition levels"))?;
    let rep_levels = select_levels(rep_levels, selector);
    let def_levels = select_levels(def_levels, selector);

    let mut offsets: Vec<i32> = Vec::with_capacity(parent_count + 1);
    let mut list_valid: Vec<bool> = Vec::with_capacity(parent_count);
    let mut take_indices: Vec<u32> = Vec::new();
    let mut element_count: i32 = 0;

    for (i, (&r, &d)) in rep_levels.iter().zip(def_levels.iter()).enumerate() {
        if r < r_list {
            offsets.push(element_count);
            list_valid.push(d >= d_list);
            if d >= d_elem {
                element_count += 1;
                take_indices.push(i as u32);
            }
        } else if r == r_list {
            if d >= d_elem {
                element_count += 1;
                take_indices.push(i as u32);
            }
        }
        // r > r_list belongs to a deeper nesting level this assembler does not
        // support; silently skipped (see module docs).
    }
    offsets.push(element_count);
    if offsets.len() != parent_count + 1 {
        return Err(general_err!(
            "list level walk produced {} parent slots, expected {}",
            offsets.len() - 1,
            parent_count
        ));
    }

    let element_selector: Vec<u32> = match selector {
        None => take_indices,
        Some(outer) => take_indices.iter().map(|&i| outer[i as usize]).collect(),
    };
    let element_array = assemble_list_element(descr, repeated_index, leaves, &element_selector, element_count as usize)?;
    if element_array.data_type() != element_field.data_type() {
        return Err(general_err!(
            "list element array type {:?} disagrees with schema-derived type {:?}",
            element_array.data_type(),
            element_field.data_type()
        ));
    }

    let (validity, _) = build_validity_bitmap(parent_count, |i| list_valid[i]);
    let offsets_buffer = Buffer::from_vec(offsets);
    let list_type = DataType::List(Arc::new(element_field));
    let data = ArrayData::builder(list_type)
        .len(parent_count)
        .add_buffer(offsets_buffer)
        .add_child_data(element_array.to_data())
        .null_bit_buffer(Some(validity))
        .build()?;
    Ok(make_array(data))
}

fn assemble_list_element(
    descr: &SchemaDescriptor,
    repeated_index: usize,
    leaves: &[LeafArray],
    element_selector: &[u32],
    element_count: usize,
) -> Result<ArrayRef> {
    let repeated = descr.node(repeated_index);
    let selector = Some(element_selector);
    if repeated.is_leaf() {
        materialize_leaf(descr, repeated_index, leaves, selector, element_count)
    } else if repeated.children.len() == 1 {
        assemble_field(descr, repeated.children[0], leaves, selector, element_count)
    } else {
        assemble_struct(descr, repeated_index, leaves, selector, element_count)
    }
}

#[allow(clippy::too_many_arguments)]
fn assemble_map(
    descr: &SchemaDescriptor,
    node_index: usize,
    key_value_index: usize,
    key_index: usize,
    value_index: Option<usize>,
    leaves: &[LeafArray],
    selector: Option<&[u32]>,
    parent_count: usize,
) -> Result<ArrayRef> {
    let d_list = descr.accumulated_levels(node_index).0;
    let d_elem = descr.accumulated_levels(key_value_index).0;
    let r_list = descr.accumulated_levels(key_value_index).1;

    let rep_leaf_idx = descr.leaf_range_for_node(key_value_index).start;
    let rep_leaf = &leaves[rep_leaf_idx];
    let rep_levels = rep_leaf
        .rep_levels
        .as_ref()
        .ok_or_else(|| general_err!("map's representative leaf carries no repetition levels"))?;
    let def_levels = rep_leaf
        .def_levels
        .as_ref()
        .ok_or_else(|| general_err!("map's representative leaf carries no definition levels"))?;
    let rep_levels = select_levels(rep_levels, selector);
    let def_levels = select_levels(def_levels, selector);

    let mut offsets: Vec<i32> = Vec::with_capacity(parent_count + 1);
    let mut map_valid: Vec<bool> = Vec::with_capacity(parent_count);
    let mut take_indices: Vec<u32> = Vec::new();
    let mut entry_count: i32 = 0;

    for (i, (&r, &d)) in rep_levels.iter().zip(def_levels.iter()).enumerate() {
        if r < r_list {
            offsets.push(entry_count);
            map_valid.push(d >= d_list);
            if d >= d_elem {
                entry_count += 1;
                take_indices.push(i as u32);
            }
        } else if r == r_list && d >= d_elem {
            entry_count += 1;
            take_indices.push(i as u32);
        }
    }
    offsets.push(entry_count);

    let entry_selector: Vec<u32> = match selector {
        None => take_indices,
        Some(outer) => take_indices.iter().map(|&i| outer[i as usize]).collect(),
    };
    let key_array = assemble_field(descr, key_index, leaves, Some(&entry_selector), entry_count as usize)?;
    let value_array = match value_index {
        Some(vi) => assemble_field(descr, vi, leaves, Some(&entry_selector), entry_count as usize)?,
        None => {
            let nulls = build_validity_bitmap(entry_count as usize, |_| false).0;
            make_array(
                ArrayData::builder(DataType::Null)
                    .len(entry_count as usize)
                    .null_bit_buffer(Some(nulls))
                    .build()?,
            )
        }
    };

    let key_field = Field::new("key", key_array.data_type().clone(), false);
    let value_field = Field::new("value", value_array.data_type().clone(), value_index.is_some());
    let entries_type = DataType::Struct(Fields::from(vec![key_field.clone(), value_field.clone()]));
    let entries_data = ArrayData::builder(entries_type)
        .len(entry_count as usize)
        .add_child_data(key_array.to_data())
        .add_child_data(value_array.to_data())
        .build()?;

    let (validity, _) = build_validity_bitmap(parent_count, |i| map_valid[i]);
    let offsets_buffer = Buffer::from_vec(offsets);
    let map_type = DataType::Map(Arc::new(Field::new("entries", DataType::Struct(Fields::from(vec![key_field, value_field])), false)), false);
    let data = ArrayData::builder(map_type)
        .len(parent_count)
        .add_buffer(offsets_buffer)
        .add_child_data(entries_data)
        .null_bit_buffer(Some(validity))
        .build()?;
    Ok(make_array(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Int32Array, ListArray};
    use parquet_format::{FieldRepetitionType, SchemaElement, Type as TType};

    fn leaf_elem(name: &str, rep: FieldRepetitionType, ty: TType) -> SchemaElement {
        SchemaElement {
            type_: Some(ty),
            type_length: None,
            repetition_type: Some(rep),
            name: name.to_string(),
            num_children: None,
            converted_type: None,
            scale: None,
            precision: None,
            field_id: None,
            logical_type: None,
        }
    }

    fn group_elem(name: &str, rep: Option<FieldRepetitionType>, num_children: i32) -> SchemaElement {
        SchemaElement {
            type_: None,
            type_length: None,
            repetition_type: rep,
            name: name.to_string(),
            num_children: Some(num_children),
            converted_type: None,
            scale: None,
            precision: None,
            field_id: None,
            logical_type: None,
        }
    }

    #[test]
    fn three_level_optional_list_of_optional_int32() {
        // schema -> my_list (optional, 1 child) -> list (repeated, 1 child) -> element (optional int32)
        let elements = vec![
            group_elem("schema", None, 1),
            group_elem("my_list", Some(FieldRepetitionType::OPTIONAL), 1),
            group_elem("list", Some(FieldRepetitionType::REPEATED), 1),
            leaf_elem("element", FieldRepetitionType::OPTIONAL, TType::INT32),
        ];
        let descr = SchemaDescriptor::from_thrift(&elements).unwrap();
        let root_child = descr.root().children[0];

        // 3 rows: row0=[7], row1=null, row2=[9, null]
        let rep_levels = vec![0, 0, 0, 1];
        let def_levels = vec![3, 0, 3, 2];
        let array = crate::arrow::array_builder::build_leaf_array(
            crate::column::build_state::ValueStorage::Int32(vec![7, 9]),
            &DataType::Int32,
            &def_levels,
            3,
            1,
            4,
        )
        .unwrap();
        let leaves = vec![LeafArray {
            array,
            def_levels: Some(def_levels),
            rep_levels: Some(rep_levels),
        }];

        let out = assemble_root_children(&descr, &[root_child], &leaves, 3).unwrap();
        let list = out[0].as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.is_valid(0));
        assert!(list.is_null(1));
        assert!(list.is_valid(2));

        let row0 = list.value(0);
        let row0 = row0.as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(row0.len(), 1);
        assert_eq!(row0.value(0), 7);

        let row2 = list.value(2);
        let row2 = row2.as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(row2.len(), 2);
        assert_eq!(row2.value(0), 9);
        assert!(row2.is_null(1));
    }

    #[test]
    fn bare_repeated_primitive_has_no_null_elements() {
        // schema -> values (repeated int32)
        let elements = vec![group_elem("schema", None, 1), leaf_elem("values", FieldRepetitionType::REPEATED, TType::INT32)];
        let descr = SchemaDescriptor::from_thrift(&elements).unwrap();
        let root_child = descr.root().children[0];

        let rep_levels = vec![0, 1, 0];
        let def_levels = vec![1, 1, 1];
        let array = crate::arrow::array_builder::build_leaf_array(
            crate::column::build_state::ValueStorage::Int32(vec![1, 2, 3]),
            &DataType::Int32,
            &def_levels,
            1,
            1,
            3,
        )
        .unwrap();
        let leaves = vec![LeafArray {
            array,
            def_levels: Some(def_levels),
            rep_levels: Some(rep_levels),
        }];

        let out = assemble_root_children(&descr, &[root_child], &leaves, 2).unwrap();
        let list = out[0].as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.value(0).len(), 2);
        assert_eq!(list.value(1).len(), 1);
    }
}
