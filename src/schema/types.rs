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

//! Component Q: the schema tree, reconstructed as an arena rather than a
//! `Rc`/`RefCell` parent-pointer graph (spec §9, "Cyclic references").

use crate::basic::{ConvertedType, LogicalType, Repetition, Type};
use crate::errors::{general_err, Result};

/// One node of the schema tree. Leaves carry a physical type and no children;
/// group nodes carry children and no physical type.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub name: String,
    pub repetition: Repetition,
    pub physical_type: Option<Type>,
    pub type_length: i32,
    pub converted_type: Option<ConvertedType>,
    pub logical_type: Option<LogicalType>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl SchemaNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The full arena plus the derived leaf list in pre-order, each entry a
/// [`ColumnDescriptor`].
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    nodes: Vec<SchemaNode>,
    root: usize,
    leaves: Vec<ColumnDescriptor>,
    /// `node_index` -> position in `leaves`, for the nested assembler's need to
    /// locate a subtree's contiguous slice of leaf `ColumnResult`s (SPEC_FULL.md
    /// §4.Q) without a linear scan per lookup.
    leaf_index_by_node: Vec<Option<usize>>,
}

/// Per-leaf nullability/nesting-depth facts, the "definitive reference" spec §3
/// calls out: max definition/repetition level plus the path from root.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub node_index: usize,
    pub max_def_level: i32,
    pub max_rep_level: i32,
    pub path: Vec<String>,
}

impl ColumnDescriptor {
    pub fn dotted_path(&self) -> String {
        self.path.join(".")
    }
}

impl SchemaDescriptor {
    pub fn node(&self, index: usize) -> &SchemaNode {
        &self.nodes[index]
    }

    pub fn root_index(&self) -> usize {
        self.root
    }

    pub fn root(&self) -> &SchemaNode {
        &self.nodes[self.root]
    }

    pub fn leaves(&self) -> &[ColumnDescriptor] {
        &self.leaves
    }

    pub fn num_leaves(&self) -> usize {
        self.leaves.len()
    }

    pub fn leaf_by_path(&self, dotted_path: &str) -> Option<&ColumnDescriptor> {
        self.leaves.iter().find(|l| l.dotted_path() == dotted_path)
    }

    /// Builds the arena from a flat pre-order list of decoded `SchemaElement`s, as
    /// produced by the thrift-decoded `FileMetaData::schema` (SPEC_FULL.md §4.Q).
    /// `num_children[i]` for a group node is how many of the following entries
    /// (recursively expanded) are its direct children; leaves have no entry.
    pub fn from_thrift(elements: &[parquet_format::SchemaElement]) -> Result<Self> {
        if elements.is_empty() {
            return Err(general_err!("schema element list is empty"));
        }
        let mut nodes = Vec::with_capacity(elements.len());
        let mut cursor = 0usize;
        let root = build_node(elements, &mut cursor, None, &mut nodes)?;
        if cursor != elements.len() {
            return Err(general_err!(
                "schema element list has {} trailing unconsumed elements",
                elements.len() - cursor
            ));
        }
        let mut leaves = Vec::new();
        let mut path = Vec::new();
        collect_leaves(&nodes, root, 0, 0, &mut path, &mut leaves);
        let mut leaf_index_by_node = vec![None; nodes.len()];
        for (i, l) in leaves.iter().enumerate() {
            leaf_index_by_node[l.node_index] = Some(i);
        }
        Ok(SchemaDescriptor {
            nodes,
            root,
            leaves,
            leaf_index_by_node,
        })
    }

    /// Number of leaves in the subtree rooted at `node_index`, inclusive.
    fn leaf_count(&self, node_index: usize) -> usize {
        let node = self.node(node_index);
        if node.is_leaf() {
            1
        } else {
            node.children.iter().map(|&c| self.leaf_count(c)).sum()
        }
    }

    /// The contiguous range into `self.leaves()` spanned by `node_index`'s
    /// subtree. Every group node's descendant leaves are contiguous in pre-order,
    /// so a root child's leaves can be sliced out of the flat per-chunk leaf
    /// results without re-walking the tree per column (spec §4.L, "column
    /// selection").
    pub fn leaf_range_for_node(&self, node_index: usize) -> std::ops::Range<usize> {
        let first = self.first_descendant_leaf(node_index);
        let start = self.leaf_index_by_node[first].expect("leaf must be indexed");
        start..start + self.leaf_count(node_index)
    }
}

fn build_node(
    elements: &[parquet_format::SchemaElement],
    cursor: &mut usize,
    parent: Option<usize>,
    nodes: &mut Vec<SchemaNode>,
) -> Result<usize> {
    if *cursor >= elements.len() {
        return Err(general_err!("schema element list truncated"));
    }
    let elem = &elements[*cursor];
    *cursor += 1;
    let repetition = match elem.repetition_type {
        Some(r) => Repetition::from(r),
        None if parent.is_none() => Repetition::Required,
        None => {
            return Err(general_err!(
                "non-root schema element {:?} missing repetition_type",
                elem.name
            ))
        }
    };
    let physical_type = elem.type_.map(Type::from);
    let num_children = elem.num_children.unwrap_or(0).max(0) as usize;
    let this_index = nodes.len();
    nodes.push(SchemaNode {
        name: elem.name.clone(),
        repetition,
        physical_type,
        type_length: elem.type_length.unwrap_or(-1),
        converted_type: elem.converted_type.map(ConvertedType::from),
        logical_type: elem.logical_type.clone().map(LogicalType::from_thrift),
        parent,
        children: Vec::with_capacity(num_children),
    });
    if physical_type.is_some() && num_children > 0 {
        return Err(general_err!(
            "schema element {:?} has a physical type but declares children",
            elem.name
        ));
    }
    for _ in 0..num_children {
        let child = build_node(elements, cursor, Some(this_index), nodes)?;
        nodes[this_index].children.push(child);
    }
    Ok(this_index)
}

fn collect_leaves(
    nodes: &[SchemaNode],
    index: usize,
    accumulated_def: i32,
    accumulated_rep: i32,
    path: &mut Vec<String>,
    leaves: &mut Vec<ColumnDescriptor>,
) {
    let node = &nodes[index];
    let is_root = node.parent.is_none();
    let (def, rep) = if is_root {
        (accumulated_def, accumulated_rep)
    } else {
        path.push(node.name.clone());
        let def = accumulated_def
            + match node.repetition {
                Repetition::Optional | Repetition::Repeated => 1,
                Repetition::Required => 0,
            };
        let rep = accumulated_rep + if node.repetition == Repetition::Repeated { 1 } else { 0 };
        (def, rep)
    };
    if node.is_leaf() && !is_root {
        leaves.push(ColumnDescriptor {
            node_index: index,
            max_def_level: def,
            max_rep_level: rep,
            path: path.clone(),
        });
    } else {
        for &child in &node.children {
            collect_leaves(nodes, child, def, rep, path, leaves);
        }
    }
    if !is_root {
        path.pop();
    }
}

/// The three shapes component K's nested assembler classifies a non-leaf node
/// into (spec §4.K, "Classification of a group node").
#[derive(Debug, Clone)]
pub enum GroupShape {
    /// Exactly one repeated child; `repeated_index` names it.
    List { repeated_index: usize },
    /// A repeated key_value child with 1 (key only) or 2 (key, value) leaf
    /// children.
    Map {
        key_value_index: usize,
        key_index: usize,
        value_index: Option<usize>,
    },
    /// Everything else.
    Struct,
}

impl SchemaDescriptor {
    /// Accumulated definition/repetition level of `node_index`, counting every
    /// Optional/Repeated ancestor *including itself* but excluding the root
    /// (spec §4.K, "Accumulated-def-level"/"Accumulated-rep-level"). Defined for
    /// leaves and group nodes alike, unlike `ColumnDescriptor`'s leaf-only fields.
    pub fn accumulated_levels(&self, node_index: usize) -> (i32, i32) {
        let mut chain = Vec::new();
        let mut cur = Some(node_index);
        while let Some(idx) = cur {
            let node = self.node(idx);
            if node.parent.is_none() {
                break;
            }
            chain.push(idx);
            cur = node.parent;
        }
        let mut def = 0;
        let mut rep = 0;
        for idx in chain {
            match self.node(idx).repetition {
                Repetition::Optional => def += 1,
                Repetition::Repeated => {
                    def += 1;
                    rep += 1;
                }
                Repetition::Required => {}
            }
        }
        (def, rep)
    }

    /// Classifies a group node per spec §4.K. Callers must only pass a group
    /// (non-leaf) node index.
    pub fn classify_group(&self, node_index: usize) -> GroupShape {
        let node = self.node(node_index);
        let is_list_annotated = matches!(node.logical_type, Some(LogicalType::List))
            || matches!(node.converted_type, Some(ConvertedType::List));
        if is_list_annotated && node.children.len() == 1 {
            let repeated_index = node.children[0];
            if self.node(repeated_index).repetition == Repetition::Repeated {
                return GroupShape::List { repeated_index };
            }
        }
        let is_map_annotated = matches!(node.logical_type, Some(LogicalType::Map))
            || matches!(
                node.converted_type,
                Some(ConvertedType::Map) | Some(ConvertedType::MapKeyValue)
            );
        if is_map_annotated && node.children.len() == 1 {
            let kv_index = node.children[0];
            let kv = self.node(kv_index);
            if kv.repetition == Repetition::Repeated && (kv.children.len() == 1 || kv.children.len() == 2) {
                return GroupShape::Map {
                    key_value_index: kv_index,
                    key_index: kv.children[0],
                    value_index: kv.children.get(1).copied(),
                };
            }
        }
        GroupShape::Struct
    }

    /// The leftmost descendant leaf of `node_index`, used by the nested
    /// assembler to pick "the first descendant leaf of R" whose level streams
    /// drive a list/map node's offset computation (spec §4.K).
    pub fn first_descendant_leaf(&self, node_index: usize) -> usize {
        let node = self.node(node_index);
        if node.is_leaf() {
            return node_index;
        }
        self.first_descendant_leaf(node.children[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parquet_format::{FieldRepetitionType, SchemaElement, Type as TType};

    fn leaf(name: &str, rep: FieldRepetitionType, ty: TType) -> SchemaElement {
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

    fn group(name: &str, rep: Option<FieldRepetitionType>, num_children: i32) -> SchemaElement {
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
    fn flat_schema_computes_levels() {
        let elements = vec![
            group("schema", None, 2),
            leaf("a", FieldRepetitionType::REQUIRED, TType::INT32),
            leaf("b", FieldRepetitionType::OPTIONAL, TType::BYTE_ARRAY),
        ];
        let descriptor = SchemaDescriptor::from_thrift(&elements).unwrap();
        assert_eq!(descriptor.num_leaves(), 2);
        assert_eq!(descriptor.leaves()[0].max_def_level, 0);
        assert_eq!(descriptor.leaves()[1].max_def_level, 1);
        assert_eq!(descriptor.leaves()[1].dotted_path(), "b");
    }

    #[test]
    fn nested_list_computes_accumulated_levels() {
        // schema -> list (optional, 1 child) -> list_tuple (repeated, 1 child) -> element (optional int32)
        let elements = vec![
            group("schema", None, 1),
            group("my_list", Some(FieldRepetitionType::OPTIONAL), 1),
            group("list", Some(FieldRepetitionType::REPEATED), 1),
            leaf("element", FieldRepetitionType::OPTIONAL, TType::INT32),
        ];
        let descriptor = SchemaDescriptor::from_thrift(&elements).unwrap();
        assert_eq!(descriptor.num_leaves(), 1);
        let leaf = &descriptor.leaves()[0];
        assert_eq!(leaf.max_def_level, 3);
        assert_eq!(leaf.max_rep_level, 1);
    }
}
