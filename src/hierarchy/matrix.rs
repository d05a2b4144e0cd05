//! Ready-made navigator over nested header trees.
//!
//! Backs the WebAssembly facade and the CLI: hosts hand over a JSON
//! [`MatrixModel`] and get a [`MatrixNavigator`] for it. A flat table is a
//! matrix whose row hierarchy is one level of row-number leaves.

use serde::{Deserialize, Serialize};

use super::HierarchyNavigator;
use crate::binder::LabelSource;
use crate::error::{Result, TablixError};
use crate::types::Axis;

/// One header member and its children
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderNode {
    pub label: String,
    /// Persistence key for column leaves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<HeaderNode>,
}

impl HeaderNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            query_name: None,
            children: Vec::new(),
        }
    }

    pub fn group(label: impl Into<String>, children: Vec<HeaderNode>) -> Self {
        Self {
            label: label.into(),
            query_name: None,
            children,
        }
    }

    #[must_use]
    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = Some(query_name.into());
        self
    }
}

/// Serializable row/column model of a matrix or table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatrixModel {
    pub rows: Vec<HeaderNode>,
    pub columns: Vec<HeaderNode>,
    /// `values[row_leaf][column_leaf]`
    pub values: Vec<Vec<Option<String>>>,
    /// `corner[column_level][row_level]`
    pub corner: Vec<Vec<String>>,
    /// Totals by column leaf
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<Vec<Option<String>>>,
}

impl MatrixModel {
    /// Table with one row-number leaf per data row and one column per header.
    pub fn flat_table(headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        let columns = headers
            .iter()
            .map(|h| HeaderNode::leaf(*h).with_query_name(*h))
            .collect();
        let row_nodes = (1..=rows.len())
            .map(|n| HeaderNode::leaf(n.to_string()))
            .collect();
        let values = rows
            .into_iter()
            .map(|r| r.into_iter().map(Some).collect())
            .collect();
        Self {
            rows: row_nodes,
            columns,
            values,
            corner: vec![vec![String::new()]],
            footer: None,
        }
    }
}

/// Handle of one header member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId {
    pub axis: Axis,
    pub node: usize,
}

#[derive(Debug, Clone)]
struct Node {
    label: String,
    query_name: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    level: usize,
    index: usize,
}

#[derive(Debug, Clone, Default)]
struct Tree {
    nodes: Vec<Node>,
    roots: Vec<usize>,
    leaves: Vec<usize>,
    /// Leaf position of each node that is a leaf
    leaf_position: Vec<Option<usize>>,
    depth: usize,
}

impl Tree {
    fn build(roots: &[HeaderNode]) -> Self {
        let mut tree = Tree::default();
        let mut root_ids = Vec::with_capacity(roots.len());
        for (index, node) in roots.iter().enumerate() {
            root_ids.push(tree.insert(node, None, 0, index));
        }
        tree.roots = root_ids;
        tree.leaf_position = vec![None; tree.nodes.len()];
        for (position, &leaf) in tree.leaves.iter().enumerate() {
            if let Some(slot) = tree.leaf_position.get_mut(leaf) {
                *slot = Some(position);
            }
        }
        tree
    }

    // Depth-first so leaves come out in layout order.
    fn insert(&mut self, node: &HeaderNode, parent: Option<usize>, level: usize, index: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node {
            label: node.label.clone(),
            query_name: node.query_name.clone(),
            parent,
            children: Vec::new(),
            level,
            index,
        });
        self.depth = self.depth.max(level + 1);
        if node.children.is_empty() {
            self.leaves.push(id);
        } else {
            let mut children = Vec::with_capacity(node.children.len());
            for (child_index, child) in node.children.iter().enumerate() {
                children.push(self.insert(child, Some(id), level + 1, child_index));
            }
            if let Some(n) = self.nodes.get_mut(id) {
                n.children = children;
            }
        }
        id
    }

    fn node(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }
}

/// [`HierarchyNavigator`] over a [`MatrixModel`]
#[derive(Debug, Clone)]
pub struct MatrixNavigator {
    rows: Tree,
    columns: Tree,
    model: MatrixModel,
}

impl MatrixNavigator {
    /// Build the navigator, checking that the value grid fits the leaf counts.
    ///
    /// # Errors
    /// Returns `TablixError::InvalidConfig` when `values` has more rows or
    /// columns than the hierarchies have leaves.
    pub fn new(model: MatrixModel) -> Result<Self> {
        let rows = Tree::build(&model.rows);
        let columns = Tree::build(&model.columns);
        if model.values.len() > rows.leaves.len() {
            return Err(TablixError::InvalidConfig(format!(
                "{} value rows for {} row leaves",
                model.values.len(),
                rows.leaves.len()
            )));
        }
        if let Some(wide) = model.values.iter().find(|r| r.len() > columns.leaves.len()) {
            return Err(TablixError::InvalidConfig(format!(
                "value row of {} cells for {} column leaves",
                wide.len(),
                columns.leaves.len()
            )));
        }
        Ok(Self {
            rows,
            columns,
            model,
        })
    }

    /// Parse a JSON [`MatrixModel`].
    ///
    /// # Errors
    /// Returns `TablixError::Json` for malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        let model: MatrixModel = serde_json::from_str(json)?;
        Self::new(model)
    }

    fn tree(&self, axis: Axis) -> &Tree {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Columns => &self.columns,
        }
    }

    fn node(&self, item: &MemberId) -> Option<&Node> {
        self.tree(item.axis).node(item.node)
    }

    fn leaf_position(&self, item: &MemberId) -> Option<usize> {
        self.tree(item.axis)
            .leaf_position
            .get(item.node)
            .copied()
            .flatten()
    }

    /// Display label of a member
    pub fn label(&self, item: &MemberId) -> &str {
        self.node(item).map(|n| n.label.as_str()).unwrap_or("")
    }

    pub fn model(&self) -> &MatrixModel {
        &self.model
    }
}

impl HierarchyNavigator for MatrixNavigator {
    type Item = MemberId;
    type Value = String;

    fn depth(&self, axis: Axis) -> usize {
        self.tree(axis).depth
    }

    fn leaf_count(&self, axis: Axis) -> usize {
        self.tree(axis).leaves.len()
    }

    fn leaf_at(&self, axis: Axis, index: usize) -> Option<MemberId> {
        self.tree(axis)
            .leaves
            .get(index)
            .map(|&node| MemberId { axis, node })
    }

    fn parent(&self, item: &MemberId) -> Option<MemberId> {
        self.node(item)
            .and_then(|n| n.parent)
            .map(|node| MemberId {
                axis: item.axis,
                node,
            })
    }

    fn children(&self, item: &MemberId) -> Vec<MemberId> {
        self.node(item)
            .map(|n| {
                n.children
                    .iter()
                    .map(|&node| MemberId {
                        axis: item.axis,
                        node,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn sibling_count(&self, item: &MemberId) -> usize {
        let tree = self.tree(item.axis);
        match self.node(item).and_then(|n| n.parent) {
            Some(parent) => tree.node(parent).map(|p| p.children.len()).unwrap_or(0),
            None => tree.roots.len(),
        }
    }

    fn index(&self, item: &MemberId) -> usize {
        self.node(item).map(|n| n.index).unwrap_or(0)
    }

    fn level(&self, item: &MemberId) -> usize {
        self.node(item).map(|n| n.level).unwrap_or(0)
    }

    fn is_leaf(&self, item: &MemberId) -> bool {
        self.node(item).is_some_and(|n| n.children.is_empty())
    }

    fn header_item_equals(&self, a: &MemberId, b: &MemberId) -> bool {
        a == b
    }

    fn intersection(&self, row: &MemberId, column: &MemberId) -> Option<String> {
        let r = self.leaf_position(row)?;
        let c = self.leaf_position(column)?;
        self.model.values.get(r)?.get(c)?.clone()
    }

    fn corner(&self, row_level: usize, column_level: usize) -> Option<String> {
        self.model
            .corner
            .get(column_level)
            .and_then(|levels| levels.get(row_level))
            .cloned()
    }

    fn has_footer(&self) -> bool {
        self.model.footer.is_some()
    }

    fn footer(&self, column: &MemberId) -> Option<String> {
        let c = self.leaf_position(column)?;
        self.model.footer.as_ref()?.get(c)?.clone()
    }

    fn column_query_name(&self, column: &MemberId) -> Option<String> {
        self.node(column).and_then(|n| n.query_name.clone())
    }
}

impl LabelSource for MatrixNavigator {
    fn member_label(&self, item: &MemberId) -> String {
        self.label(item).to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_table_shape() {
        let model = MatrixModel::flat_table(
            &["Name", "Qty"],
            vec![
                vec!["apple".into(), "3".into()],
                vec!["pear".into(), "5".into()],
            ],
        );
        let nav = MatrixNavigator::new(model).unwrap();
        assert_eq!(nav.depth(Axis::Rows), 1);
        assert_eq!(nav.depth(Axis::Columns), 1);
        assert_eq!(nav.leaf_count(Axis::Rows), 2);
        let row = nav.leaf_at(Axis::Rows, 1).unwrap();
        let col = nav.leaf_at(Axis::Columns, 1).unwrap();
        assert_eq!(nav.label(&row), "2");
        assert_eq!(nav.intersection(&row, &col).as_deref(), Some("5"));
        assert_eq!(nav.column_query_name(&col).as_deref(), Some("Qty"));
    }

    #[test]
    fn test_nested_leaves_in_depth_first_order() {
        let model = MatrixModel {
            columns: vec![
                HeaderNode::group("2023", vec![HeaderNode::leaf("Q1"), HeaderNode::leaf("Q2")]),
                HeaderNode::group("2024", vec![HeaderNode::leaf("Q1")]),
            ],
            rows: vec![HeaderNode::leaf("Total")],
            ..MatrixModel::default()
        };
        let nav = MatrixNavigator::new(model).unwrap();
        assert_eq!(nav.leaf_count(Axis::Columns), 3);
        let last = nav.leaf_at(Axis::Columns, 2).unwrap();
        let parent = nav.parent(&last).unwrap();
        assert_eq!(nav.label(&parent), "2024");
        assert!(nav.is_last_item(&last));
        assert!(nav.is_first_item(&last));
        assert_eq!(nav.sibling_count(&parent), 2);
        assert_eq!(nav.children(&parent).len(), 1);
        // Same label in different groups is a different member.
        let first = nav.leaf_at(Axis::Columns, 0).unwrap();
        assert!(!nav.header_item_equals(&first, &last));
    }

    #[test]
    fn test_rejects_values_wider_than_columns() {
        let model = MatrixModel {
            rows: vec![HeaderNode::leaf("r")],
            columns: vec![HeaderNode::leaf("c")],
            values: vec![vec![Some("1".into()), Some("2".into())]],
            ..MatrixModel::default()
        };
        assert!(MatrixNavigator::new(model).is_err());
    }

    #[test]
    fn test_from_json_with_footer() {
        let json = r#"{
            "rows": [{"label": "a"}],
            "columns": [{"label": "x", "queryName": "t.x"}],
            "values": [["1"]],
            "footer": ["10"]
        }"#;
        let nav = MatrixNavigator::from_json(json).unwrap();
        let col = nav.leaf_at(Axis::Columns, 0).unwrap();
        assert!(nav.has_footer());
        assert_eq!(nav.footer(&col).as_deref(), Some("10"));
    }
}
