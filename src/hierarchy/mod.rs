//! Read-only access to row and column hierarchies.
//!
//! The grid never interprets hierarchy items. Every question about structure
//! (depth, parent, children, level, leaf-ness, equality) goes through a
//! [`HierarchyNavigator`], so flat tables and nested matrices share the same
//! layout code.

pub mod matrix;

use std::fmt;

use crate::error::{Result, TablixError};
use crate::types::Axis;

pub use matrix::{HeaderNode, MatrixModel, MatrixNavigator, MemberId};

/// Uniform view over the row and column hierarchies of a data view.
pub trait HierarchyNavigator {
    /// Opaque hierarchy member handle
    type Item: Clone + fmt::Debug;
    /// Body, corner and footer content
    type Value: Clone + fmt::Debug;

    /// Number of header levels on `axis`
    fn depth(&self, axis: Axis) -> usize;

    /// Number of leaves on `axis`
    fn leaf_count(&self, axis: Axis) -> usize;

    /// The leaf at `index` in layout order
    fn leaf_at(&self, axis: Axis, index: usize) -> Option<Self::Item>;

    fn parent(&self, item: &Self::Item) -> Option<Self::Item>;

    fn children(&self, item: &Self::Item) -> Vec<Self::Item>;

    /// Number of items sharing `item`'s parent (or the root list), itself included
    fn sibling_count(&self, item: &Self::Item) -> usize;

    /// Index of `item` among its siblings
    fn index(&self, item: &Self::Item) -> usize;

    /// Header level the item starts at (0 = outermost)
    fn level(&self, item: &Self::Item) -> usize;

    fn is_leaf(&self, item: &Self::Item) -> bool;

    /// Identity used to match cells across renders
    fn header_item_equals(&self, a: &Self::Item, b: &Self::Item) -> bool;

    /// Body value at a row leaf and column leaf
    fn intersection(&self, row: &Self::Item, column: &Self::Item) -> Option<Self::Value>;

    /// Corner content at a row-header level and column-header level
    fn corner(&self, row_level: usize, column_level: usize) -> Option<Self::Value>;

    /// Whether the grid shows a totals row
    fn has_footer(&self) -> bool {
        false
    }

    /// Totals value under a column leaf
    fn footer(&self, _column: &Self::Item) -> Option<Self::Value> {
        None
    }

    /// Stable name a column leaf is persisted under
    fn column_query_name(&self, _column: &Self::Item) -> Option<String> {
        None
    }

    fn is_first_item(&self, item: &Self::Item) -> bool {
        self.index(item) == 0
    }

    fn is_last_item(&self, item: &Self::Item) -> bool {
        self.index(item) + 1 >= self.sibling_count(item)
    }
}

/// One member on the path from a leaf to its outermost ancestor.
#[derive(Debug, Clone)]
pub struct PathEntry<I> {
    pub item: I,
    /// First header level this member occupies
    pub level: usize,
    /// Number of header levels the member covers
    pub level_span: usize,
    /// Every member between the leaf and this one is a first child
    pub leaf_is_first: bool,
    /// Every member between the leaf and this one is a last child
    pub leaf_is_last: bool,
}

/// Resolve the member path of `leaf`, outermost member first.
///
/// # Errors
/// Returns `TablixError::InconsistentHierarchy` when levels do not strictly
/// increase towards the leaf, exceed the axis depth, or the parent chain is
/// longer than the depth (a cycle).
pub fn member_path<N: HierarchyNavigator>(
    navigator: &N,
    axis: Axis,
    leaf: &N::Item,
) -> Result<Vec<PathEntry<N::Item>>> {
    let depth = navigator.depth(axis);
    if !navigator.is_leaf(leaf) {
        return Err(TablixError::InconsistentHierarchy(format!(
            "{axis:?} leaf {leaf:?} reports children"
        )));
    }

    let mut chain: Vec<N::Item> = vec![leaf.clone()];
    let mut current = leaf.clone();
    while let Some(parent) = navigator.parent(&current) {
        if chain.len() >= depth.max(1) {
            return Err(TablixError::InconsistentHierarchy(format!(
                "{axis:?} parent chain of {leaf:?} is deeper than {depth} levels"
            )));
        }
        chain.push(parent.clone());
        current = parent;
    }
    chain.reverse();

    let mut path = Vec::with_capacity(chain.len());
    let next_levels: Vec<usize> = chain
        .iter()
        .skip(1)
        .map(|item| navigator.level(item))
        .chain(std::iter::once(depth))
        .collect();
    let mut previous_level: Option<usize> = None;
    for (item, end) in chain.into_iter().zip(next_levels) {
        let level = navigator.level(&item);
        let out_of_order = previous_level.is_some_and(|p| level <= p);
        if out_of_order || level >= depth || end <= level || end > depth {
            return Err(TablixError::InconsistentHierarchy(format!(
                "{axis:?} member {item:?} has level {level} (next {end}, depth {depth})"
            )));
        }
        previous_level = Some(level);
        path.push(PathEntry {
            item,
            level,
            level_span: end - level,
            leaf_is_first: true,
            leaf_is_last: true,
        });
    }

    // Walk back up from the leaf to fill the first/last flags.
    let mut all_first = true;
    let mut all_last = true;
    for entry in path.iter_mut().rev() {
        entry.leaf_is_first = all_first;
        entry.leaf_is_last = all_last;
        all_first = all_first && navigator.is_first_item(&entry.item);
        all_last = all_last && navigator.is_last_item(&entry.item);
    }
    Ok(path)
}

/// Fetch leaf `index`, treating a missing leaf below the leaf count as a shape error.
///
/// # Errors
/// Returns `TablixError::InconsistentHierarchy` if the navigator has no item
/// for an index it claims to have.
pub fn require_leaf<N: HierarchyNavigator>(
    navigator: &N,
    axis: Axis,
    index: usize,
) -> Result<N::Item> {
    navigator.leaf_at(axis, index).ok_or_else(|| {
        TablixError::InconsistentHierarchy(format!(
            "{axis:?} leaf {index} missing (leaf count {})",
            navigator.leaf_count(axis)
        ))
    })
}
