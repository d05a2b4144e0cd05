//! Per-axis differences expressed as data.
//!
//! The layout algorithm is written once; everything that differs between
//! laying out columns and laying out rows is looked up here.

use crate::types::{Axis, GridConfig, Viewport};

/// Capabilities of one axis.
#[derive(Debug, Clone, Copy)]
pub struct AxisCapabilities {
    pub axis: Axis,
    pub is_horizontal: bool,
    /// Size along this axis of a (width, height) pair
    pub contextual_size: fn((f64, f64)) -> f64,
    /// Size across this axis of a (width, height) pair
    pub content_size: fn((f64, f64)) -> f64,
    /// Viewport extent along this axis
    pub contextual_extent: fn(&Viewport) -> f64,
    /// Smallest size of a track on this axis
    pub min_item_size: fn(&GridConfig) -> f64,
    /// Smallest size of this axis' header levels (measured across the axis)
    pub min_header_size: fn(&GridConfig) -> f64,
    /// Estimate used before anything was measured
    pub default_item_size: fn(&GridConfig) -> f64,
}

fn width(size: (f64, f64)) -> f64 {
    size.0
}

fn height(size: (f64, f64)) -> f64 {
    size.1
}

fn viewport_width(v: &Viewport) -> f64 {
    v.width
}

fn viewport_height(v: &Viewport) -> f64 {
    v.height
}

fn min_column_width(c: &GridConfig) -> f64 {
    c.min_column_width
}

fn min_row_height(c: &GridConfig) -> f64 {
    c.min_row_height
}

fn default_column_width(c: &GridConfig) -> f64 {
    c.default_column_width
}

fn default_row_height(c: &GridConfig) -> f64 {
    c.default_row_height
}

pub const COLUMNS: AxisCapabilities = AxisCapabilities {
    axis: Axis::Columns,
    is_horizontal: true,
    contextual_size: width,
    content_size: height,
    contextual_extent: viewport_width,
    min_item_size: min_column_width,
    min_header_size: min_row_height,
    default_item_size: default_column_width,
};

pub const ROWS: AxisCapabilities = AxisCapabilities {
    axis: Axis::Rows,
    is_horizontal: false,
    contextual_size: height,
    content_size: width,
    contextual_extent: viewport_height,
    min_item_size: min_row_height,
    min_header_size: min_column_width,
    default_item_size: default_row_height,
};

impl AxisCapabilities {
    pub fn for_axis(axis: Axis) -> &'static AxisCapabilities {
        match axis {
            Axis::Columns => &COLUMNS,
            Axis::Rows => &ROWS,
        }
    }
}
