use serde::{Deserialize, Serialize};

/// One of the two independently scrollable grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Axis {
    /// The row hierarchy, laid out vertically.
    Rows,
    /// The column hierarchy, laid out horizontally.
    Columns,
}

impl Axis {
    /// The other axis.
    pub fn cross(self) -> Self {
        match self {
            Axis::Rows => Axis::Columns,
            Axis::Columns => Axis::Rows,
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Axis::Columns)
    }
}

/// What a realized cell displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
    /// Intersection of row-header levels and column-header levels (top left)
    Corner,
    /// A row hierarchy member
    RowHeader,
    /// A column hierarchy member
    ColumnHeader,
    /// Intersection of a row leaf and a column leaf
    Body,
    /// Totals row cell (or its leading header)
    Footer,
}

/// Horizontal text alignment of a cell's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}
