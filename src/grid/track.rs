//! Rows and columns of the realized grid.
//!
//! Both axes use the same [`Track`] type. A row stores the cells it owns; a
//! column stores references to the body cells it sizes. Cells are addressed
//! by the *slot* of the crossing track, which never changes while the track
//! is recycled, so moving tracks around the window does not touch cells.

use super::cell::CellId;

/// How a track's extent is decided.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SizeMode {
    /// Computed from content every session
    #[default]
    Auto,
    /// Set explicitly (user resize or persisted width)
    Fixed(f64),
}

/// Size state of one row or column.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackSize {
    pub mode: SizeMode,
    /// Largest measured content extent
    pub measured: f64,
    /// Extra extent absorbed from a spanning parent header
    pub remainder: f64,
    /// Settled sizes are not re-measured until the next structural session.
    pub settled: bool,
}

impl TrackSize {
    /// Rendered extent
    pub fn value(&self) -> f64 {
        match self.mode {
            SizeMode::Fixed(size) => size,
            SizeMode::Auto => self.measured + self.remainder,
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self.mode, SizeMode::Fixed(_))
    }

    /// Record a measurement; ignored once settled.
    pub fn set_measured(&mut self, measured: f64) -> bool {
        if self.settled {
            return false;
        }
        self.measured = measured;
        self.remainder = 0.0;
        true
    }

    pub fn settle(&mut self) {
        self.settled = true;
    }
}

/// A realized row or column.
#[derive(Debug, Clone)]
pub struct Track<I> {
    /// Stable position in the crossing tracks' cell vectors
    pub slot: usize,
    /// Bound leaf (None for header tracks and recycled spares)
    pub item: Option<I>,
    pub leaf_index: usize,
    /// Header cells starting in this track: row headers for body rows,
    /// corner cells for column-header rows, the footer header for the footer
    pub header_cells: Vec<CellId>,
    /// Body cells by crossing slot; for column-header rows, header cells in
    /// visual order
    pub cells: Vec<CellId>,
    pub size: TrackSize,
}

/// Row of the realized grid
pub type Row<I> = Track<I>;

/// Column of the realized grid
pub type Column<I> = Track<I>;

impl<I> Track<I> {
    pub fn new(slot: usize) -> Self {
        Self {
            slot,
            item: None,
            leaf_index: 0,
            header_cells: Vec::new(),
            cells: Vec::new(),
            size: TrackSize::default(),
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Body cell crossing the track in `slot`
    pub fn cell_at_slot(&self, slot: usize) -> Option<CellId> {
        self.cells.get(slot).copied()
    }

    pub fn extent(&self) -> f64 {
        self.size.value()
    }
}
