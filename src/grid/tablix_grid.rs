//! The realized grid: one arena of cells plus the row and column sets.

use std::collections::VecDeque;

use super::cell::{Cell, CellArena, CellId};
use super::track::{Column, Row, Track};
use crate::types::{Axis, CellKind};

/// Realized rows, columns, header bands and footer of one control.
///
/// Body tracks live in a window (`rows`, `columns`) that only changes
/// through move-to-start/end, activate and deactivate. Deactivated tracks go
/// to a spare list and keep their cells for reuse.
#[derive(Debug, Clone)]
pub struct TablixGrid<I> {
    cells: CellArena<I>,
    /// One per column-header level
    header_rows: Vec<Row<I>>,
    /// One per row-header level
    header_columns: Vec<Column<I>>,
    rows: VecDeque<Row<I>>,
    columns: VecDeque<Column<I>>,
    spare_rows: Vec<Row<I>>,
    spare_columns: Vec<Column<I>>,
    footer: Row<I>,
    /// Row headers of deactivated rows, still bound, awaiting reconciliation
    loose_headers: Vec<CellId>,
    /// Slots handed out per axis so far
    row_slots: usize,
    column_slots: usize,
}

impl<I> Default for TablixGrid<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> TablixGrid<I> {
    pub fn new() -> Self {
        let mut cells = CellArena::new();
        let mut footer = Track::new(0);
        footer.header_cells.push(cells.alloc(CellKind::Footer));
        Self {
            cells,
            header_rows: Vec::new(),
            header_columns: Vec::new(),
            rows: VecDeque::new(),
            columns: VecDeque::new(),
            spare_rows: Vec::new(),
            spare_columns: Vec::new(),
            footer,
            loose_headers: Vec::new(),
            row_slots: 0,
            column_slots: 0,
        }
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell<I>> {
        self.cells.get(id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell<I>> {
        self.cells.get_mut(id)
    }

    pub fn arena(&self) -> &CellArena<I> {
        &self.cells
    }

    pub(crate) fn alloc_cell(&mut self, kind: CellKind) -> CellId {
        self.cells.alloc(kind)
    }

    pub(crate) fn release_cell(&mut self, id: CellId) {
        self.cells.release(id);
    }

    /// Realized body tracks along `axis`, in visual order
    pub fn tracks(&self, axis: Axis) -> &VecDeque<Track<I>> {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Columns => &self.columns,
        }
    }

    pub fn tracks_mut(&mut self, axis: Axis) -> &mut VecDeque<Track<I>> {
        match axis {
            Axis::Rows => &mut self.rows,
            Axis::Columns => &mut self.columns,
        }
    }

    pub fn rows(&self) -> &VecDeque<Row<I>> {
        &self.rows
    }

    pub fn columns(&self) -> &VecDeque<Column<I>> {
        &self.columns
    }

    /// Header tracks along `axis`: row-header columns for rows, column-header rows for columns
    pub fn header_tracks(&self, axis: Axis) -> &[Track<I>] {
        match axis {
            Axis::Rows => &self.header_columns,
            Axis::Columns => &self.header_rows,
        }
    }

    pub fn header_tracks_mut(&mut self, axis: Axis) -> &mut Vec<Track<I>> {
        match axis {
            Axis::Rows => &mut self.header_columns,
            Axis::Columns => &mut self.header_rows,
        }
    }

    pub fn header_rows(&self) -> &[Row<I>] {
        &self.header_rows
    }

    pub fn header_columns(&self) -> &[Column<I>] {
        &self.header_columns
    }

    pub fn footer(&self) -> &Row<I> {
        &self.footer
    }

    pub fn footer_mut(&mut self) -> &mut Row<I> {
        &mut self.footer
    }

    pub fn realized_count(&self, axis: Axis) -> usize {
        self.tracks(axis).len()
    }

    /// Rotate `count` tracks from the start of the window to its end.
    pub fn move_to_end(&mut self, axis: Axis, count: usize) {
        let tracks = self.tracks_mut(axis);
        let count = count.min(tracks.len());
        tracks.rotate_left(count);
    }

    /// Rotate `count` tracks from the end of the window to its start.
    pub fn move_to_start(&mut self, axis: Axis, count: usize) {
        let tracks = self.tracks_mut(axis);
        let count = count.min(tracks.len());
        tracks.rotate_right(count);
    }

    /// Append a track to the window, reusing a spare one when available.
    #[allow(clippy::indexing_slicing)]
    pub fn activate_back(&mut self, axis: Axis) -> &mut Track<I> {
        let spare = match axis {
            Axis::Rows => self.spare_rows.pop(),
            Axis::Columns => self.spare_columns.pop(),
        };
        let track = match spare {
            Some(track) => track,
            None => self.create_track(axis),
        };
        let tracks = self.tracks_mut(axis);
        tracks.push_back(track);
        let last = tracks.len() - 1;
        &mut tracks[last]
    }

    // A new slot gets a body cell against every crossing slot, active or spare.
    fn create_track(&mut self, axis: Axis) -> Track<I> {
        match axis {
            Axis::Rows => {
                let slot = self.row_slots;
                self.row_slots += 1;
                let mut row = Track::new(slot);
                let mut column_tracks: Vec<&mut Column<I>> = self
                    .columns
                    .iter_mut()
                    .chain(self.spare_columns.iter_mut())
                    .collect();
                column_tracks.sort_by_key(|c| c.slot);
                row.cells = Vec::with_capacity(self.column_slots);
                for column in column_tracks {
                    let id = self.cells.alloc(CellKind::Body);
                    row.cells.push(id);
                    column.cells.push(id);
                }
                row
            }
            Axis::Columns => {
                let slot = self.column_slots;
                self.column_slots += 1;
                let mut column = Track::new(slot);
                let mut row_tracks: Vec<&mut Row<I>> = self
                    .rows
                    .iter_mut()
                    .chain(self.spare_rows.iter_mut())
                    .collect();
                row_tracks.sort_by_key(|r| r.slot);
                column.cells = Vec::with_capacity(self.row_slots);
                for row in row_tracks {
                    let id = self.cells.alloc(CellKind::Body);
                    row.cells.push(id);
                    column.cells.push(id);
                }
                let footer_cell = self.cells.alloc(CellKind::Footer);
                self.footer.cells.push(footer_cell);
                column
            }
        }
    }

    /// Move the last track of the window to the spare list.
    ///
    /// Returns the bound body and footer cells it was holding; the caller
    /// unbinds them. Row headers owned by a deactivated row move to the loose
    /// header pool for the next reconciliation.
    pub fn deactivate_back(&mut self, axis: Axis) -> Vec<CellId> {
        let Some(mut track) = self.tracks_mut(axis).pop_back() else {
            return Vec::new();
        };
        let mut bound: Vec<CellId> = track
            .cells
            .iter()
            .copied()
            .filter(|&id| self.cells.get(id).is_some_and(Cell::is_bound))
            .collect();
        if axis == Axis::Columns {
            if let Some(id) = self.footer.cells.get(track.slot).copied() {
                if self.cells.get(id).is_some_and(Cell::is_bound) {
                    bound.push(id);
                }
            }
        }
        let headers = std::mem::take(&mut track.header_cells);
        if axis == Axis::Rows {
            self.loose_headers.extend(headers);
        }
        track.item = None;
        track.size = Default::default();
        match axis {
            Axis::Rows => self.spare_rows.push(track),
            Axis::Columns => self.spare_columns.push(track),
        }
        bound
    }

    /// Take the loose header pool.
    pub(crate) fn take_loose_headers(&mut self) -> Vec<CellId> {
        std::mem::take(&mut self.loose_headers)
    }

    /// Resize the corner block and header bands to the hierarchy depths.
    ///
    /// Returns corner and column-header cells that were dropped; the caller
    /// unbinds and releases them.
    pub fn set_header_depths(&mut self, row_depth: usize, column_depth: usize) -> Vec<CellId> {
        let mut dropped = Vec::new();
        while self.header_rows.len() > column_depth {
            if let Some(row) = self.header_rows.pop() {
                dropped.extend(row.header_cells);
                dropped.extend(row.cells);
            }
        }
        while self.header_rows.len() < column_depth {
            let slot = self.header_rows.len();
            self.header_rows.push(Track::new(slot));
        }
        for row in &mut self.header_rows {
            while row.header_cells.len() > row_depth {
                if let Some(id) = row.header_cells.pop() {
                    dropped.push(id);
                }
            }
            while row.header_cells.len() < row_depth {
                row.header_cells.push(self.cells.alloc(CellKind::Corner));
            }
        }
        while self.header_columns.len() > row_depth {
            // Row headers referenced here are owned by body rows.
            self.header_columns.pop();
        }
        while self.header_columns.len() < row_depth {
            let slot = self.header_columns.len();
            self.header_columns.push(Track::new(slot));
        }
        dropped
    }

    /// Every bound cell, so the caller can unbind before [`clear`](Self::clear).
    pub fn bound_cells(&self) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|(_, c)| c.is_bound())
            .map(|(id, _)| id)
            .collect()
    }

    /// Drop every track and cell; the next session starts from nothing.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Number of body cells whose row and column are both realized
    pub fn realized_body_cells(&self) -> usize {
        self.rows.len() * self.columns.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::grid::CellItem;

    fn grid(rows: usize, columns: usize) -> TablixGrid<u32> {
        let mut grid = TablixGrid::new();
        for i in 0..columns {
            grid.activate_back(Axis::Columns).leaf_index = i;
        }
        for i in 0..rows {
            grid.activate_back(Axis::Rows).leaf_index = i;
        }
        grid
    }

    #[test]
    fn test_rows_hold_a_cell_per_column() {
        let grid = grid(3, 4);
        for row in grid.rows() {
            assert_eq!(row.cell_count(), grid.columns().len());
        }
        for column in grid.columns() {
            assert_eq!(column.cells.len(), 3);
        }
        assert_eq!(grid.footer().cells.len(), 4);
    }

    #[test]
    fn test_move_to_end_preserves_cell_identity() {
        let mut grid = grid(4, 2);
        let first_row_cells = grid.rows()[0].cells.clone();
        grid.move_to_end(Axis::Rows, 1);
        assert_eq!(grid.rows()[3].cells, first_row_cells);
        grid.move_to_start(Axis::Rows, 1);
        assert_eq!(grid.rows()[0].cells, first_row_cells);
    }

    #[test]
    fn test_deactivated_track_is_reused() {
        let mut grid = grid(2, 2);
        let id = grid.rows()[1].cells[0];
        grid.cell_mut(id)
            .unwrap()
            .attach(CellKind::Body, CellItem::Body { row: 1, column: 0 });
        let bound = grid.deactivate_back(Axis::Rows);
        assert_eq!(bound, vec![id]);
        assert_eq!(grid.rows().len(), 1);
        let before = grid.arena().allocated_total();
        let row = grid.activate_back(Axis::Rows);
        assert_eq!(row.cells[0], id);
        assert_eq!(grid.arena().allocated_total(), before);
    }

    #[test]
    fn test_header_depths_resize_corner_block() {
        let mut grid: TablixGrid<u32> = TablixGrid::new();
        assert!(grid.set_header_depths(2, 3).is_empty());
        assert_eq!(grid.header_rows().len(), 3);
        assert_eq!(grid.header_columns().len(), 2);
        assert!(grid.header_rows().iter().all(|r| r.header_cells.len() == 2));
        let dropped = grid.set_header_depths(1, 1);
        assert_eq!(dropped.len(), 2 * 2 + 1);
        assert_eq!(grid.header_rows()[0].header_cells.len(), 1);
    }

    #[test]
    fn test_new_column_slot_reaches_spare_rows() {
        let mut grid = grid(2, 1);
        grid.deactivate_back(Axis::Rows);
        grid.activate_back(Axis::Columns);
        let row = grid.activate_back(Axis::Rows);
        assert_eq!(row.cells.len(), 2);
    }
}
