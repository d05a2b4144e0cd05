//! Serializable picture of the realized grid, with viewport-space rectangles.
//!
//! Hosts without their own cell rendering (the CLI, the wasm facade, tests)
//! draw from this instead of walking the grid.

use serde::Serialize;

use super::{ContentSize, TablixControl};
use crate::binder::Binder;
use crate::grid::{CellId, TablixGrid};
use crate::hierarchy::HierarchyNavigator;
use crate::host::HostServices;
use crate::types::{Axis, CellKind, Rect, TextAlignment, Viewport};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSnapshot {
    pub id: usize,
    pub kind: CellKind,
    pub text: String,
    pub rect: Rect,
    pub column_span: usize,
    pub row_span: usize,
    pub alignment: TextAlignment,
    pub horizontal_offset: f64,
    pub vertical_offset: f64,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollbarSnapshot {
    pub axis: Axis,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
    pub thumb_start: f64,
    pub thumb_length: f64,
    pub view_min: f64,
    pub view_size: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshot {
    pub viewport: Viewport,
    pub content: ContentSize,
    pub cells: Vec<CellSnapshot>,
    pub scrollbars: Vec<ScrollbarSnapshot>,
    pub row_offset: f64,
    pub column_offset: f64,
}

impl GridSnapshot {
    pub fn cells_of(&self, kind: CellKind) -> impl Iterator<Item = &CellSnapshot> {
        self.cells.iter().filter(move |c| c.kind == kind)
    }

    pub fn find_text(&self, text: &str) -> Option<&CellSnapshot> {
        self.cells.iter().find(|c| c.text == text)
    }
}

/// Running sums starting at `origin`: `prefix[i]` is where track `i` begins.
fn prefix_sums(origin: f64, sizes: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut prefix = vec![origin];
    let mut position = origin;
    for size in sizes {
        position += size;
        prefix.push(position);
    }
    prefix
}

/// Start and extent of `count` tracks beginning at `first`.
fn span(prefix: &[f64], first: usize, count: usize) -> (f64, f64) {
    let last = prefix.last().copied().unwrap_or(0.0);
    let start = prefix.get(first).copied().unwrap_or(last);
    let end = prefix.get(first + count.max(1)).copied().unwrap_or(last);
    (start, end - start)
}

struct Collector<'a, I> {
    grid: &'a TablixGrid<I>,
    cells: Vec<CellSnapshot>,
}

impl<I> Collector<'_, I> {
    fn push(&mut self, id: CellId, rect: Rect) {
        let Some(cell) = self.grid.cell(id) else {
            return;
        };
        if !cell.is_bound() {
            return;
        }
        self.cells.push(CellSnapshot {
            id: id.index(),
            kind: cell.kind,
            text: cell.text.clone().unwrap_or_default(),
            rect,
            column_span: cell.column_span,
            row_span: cell.row_span,
            alignment: cell.alignment,
            horizontal_offset: cell.horizontal_offset,
            vertical_offset: cell.vertical_offset,
            generation: cell.generation,
        });
    }
}

impl<N, B, H> TablixControl<N, B, H>
where
    N: HierarchyNavigator,
    B: Binder<N>,
    H: HostServices,
{
    /// Every bound cell with its rectangle in viewport coordinates.
    ///
    /// Body and header rectangles of the first realized tracks start before
    /// the body origin by the scrolled-out pixel amount; they are not clipped.
    pub fn snapshot(&self) -> GridSnapshot {
        let frame = self.frame();
        let grid = &self.grid;
        let row_offset = self.row_layout.plan().map_or(0.0, |p| p.pixel_offset);
        let column_offset = self.column_layout.plan().map_or(0.0, |p| p.pixel_offset);

        let xs = prefix_sums(
            frame.row_header_width - column_offset,
            grid.columns().iter().map(|c| c.extent()),
        );
        let ys = prefix_sums(
            frame.column_header_height - row_offset,
            grid.rows().iter().map(|r| r.extent()),
        );
        let row_levels = prefix_sums(0.0, grid.header_columns().iter().map(|c| c.extent()));
        let column_levels = prefix_sums(0.0, grid.header_rows().iter().map(|r| r.extent()));

        let mut collector = Collector {
            grid,
            cells: Vec::new(),
        };
        let slots: Vec<usize> = grid.columns().iter().map(|c| c.slot).collect();

        for (i, row) in grid.rows().iter().enumerate() {
            let (y, height) = span(&ys, i, 1);
            for (j, slot) in slots.iter().enumerate() {
                if let Some(id) = row.cell_at_slot(*slot) {
                    let (x, width) = span(&xs, j, 1);
                    collector.push(id, Rect::new(x, y, width, height));
                }
            }
            for id in &row.header_cells {
                let Some(cell) = grid.cell(*id) else {
                    continue;
                };
                let (x, width) = span(&row_levels, cell.level, cell.column_span);
                let (y, height) = span(&ys, cell.position, cell.row_span);
                collector.push(*id, Rect::new(x, y, width, height));
            }
        }

        for (level, header_row) in grid.header_rows().iter().enumerate() {
            for id in &header_row.cells {
                let Some(cell) = grid.cell(*id) else {
                    continue;
                };
                let (x, width) = span(&xs, cell.position, cell.column_span);
                let (y, height) = span(&column_levels, cell.level, cell.row_span);
                collector.push(*id, Rect::new(x, y, width, height));
            }
            let (y, height) = span(&column_levels, level, 1);
            for (row_level, id) in header_row.header_cells.iter().enumerate() {
                let (x, width) = span(&row_levels, row_level, 1);
                collector.push(*id, Rect::new(x, y, width, height));
            }
        }

        if frame.footer_height > 0.0 {
            let visible_rows = self
                .row_layout
                .plan()
                .map_or(0.0, |p| (p.filled() - p.pixel_offset).clamp(0.0, frame.body.height));
            let y = frame.column_header_height + visible_rows;
            let footer = grid.footer();
            for id in &footer.header_cells {
                collector.push(*id, Rect::new(0.0, y, frame.row_header_width, frame.footer_height));
            }
            for (j, slot) in slots.iter().enumerate() {
                if let Some(id) = footer.cell_at_slot(*slot) {
                    let (x, width) = span(&xs, j, 1);
                    collector.push(id, Rect::new(x, y, width, frame.footer_height));
                }
            }
        }

        let scrollbars = [Axis::Rows, Axis::Columns]
            .into_iter()
            .map(|axis| {
                let scrollbar = self.dimension(axis).scrollbar();
                let (thumb_start, thumb_length) = scrollbar.thumb();
                ScrollbarSnapshot {
                    axis,
                    visible: scrollbar.is_visible(),
                    rect: frame.scrollbar(axis),
                    thumb_start,
                    thumb_length,
                    view_min: scrollbar.view_min(),
                    view_size: scrollbar.view_size(),
                    max: scrollbar.max(),
                }
            })
            .collect();

        GridSnapshot {
            viewport: self.viewport,
            content: self.content_size(),
            cells: collector.cells,
            scrollbars,
            row_offset: self.rows.scroll_offset(),
            column_offset: self.columns.scroll_offset(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn span_covers_requested_tracks() {
        let prefix = prefix_sums(10.0, [5.0, 7.0, 3.0]);
        assert_eq!(prefix, vec![10.0, 15.0, 22.0, 25.0]);
        assert_eq!(span(&prefix, 1, 2), (15.0, 10.0));
    }

    #[test]
    fn span_past_the_end_is_empty() {
        let prefix = prefix_sums(0.0, [5.0]);
        assert_eq!(span(&prefix, 3, 1), (5.0, 0.0));
    }
}
