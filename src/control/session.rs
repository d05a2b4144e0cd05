//! Rendering sessions.
//!
//! A session first plans both axes without touching the grid, then commits
//! the plans. Planning can fail on an inconsistent hierarchy; the grid and
//! both dimensions then stay exactly as the last committed session left them.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use super::{unbind_cell, ContentSize, SessionKind, SessionReport, SessionStatus, TablixControl};
use crate::binder::Binder;
use crate::column_width::ColumnWidthManager;
use crate::error::{Result, TablixError};
use crate::grid::{CellId, CellItem, SizeMode, TablixGrid, TrackSize};
use crate::hierarchy::HierarchyNavigator;
use crate::host::{HostServices, ScrollEvent};
use crate::input::{PixelConverter, PointerCapture, TouchLayout};
use crate::layout::manager::{apply_spans, level_extents, realize_more, HeaderSegment, PlannedTrack};
use crate::layout::measure::{padded_size, sanitize_size};
use crate::layout::{
    AxisCapabilities, AxisPlan, Dimension, DimensionLayoutManager, LayoutPhase, TextMeasurer,
    COLUMNS, ROWS,
};
use crate::types::{Axis, CellKind, GridConfig, Rect, Viewport};

/// Planning passes per session: the first one plus pull-back or escalation re-runs
const MAX_PASSES: u32 = 3;

/// Measured body and footer content sizes by leaf index
#[derive(Debug, Clone, Default)]
pub(crate) struct SizeCache {
    body: HashMap<(usize, usize), (f64, f64)>,
    footer: HashMap<usize, (f64, f64)>,
}

impl SizeCache {
    pub(crate) fn clear(&mut self) {
        self.body.clear();
        self.footer.clear();
    }
}

/// Axes a session builds new plans for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Replan {
    rows: bool,
    columns: bool,
}

impl Replan {
    fn both() -> Self {
        Self {
            rows: true,
            columns: true,
        }
    }

    fn get(self, axis: Axis) -> bool {
        match axis {
            Axis::Rows => self.rows,
            Axis::Columns => self.columns,
        }
    }

    fn set(&mut self, axis: Axis) {
        match axis {
            Axis::Rows => self.rows = true,
            Axis::Columns => self.columns = true,
        }
    }

    fn any(self) -> bool {
        self.rows || self.columns
    }
}

/// Plan, dimension and layout manager of one axis during realization
type AxisState<'s, I> = (
    &'s mut AxisPlan<I>,
    &'s mut Dimension,
    &'s mut DimensionLayoutManager<I>,
);

struct Plans<I> {
    rows: AxisPlan<I>,
    columns: AxisPlan<I>,
    footer_height: f64,
    iterations: u32,
}

struct Planner<'a, N: HierarchyNavigator, B> {
    navigator: &'a N,
    binder: &'a B,
    measurer: &'a dyn TextMeasurer,
    config: &'a GridConfig,
    widths: &'a ColumnWidthManager,
    /// Width of a column being dragged, by leaf index
    resize: Option<(usize, f64)>,
    viewport: Viewport,
    cache: &'a mut SizeCache,
    /// Vertical and horizontal scrollbar visibility after the last session
    scrollbars: (bool, bool),
    row_depth: usize,
    column_depth: usize,
    /// Widest corner cell per row level
    corner_widths: Vec<f64>,
    /// Tallest corner cell per column level
    corner_heights: Vec<f64>,
    footer_header: Option<(f64, f64)>,
    iterations: u32,
}

impl<'a, N, B> Planner<'a, N, B>
where
    N: HierarchyNavigator,
    B: Binder<N>,
{
    #[allow(clippy::too_many_arguments)]
    fn new(
        navigator: &'a N,
        binder: &'a B,
        measurer: &'a dyn TextMeasurer,
        config: &'a GridConfig,
        widths: &'a ColumnWidthManager,
        resize: Option<(usize, f64)>,
        viewport: Viewport,
        cache: &'a mut SizeCache,
        scrollbars: (bool, bool),
    ) -> Self {
        let row_depth = navigator.depth(Axis::Rows);
        let column_depth = navigator.depth(Axis::Columns);
        let mut corner_widths = vec![0.0_f64; row_depth];
        let mut corner_heights = vec![0.0_f64; column_depth];
        for (column_level, height) in corner_heights.iter_mut().enumerate() {
            for (row_level, width) in corner_widths.iter_mut().enumerate() {
                let text = binder.corner_content(navigator, row_level, column_level);
                let (w, h) = padded_size(measurer, config, &text);
                *width = width.max(w);
                *height = height.max(h);
            }
        }
        let footer_header = navigator
            .has_footer()
            .then(|| padded_size(measurer, config, &binder.footer_label()));
        Self {
            navigator,
            binder,
            measurer,
            config,
            widths,
            resize,
            viewport,
            cache,
            scrollbars,
            row_depth,
            column_depth,
            corner_widths,
            corner_heights,
            footer_header,
            iterations: 0,
        }
    }

    fn plan(
        &mut self,
        rows: &mut Dimension,
        columns: &mut Dimension,
        row_layout: &mut DimensionLayoutManager<N::Item>,
        column_layout: &mut DimensionLayoutManager<N::Item>,
        mut replan: Replan,
    ) -> Result<Plans<N::Item>> {
        let mut pulled_back = Replan::default();
        let mut pass = 0;
        loop {
            pass += 1;
            let mut row_plan = self.start_plan(rows, row_layout, replan.rows);
            let mut column_plan = self.start_plan(columns, column_layout, replan.columns);
            let footer_height = self.realize(
                (&mut row_plan, &mut *rows, &mut *row_layout),
                (&mut column_plan, &mut *columns, &mut *column_layout),
                replan,
            )?;

            let mut again = false;
            if pass < MAX_PASSES {
                for axis in [Axis::Columns, Axis::Rows] {
                    let (plan, dimension) = match axis {
                        Axis::Columns => (&column_plan, &mut *columns),
                        Axis::Rows => (&row_plan, &mut *rows),
                    };
                    if replan.get(axis) {
                        if pulled_back.get(axis) {
                            continue;
                        }
                        if let Some(start) = pull_back_start(plan) {
                            debug!(?axis, from = plan.start, to = start, "pulling back to fill the tail");
                            dimension.scroll_to(start as f64);
                            pulled_back.set(axis);
                            again = true;
                        }
                    } else if !plan.is_filled() && !plan.out_of_items {
                        trace!(?axis, "reused plan no longer fills, re-planning");
                        replan.set(axis);
                        again = true;
                    }
                }
            }
            if again {
                continue;
            }

            for (plan, dimension, layout, depth, capabilities) in [
                (&mut column_plan, &mut *columns, &mut *column_layout, self.column_depth, &COLUMNS),
                (&mut row_plan, &mut *rows, &mut *row_layout, self.row_depth, &ROWS),
            ] {
                if replan.get(plan.axis) {
                    layout.transition(LayoutPhase::Spanning);
                    apply_spans(plan, self.navigator, capabilities, depth);
                    for track in &mut plan.tracks {
                        track.size.settle();
                    }
                    plan.update_pixel_offset();
                    dimension
                        .realization_mut()
                        .record_sizes(plan.tracks.iter().map(PlannedTrack::extent));
                }
                plan.compute_view_size();
            }
            return Ok(Plans {
                rows: row_plan,
                columns: column_plan,
                footer_height,
                iterations: self.iterations,
            });
        }
    }

    /// Fresh plan for a re-planned axis, the committed one otherwise.
    fn start_plan(
        &self,
        dimension: &mut Dimension,
        layout: &mut DimensionLayoutManager<N::Item>,
        replan: bool,
    ) -> AxisPlan<N::Item> {
        if !replan {
            if let Some(previous) = layout.plan() {
                let mut plan = previous.clone();
                plan.fraction = dimension.fraction();
                plan.update_pixel_offset();
                return plan;
            }
        }
        let mut plan = AxisPlan::new(
            dimension.axis(),
            dimension.first_leaf(),
            dimension.fraction(),
            0.0,
        );
        // Last known header extents seed the available extent of the cross axis.
        plan.level_sizes = layout
            .plan()
            .map(|p| p.level_sizes.clone())
            .unwrap_or_default();
        dimension.realization_mut().on_start_session();
        layout.transition(LayoutPhase::Realizing);
        plan
    }

    /// Realize and measure until both re-planned axes are filled, out of
    /// leaves, or the iteration cap is hit. Returns the footer height.
    fn realize(
        &mut self,
        (rows, row_dimension, row_layout): AxisState<'_, N::Item>,
        (columns, column_dimension, column_layout): AxisState<'_, N::Item>,
        replan: Replan,
    ) -> Result<f64> {
        let mut footer_height = self.footer_height(columns);
        let mut iterations = 0;
        loop {
            self.update_available(rows, columns, footer_height);
            let grow_columns = replan.columns && !columns.is_filled() && !columns.out_of_items;
            let grow_rows = replan.rows && !rows.is_filled() && !rows.out_of_items;
            if !(grow_columns || grow_rows) || iterations >= self.config.max_iterations {
                break;
            }
            iterations += 1;
            let added_columns = if grow_columns {
                column_layout.transition(LayoutPhase::Realizing);
                self.realize_step(columns, column_dimension)?
            } else {
                0
            };
            let added_rows = if grow_rows {
                row_layout.transition(LayoutPhase::Realizing);
                self.realize_step(rows, row_dimension)?
            } else {
                0
            };
            enter_measuring(replan, row_layout, column_layout);
            self.measure(rows, columns, replan);
            footer_height = self.footer_height(columns);
            if grow_columns {
                column_dimension.realization_mut().on_iteration(
                    added_columns,
                    !columns.is_filled(),
                    !columns.out_of_items,
                );
            }
            if grow_rows {
                row_dimension
                    .realization_mut()
                    .on_iteration(added_rows, !rows.is_filled(), !rows.out_of_items);
            }
        }
        self.iterations += iterations;

        // Keep exactly `realization_margin` leaves past the fill point.
        let margin = self.config.realization_margin;
        for (plan, dimension, layout) in [
            (&mut *columns, &mut *column_dimension, &mut *column_layout),
            (&mut *rows, &mut *row_dimension, &mut *row_layout),
        ] {
            if !replan.get(plan.axis) {
                continue;
            }
            let beyond = tracks_beyond_fill(plan);
            if beyond < margin && !plan.out_of_items {
                layout.transition(LayoutPhase::Realizing);
                let (navigator, binder, measurer, config) =
                    (self.navigator, self.binder, self.measurer, self.config);
                realize_more(plan, navigator, margin - beyond, |item| {
                    padded_size(measurer, config, &binder.header_label(navigator, item))
                })?;
            }
            let realization = dimension.realization_mut();
            realization.on_end_session(tracks_beyond_fill(plan), margin);
            trace!(
                axis = ?plan.axis,
                realized = realization.realized(),
                iterations = realization.iterations(),
                factor = realization.adjustment_factor(),
                "realization finished"
            );
        }
        enter_measuring(replan, row_layout, column_layout);
        self.measure(rows, columns, replan);
        for plan in [&mut *columns, &mut *rows] {
            if replan.get(plan.axis) {
                plan.prune(margin);
            }
        }
        self.measure(rows, columns, replan);
        footer_height = self.footer_height(columns);
        self.update_available(rows, columns, footer_height);
        Ok(footer_height)
    }

    fn realize_step(&mut self, plan: &mut AxisPlan<N::Item>, dimension: &Dimension) -> Result<usize> {
        let capabilities = AxisCapabilities::for_axis(plan.axis);
        let remaining_extent = plan.fill_target() - plan.filled();
        let remaining_leaves = self
            .navigator
            .leaf_count(plan.axis)
            .saturating_sub(plan.next_leaf());
        let count = dimension.realization().items_to_realize(
            remaining_extent,
            remaining_leaves,
            (capabilities.default_item_size)(self.config),
        );
        let (navigator, binder, measurer, config) =
            (self.navigator, self.binder, self.measurer, self.config);
        realize_more(plan, navigator, count, |item| {
            padded_size(measurer, config, &binder.header_label(navigator, item))
        })
    }

    fn update_available(
        &self,
        rows: &mut AxisPlan<N::Item>,
        columns: &mut AxisPlan<N::Item>,
        footer_height: f64,
    ) {
        let thickness = self.config.scrollbar_thickness;
        let vertical = if self.scrollbars.0 { thickness } else { 0.0 };
        let horizontal = if self.scrollbars.1 { thickness } else { 0.0 };
        columns.available = (self.viewport.width - rows.header_extent() - vertical).max(0.0);
        rows.available =
            (self.viewport.height - columns.header_extent() - footer_height - horizontal).max(0.0);
    }

    /// Size every re-planned track from its label and the body cells it crosses.
    fn measure(&mut self, rows: &mut AxisPlan<N::Item>, columns: &mut AxisPlan<N::Item>, replan: Replan) {
        let mut widths = vec![0.0_f64; columns.tracks.len()];
        let mut heights = vec![0.0_f64; rows.tracks.len()];
        for (row, height) in rows.tracks.iter().zip(heights.iter_mut()) {
            for (column, width) in columns.tracks.iter().zip(widths.iter_mut()) {
                let (w, h) = self.body_size(row, column);
                *width = width.max(w);
                *height = height.max(h);
            }
        }

        if replan.columns {
            let has_footer = self.navigator.has_footer();
            let min_width = self.config.min_column_width;
            for (column, content) in columns.tracks.iter_mut().zip(widths) {
                let mut width = (COLUMNS.contextual_size)(column.label_size()).max(content);
                if has_footer {
                    width = width.max(self.footer_size(column).0);
                }
                let mut width = sanitize_size(width, min_width);
                if let Some(max) = self.config.max_auto_column_width {
                    width = width.min(max);
                }
                column.size.mode = match self.fixed_width(column) {
                    Some(fixed) => SizeMode::Fixed(sanitize_size(fixed, min_width)),
                    None => SizeMode::Auto,
                };
                column.size.set_measured(width);
            }
            columns.update_pixel_offset();
            columns.level_sizes = level_extents(
                columns,
                &COLUMNS,
                self.column_depth,
                self.config.min_row_height,
                &self.corner_heights,
                None,
            );
        }

        if replan.rows {
            for (row, content) in rows.tracks.iter_mut().zip(heights) {
                let height = (ROWS.contextual_size)(row.label_size()).max(content);
                row.size.set_measured(sanitize_size(height, self.config.min_row_height));
            }
            rows.update_pixel_offset();
            rows.level_sizes = level_extents(
                rows,
                &ROWS,
                self.row_depth,
                self.config.min_column_width,
                &self.corner_widths,
                self.footer_header.map(|(w, _)| w),
            );
        }
    }

    fn body_size(&mut self, row: &PlannedTrack<N::Item>, column: &PlannedTrack<N::Item>) -> (f64, f64) {
        let key = (row.leaf_index, column.leaf_index);
        if let Some(size) = self.cache.body.get(&key) {
            return *size;
        }
        let text = self.binder.cell_content(self.navigator, &row.item, &column.item);
        let size = padded_size(self.measurer, self.config, &text);
        self.cache.body.insert(key, size);
        size
    }

    fn footer_size(&mut self, column: &PlannedTrack<N::Item>) -> (f64, f64) {
        if let Some(size) = self.cache.footer.get(&column.leaf_index) {
            return *size;
        }
        let text = self.binder.footer_content(self.navigator, &column.item);
        let size = padded_size(self.measurer, self.config, &text);
        self.cache.footer.insert(column.leaf_index, size);
        size
    }

    fn footer_height(&mut self, columns: &AxisPlan<N::Item>) -> f64 {
        let Some((_, header_height)) = self.footer_header else {
            return 0.0;
        };
        let tallest = columns
            .tracks
            .iter()
            .map(|column| self.footer_size(column).1)
            .fold(header_height, f64::max);
        sanitize_size(tallest, self.config.min_row_height)
    }

    fn fixed_width(&self, column: &PlannedTrack<N::Item>) -> Option<f64> {
        if let Some((leaf, width)) = self.resize {
            if leaf == column.leaf_index {
                return Some(width);
            }
        }
        column
            .query_name
            .as_deref()
            .and_then(|name| self.widths.width_for(name))
    }
}

/// Moves the layout of every re-planned axis into measurement.
fn enter_measuring<I: Clone>(
    replan: Replan,
    rows: &mut DimensionLayoutManager<I>,
    columns: &mut DimensionLayoutManager<I>,
) {
    if replan.rows {
        rows.transition(LayoutPhase::Measuring);
    }
    if replan.columns {
        columns.transition(LayoutPhase::Measuring);
    }
}

/// Tracks that start at or after the fill point
fn tracks_beyond_fill<I: Clone>(plan: &AxisPlan<I>) -> usize {
    let target = plan.fill_target();
    let mut position = 0.0;
    let mut beyond = 0;
    for track in &plan.tracks {
        if position >= target {
            beyond += 1;
        }
        position += track.extent();
    }
    beyond
}

/// Earlier first leaf that lets the tail of the axis fill the viewport.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pull_back_start<I: Clone>(plan: &AxisPlan<I>) -> Option<usize> {
    if !plan.out_of_items || plan.is_filled() || plan.start == 0 || plan.tracks.is_empty() {
        return None;
    }
    let filled = plan.filled();
    let average = filled / plan.tracks.len() as f64;
    if !average.is_finite() || average <= 0.0 {
        return None;
    }
    let unfilled = plan.fill_target() - filled;
    let back = ((unfilled / average).floor().max(1.0)) as usize;
    Some(plan.start.saturating_sub(back))
}

fn item_matches<N: HierarchyNavigator>(
    navigator: &N,
    bound: &CellItem<N::Item>,
    expected: &CellItem<N::Item>,
) -> bool {
    match (bound, expected) {
        (CellItem::RowHeader(a), CellItem::RowHeader(b))
        | (CellItem::ColumnHeader(a), CellItem::ColumnHeader(b))
        | (CellItem::Footer(a), CellItem::Footer(b)) => navigator.header_item_equals(a, b),
        (
            CellItem::Body { row: ra, column: ca },
            CellItem::Body { row: rb, column: cb },
        ) => navigator.header_item_equals(ra, rb) && navigator.header_item_equals(ca, cb),
        (
            CellItem::Corner {
                row_level: ra,
                column_level: ca,
            },
            CellItem::Corner {
                row_level: rb,
                column_level: cb,
            },
        ) => ra == rb && ca == cb,
        (CellItem::FooterHeader, CellItem::FooterHeader) => true,
        _ => false,
    }
}

fn header_item<I: Clone>(axis: Axis, item: &I) -> CellItem<I> {
    match axis {
        Axis::Rows => CellItem::RowHeader(item.clone()),
        Axis::Columns => CellItem::ColumnHeader(item.clone()),
    }
}

fn settled_size(extent: f64) -> TrackSize {
    TrackSize {
        measured: extent,
        settled: true,
        ..TrackSize::default()
    }
}

/// Writes finished plans into the grid, binding only cells whose item changed.
struct Committer<'a, N: HierarchyNavigator, B> {
    grid: &'a mut TablixGrid<N::Item>,
    binder: &'a mut B,
    navigator: &'a N,
    measurer: &'a dyn TextMeasurer,
    config: &'a GridConfig,
    bound: usize,
}

impl<N, B> Committer<'_, N, B>
where
    N: HierarchyNavigator,
    B: Binder<N>,
{
    fn commit(&mut self, plans: &Plans<N::Item>) {
        let row_depth = self.navigator.depth(Axis::Rows);
        let column_depth = self.navigator.depth(Axis::Columns);
        for id in self.grid.set_header_depths(row_depth, column_depth) {
            self.unbind(id);
            self.grid.release_cell(id);
        }
        self.shift_window(&plans.columns);
        self.shift_window(&plans.rows);
        self.bind_body(plans);
        self.reconcile_headers(&plans.rows, row_depth);
        self.reconcile_headers(&plans.columns, column_depth);
        self.bind_corners(row_depth, column_depth);
        self.bind_footer(&plans.columns, row_depth);

        for (track, extent) in self
            .grid
            .header_tracks_mut(Axis::Columns)
            .iter_mut()
            .zip(&plans.columns.level_sizes)
        {
            track.size = settled_size(*extent);
        }
        for (track, extent) in self
            .grid
            .header_tracks_mut(Axis::Rows)
            .iter_mut()
            .zip(&plans.rows.level_sizes)
        {
            track.size = settled_size(*extent);
        }
        self.grid.footer_mut().size = settled_size(plans.footer_height);
        apply_offsets(
            self.grid,
            plans.rows.pixel_offset,
            plans.columns.pixel_offset,
        );
    }

    fn unbind(&mut self, id: CellId) {
        unbind_cell::<N, B>(self.grid, self.binder, id);
    }

    fn is_bound_to(&self, id: CellId, expected: &CellItem<N::Item>) -> bool {
        self.grid
            .cell(id)
            .and_then(|cell| cell.item.as_ref())
            .is_some_and(|bound| item_matches(self.navigator, bound, expected))
    }

    fn rebind(&mut self, id: CellId, kind: CellKind, item: CellItem<N::Item>) {
        self.unbind(id);
        let Some(cell) = self.grid.cell_mut(id) else {
            return;
        };
        cell.attach(kind, item.clone());
        let navigator = self.navigator;
        match &item {
            CellItem::RowHeader(member) => self.binder.bind_row_header(navigator, member, cell),
            CellItem::ColumnHeader(member) => self.binder.bind_column_header(navigator, member, cell),
            CellItem::Body { row, column } => self.binder.bind_body(navigator, row, column, cell),
            CellItem::Corner {
                row_level,
                column_level,
            } => self
                .binder
                .bind_corner(navigator, *row_level, *column_level, cell),
            CellItem::Footer(column) => self.binder.bind_footer(navigator, Some(column), cell),
            CellItem::FooterHeader => self.binder.bind_footer(navigator, None, cell),
        }
        let (width, height) =
            padded_size(self.measurer, self.config, cell.text.as_deref().unwrap_or(""));
        cell.content_width = width;
        cell.content_height = height;
        self.bound += 1;
    }

    /// Move the realized window to the plan's leaves, recycling tracks.
    fn shift_window(&mut self, plan: &AxisPlan<N::Item>) {
        let axis = plan.axis;
        let target = plan.tracks.len();
        let len = self.grid.realized_count(axis);
        let old_start = self
            .grid
            .tracks(axis)
            .front()
            .filter(|track| track.item.is_some())
            .map(|track| track.leaf_index);
        if let Some(old_start) = old_start {
            let new_start = plan.start;
            if new_start > old_start && new_start < old_start + len {
                self.grid.move_to_end(axis, new_start - old_start);
            } else if new_start < old_start && old_start < new_start + target {
                self.grid.move_to_start(axis, old_start - new_start);
            }
        }
        while self.grid.realized_count(axis) > target {
            for id in self.grid.deactivate_back(axis) {
                self.unbind(id);
            }
        }
        while self.grid.realized_count(axis) < target {
            self.grid.activate_back(axis);
        }
        for (track, planned) in self.grid.tracks_mut(axis).iter_mut().zip(&plan.tracks) {
            track.item = Some(planned.item.clone());
            track.leaf_index = planned.leaf_index;
            track.size = planned.size;
        }
    }

    fn bind_body(&mut self, plans: &Plans<N::Item>) {
        let slots: Vec<usize> = self.grid.columns().iter().map(|c| c.slot).collect();
        let mut cells = Vec::with_capacity(self.grid.realized_body_cells());
        for (i, row) in self.grid.rows().iter().enumerate() {
            for (j, slot) in slots.iter().enumerate() {
                if let Some(id) = row.cell_at_slot(*slot) {
                    cells.push((id, i, j));
                }
            }
        }
        for (id, i, j) in cells {
            let (Some(row), Some(column)) = (plans.rows.tracks.get(i), plans.columns.tracks.get(j))
            else {
                continue;
            };
            let expected = CellItem::Body {
                row: row.item.clone(),
                column: column.item.clone(),
            };
            if !self.is_bound_to(id, &expected) {
                self.rebind(id, CellKind::Body, expected);
            }
        }
    }

    /// Header cells currently placed along `axis`, detached from their tracks.
    fn take_header_cells(&mut self, axis: Axis) -> Vec<CellId> {
        match axis {
            Axis::Rows => {
                let mut pool = self.grid.take_loose_headers();
                for row in self.grid.tracks_mut(Axis::Rows).iter_mut() {
                    pool.append(&mut row.header_cells);
                }
                for column in self.grid.header_tracks_mut(Axis::Rows).iter_mut() {
                    column.cells.clear();
                }
                pool
            }
            Axis::Columns => {
                let mut pool = Vec::new();
                for row in self.grid.header_tracks_mut(Axis::Columns).iter_mut() {
                    pool.append(&mut row.cells);
                }
                pool
            }
        }
    }

    /// One header cell per segment; cells keep their member when it is still shown.
    fn reconcile_headers(&mut self, plan: &AxisPlan<N::Item>, depth: usize) {
        let axis = plan.axis;
        let kind = match axis {
            Axis::Rows => CellKind::RowHeader,
            Axis::Columns => CellKind::ColumnHeader,
        };
        let segments: Vec<HeaderSegment<N::Item>> = (0..depth)
            .flat_map(|level| plan.segments(self.navigator, level))
            .collect();
        let mut pool = self.take_header_cells(axis);

        let mut assigned: Vec<Option<CellId>> = Vec::with_capacity(segments.len());
        for segment in &segments {
            let expected = header_item(axis, &segment.item);
            let found = pool.iter().position(|id| self.is_bound_to(*id, &expected));
            assigned.push(found.map(|index| pool.swap_remove(index)));
        }
        for id in &pool {
            self.unbind(*id);
        }
        for (segment, slot) in segments.iter().zip(assigned.iter_mut()) {
            if slot.is_none() {
                let id = match pool.pop() {
                    Some(id) => id,
                    None => self.grid.alloc_cell(kind),
                };
                self.rebind(id, kind, header_item(axis, &segment.item));
                *slot = Some(id);
            }
        }
        for id in pool {
            self.grid.release_cell(id);
        }

        for (segment, id) in segments.iter().zip(assigned) {
            let Some(id) = id else {
                continue;
            };
            if let Some(cell) = self.grid.cell_mut(id) {
                match axis {
                    Axis::Rows => cell.set_spans(segment.level_span, segment.len),
                    Axis::Columns => cell.set_spans(segment.len, segment.level_span),
                }
                cell.level = segment.level;
                cell.position = segment.first;
            }
            match axis {
                Axis::Rows => {
                    if let Some(row) = self.grid.tracks_mut(Axis::Rows).get_mut(segment.first) {
                        row.header_cells.push(id);
                    }
                    if let Some(column) = self.grid.header_tracks_mut(Axis::Rows).get_mut(segment.level) {
                        column.cells.push(id);
                    }
                }
                Axis::Columns => {
                    if let Some(row) = self.grid.header_tracks_mut(Axis::Columns).get_mut(segment.level) {
                        row.cells.push(id);
                    }
                }
            }
        }
    }

    fn bind_corners(&mut self, row_depth: usize, column_depth: usize) {
        for column_level in 0..column_depth {
            for row_level in 0..row_depth {
                let Some(id) = self
                    .grid
                    .header_tracks(Axis::Columns)
                    .get(column_level)
                    .and_then(|row| row.header_cells.get(row_level))
                    .copied()
                else {
                    continue;
                };
                let expected = CellItem::Corner {
                    row_level,
                    column_level,
                };
                if !self.is_bound_to(id, &expected) {
                    self.rebind(id, CellKind::Corner, expected);
                }
                if let Some(cell) = self.grid.cell_mut(id) {
                    cell.level = column_level;
                    cell.position = row_level;
                }
            }
        }
    }

    fn bind_footer(&mut self, columns: &AxisPlan<N::Item>, row_depth: usize) {
        let header = self.grid.footer().header_cells.first().copied();
        if !self.navigator.has_footer() {
            let cells: Vec<CellId> = header
                .into_iter()
                .chain(self.grid.footer().cells.iter().copied())
                .collect();
            for id in cells {
                self.unbind(id);
            }
            return;
        }
        if let Some(id) = header {
            if !self.is_bound_to(id, &CellItem::FooterHeader) {
                self.rebind(id, CellKind::Footer, CellItem::FooterHeader);
            }
            if let Some(cell) = self.grid.cell_mut(id) {
                cell.set_spans(row_depth.max(1), 1);
            }
        }
        let slots: Vec<usize> = self.grid.columns().iter().map(|c| c.slot).collect();
        for (position, slot) in slots.iter().enumerate() {
            let (Some(id), Some(column)) = (
                self.grid.footer().cell_at_slot(*slot),
                columns.tracks.get(position),
            ) else {
                continue;
            };
            let expected = CellItem::Footer(column.item.clone());
            if !self.is_bound_to(id, &expected) {
                self.rebind(id, CellKind::Footer, expected);
            }
            if let Some(cell) = self.grid.cell_mut(id) {
                cell.position = position;
            }
        }
    }
}

/// Give cells covering the first realized track the scrolled-out pixel amount.
pub(crate) fn apply_offsets<I>(grid: &mut TablixGrid<I>, row_offset: f64, column_offset: f64) {
    let slots: Vec<usize> = grid.columns().iter().map(|c| c.slot).collect();
    let mut offsets: Vec<(CellId, f64, f64)> = Vec::new();
    for (i, row) in grid.rows().iter().enumerate() {
        let vertical = if i == 0 { row_offset } else { 0.0 };
        for (j, slot) in slots.iter().enumerate() {
            if let Some(id) = row.cell_at_slot(*slot) {
                let horizontal = if j == 0 { column_offset } else { 0.0 };
                offsets.push((id, horizontal, vertical));
            }
        }
        offsets.extend(row.header_cells.iter().map(|id| (*id, 0.0, vertical)));
    }
    for header_row in grid.header_rows() {
        for id in &header_row.cells {
            let first = grid.cell(*id).is_some_and(|c| c.position == 0);
            offsets.push((*id, if first { column_offset } else { 0.0 }, 0.0));
        }
    }
    for (j, slot) in slots.iter().enumerate() {
        if let Some(id) = grid.footer().cell_at_slot(*slot) {
            offsets.push((id, if j == 0 { column_offset } else { 0.0 }, 0.0));
        }
    }
    for (id, horizontal, vertical) in offsets {
        if let Some(cell) = grid.cell_mut(id) {
            if cell.is_bound() {
                cell.set_offsets(horizontal, vertical);
            }
        }
    }
}

impl<N, B, H> TablixControl<N, B, H>
where
    N: HierarchyNavigator,
    B: Binder<N>,
    H: HostServices,
{
    pub(super) fn run_session(&mut self, kind: SessionKind) -> SessionReport {
        if self.navigator.is_none() {
            return SessionReport::skipped(kind, "no models");
        }
        let structural = kind == SessionKind::Structural;
        let consumed_resize = self.pending_resize.take();
        let resized = consumed_resize.is_some();
        if resized {
            self.active_resize = consumed_resize;
        }
        let mut replan = if structural {
            Replan::both()
        } else {
            self.scroll_replan()
        };
        if resized {
            replan.set(Axis::Columns);
        }
        if !replan.any() {
            return self.apply_scroll(kind);
        }

        let saved = (self.rows.clone(), self.columns.clone());
        let result = {
            let Self {
                navigator,
                binder,
                measurer,
                config,
                widths,
                active_resize,
                viewport,
                cache,
                rows,
                columns,
                row_layout,
                column_layout,
                ..
            } = self;
            match navigator.as_ref() {
                Some(navigator) => {
                    let scrollbars = (rows.scrollbar().is_visible(), columns.scrollbar().is_visible());
                    Planner::new(
                        navigator,
                        &*binder,
                        &**measurer,
                        &*config,
                        &*widths,
                        *active_resize,
                        *viewport,
                        cache,
                        scrollbars,
                    )
                    .plan(rows, columns, row_layout, column_layout, replan)
                }
                None => Err(TablixError::Other("no models".to_string())),
            }
        };
        let plans = match result {
            Ok(plans) => plans,
            Err(err) => {
                warn!(%err, ?kind, "session aborted, keeping last realized state");
                self.rows = saved.0;
                self.columns = saved.1;
                self.row_layout.transition(LayoutPhase::Idle);
                self.column_layout.transition(LayoutPhase::Idle);
                // The resize goes to the next session unless input replaced it.
                if self.pending_resize.is_none() {
                    self.pending_resize = consumed_resize;
                }
                let mut report = self.report(kind, SessionStatus::Aborted);
                report.error = Some(err.to_string());
                return report;
            }
        };

        let bound = self.commit(&plans);
        self.footer_height = plans.footer_height;
        if let Some(navigator) = self.navigator.as_ref() {
            let row_depth = navigator.depth(Axis::Rows);
            let column_depth = navigator.depth(Axis::Columns);
            self.rows.update_from_session(
                plans.rows.view_size,
                plans.rows.first_visible(navigator, row_depth),
            );
            self.columns.update_from_session(
                plans.columns.view_size,
                plans.columns.first_visible(navigator, column_depth),
            );
        }
        let iterations = plans.iterations;
        self.row_layout.commit(plans.rows);
        self.column_layout.commit(plans.columns);
        self.update_input_geometry();
        if !matches!(
            self.dispatcher.captured(),
            Some(PointerCapture::ColumnResize(_))
        ) {
            self.active_resize = None;
        }
        self.flush_persistence(structural);
        self.notify_viewport();

        let mut report = self.report(kind, SessionStatus::Completed);
        report.iterations = iterations;
        report.bound_cells = bound;
        debug!(
            ?kind,
            rows = report.realized_rows,
            columns = report.realized_columns,
            iterations,
            bound,
            "session complete"
        );
        report
    }

    /// Axes whose new offset cannot be served by shifting realized cells.
    fn scroll_replan(&self) -> Replan {
        let frame = self.frame();
        Replan {
            rows: !self.row_layout.can_apply_scroll(
                self.rows.first_leaf(),
                self.rows.fraction(),
                frame.body.height,
            ),
            columns: !self.column_layout.can_apply_scroll(
                self.columns.first_leaf(),
                self.columns.fraction(),
                frame.body.width,
            ),
        }
    }

    /// Offset-only change: move the pixel shift of the first tracks.
    fn apply_scroll(&mut self, kind: SessionKind) -> SessionReport {
        let Some(navigator) = self.navigator.as_ref() else {
            return SessionReport::skipped(kind, "no models");
        };
        for (layout, dimension) in [
            (&mut self.row_layout, &mut self.rows),
            (&mut self.column_layout, &mut self.columns),
        ] {
            layout.transition(LayoutPhase::ScrollApply);
            let depth = navigator.depth(layout.axis());
            if let Some(plan) = layout.plan_mut() {
                plan.fraction = dimension.fraction();
                plan.update_pixel_offset();
                let view_size = plan.compute_view_size();
                dimension.update_from_session(view_size, plan.first_visible(navigator, depth));
            }
            layout.transition(LayoutPhase::Done);
        }
        let row_offset = self.row_layout.plan().map_or(0.0, |p| p.pixel_offset);
        let column_offset = self.column_layout.plan().map_or(0.0, |p| p.pixel_offset);
        apply_offsets(&mut self.grid, row_offset, column_offset);
        self.update_input_geometry();
        self.notify_viewport();
        trace!(row_offset, column_offset, "scroll applied");
        self.report(kind, SessionStatus::ScrollApplied)
    }

    fn commit(&mut self, plans: &Plans<N::Item>) -> usize {
        let Self {
            grid,
            binder,
            navigator,
            measurer,
            config,
            ..
        } = self;
        let Some(navigator) = navigator.as_ref() else {
            return 0;
        };
        let mut committer = Committer {
            grid,
            binder,
            navigator,
            measurer: &**measurer,
            config: &*config,
            bound: 0,
        };
        committer.commit(plans);
        committer.bound
    }

    /// Scrollbar lengths, touch regions and pixel converters for the new layout.
    fn update_input_geometry(&mut self) {
        let frame = self.frame();
        let thickness = self.config.scrollbar_thickness;
        if let Some(rect) = frame.vertical_scrollbar {
            self.rows.scrollbar_mut().set_geometry(rect.height, thickness);
        }
        if let Some(rect) = frame.horizontal_scrollbar {
            self.columns.scrollbar_mut().set_geometry(rect.width, thickness);
        }
        let visible_height = self
            .row_layout
            .plan()
            .map_or(0.0, |p| (p.filled() - p.pixel_offset).clamp(0.0, frame.body.height));
        self.touch.set_layout(TouchLayout {
            row_headers: Rect::new(0.0, frame.body.y, frame.row_header_width, frame.body.height),
            column_headers: Rect::new(frame.body.x, 0.0, frame.body.width, frame.column_header_height),
            body: frame.body,
            footer: Rect::new(
                0.0,
                frame.body.y + visible_height,
                frame.body.right(),
                frame.footer_height,
            ),
        });
        let converter = |plan: Option<&AxisPlan<N::Item>>, fallback: f64| {
            let average = plan
                .filter(|p| !p.tracks.is_empty())
                .map_or(fallback, |p| p.filled() / p.tracks.len() as f64);
            PixelConverter {
                pixels_per_item: average,
            }
        };
        self.touch.set_converters(
            converter(self.row_layout.plan(), self.config.default_row_height),
            converter(self.column_layout.plan(), self.config.default_column_width),
        );
    }

    fn flush_persistence(&mut self, structural: bool) {
        match self.widths.take_persist_request(structural) {
            Ok(Some(instance)) => {
                let result = self
                    .host
                    .persist_properties(std::slice::from_ref(&instance))
                    .map_err(TablixError::from);
                self.widths.on_persist_result(&result);
                if result.is_ok() {
                    debug!("column widths persisted");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "column widths could not be serialized"),
        }
    }

    fn notify_viewport(&mut self) {
        let current = (self.rows.scroll_offset(), self.columns.scroll_offset());
        if self.last_notified == Some(current) {
            return;
        }
        self.last_notified = Some(current);
        let event = ScrollEvent {
            row_offset: current.0,
            column_offset: current.1,
            first_row: self.rows.first_leaf(),
            first_column: self.columns.first_leaf(),
            visible_rows: self.rows.view_size(),
            visible_columns: self.columns.view_size(),
        };
        self.host.on_viewport_changed(&event);
    }

    /// Extents of the committed layout
    pub fn content_size(&self) -> ContentSize {
        let rows = self.row_layout.plan();
        let columns = self.column_layout.plan();
        ContentSize {
            row_hierarchy_width: rows.map_or(0.0, AxisPlan::header_extent),
            row_hierarchy_height: rows.map_or(0.0, AxisPlan::filled),
            column_hierarchy_width: columns.map_or(0.0, AxisPlan::filled),
            column_hierarchy_height: columns.map_or(0.0, AxisPlan::header_extent),
            footer_height: self.footer_height,
        }
    }

    fn report(&self, kind: SessionKind, status: SessionStatus) -> SessionReport {
        let mut report = SessionReport::new(kind, status);
        report.content = self.content_size();
        report.realized_rows = self.grid.realized_count(Axis::Rows);
        report.realized_columns = self.grid.realized_count(Axis::Columns);
        report
    }
}
