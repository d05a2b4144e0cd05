//! The grid control: composition root and host-facing entry points.
//!
//! A [`TablixControl`] owns one grid, a [`Dimension`] and a
//! [`DimensionLayoutManager`] per axis, the column width manager and the
//! input dispatcher. Hosts drive it through `update_models`,
//! `update_viewport` and `refresh`; input handlers only queue scroll and
//! resize state, which `process_pending` turns into one coalesced session.

mod session;
mod snapshot;

use serde::Serialize;
use tracing::{debug, warn};

pub use snapshot::{CellSnapshot, GridSnapshot, ScrollbarSnapshot};

use self::session::SizeCache;
use crate::binder::Binder;
use crate::column_width::{ColumnWidthManager, TablixProperties};
use crate::error::Result;
use crate::grid::{CellId, TablixGrid};
use crate::hierarchy::HierarchyNavigator;
use crate::host::HostServices;
use crate::input::{
    normalize, InputDispatcher, InputTarget, ListenerId, PointerCapture, ResizeDrag, TouchManager,
    TouchScroll, WheelInput,
};
use crate::layout::measure::{padded_size, sanitize_size};
use crate::layout::{Dimension, DimensionLayoutManager, MonospaceMeasurer, TextMeasurer};
use crate::types::{Axis, CellKind, GridConfig, Rect, Viewport};

/// What started a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    /// New models, viewport or refresh: both axes are re-planned
    Structural,
    /// Scroll offsets or a column resize changed
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    /// Plans were rebuilt and committed
    Completed,
    /// Only pixel offsets of realized cells changed
    ScrollApplied,
    /// Planning failed; the grid shows the last committed state
    Aborted,
    /// Nothing to do (no models, destroyed control, invalid input)
    Skipped,
}

/// Extents reported at the end of a session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSize {
    pub row_hierarchy_width: f64,
    pub row_hierarchy_height: f64,
    pub column_hierarchy_width: f64,
    pub column_hierarchy_height: f64,
    pub footer_height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub kind: SessionKind,
    pub status: SessionStatus,
    pub content: ContentSize,
    pub realized_rows: usize,
    pub realized_columns: usize,
    /// Realization iterations run (both axes)
    pub iterations: u32,
    /// Cells bound during the session
    pub bound_cells: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionReport {
    fn new(kind: SessionKind, status: SessionStatus) -> Self {
        Self {
            kind,
            status,
            content: ContentSize::default(),
            realized_rows: 0,
            realized_columns: 0,
            iterations: 0,
            bound_cells: 0,
            error: None,
        }
    }

    fn skipped(kind: SessionKind, reason: &str) -> Self {
        debug!(reason, "session skipped");
        Self::new(kind, SessionStatus::Skipped)
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::Completed | SessionStatus::ScrollApplied
        )
    }
}

/// Pixel frame of the grid inside the viewport after the last session.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    pub row_header_width: f64,
    pub column_header_height: f64,
    pub footer_height: f64,
    /// Body area (visible part only)
    pub body: Rect,
    pub vertical_scrollbar: Option<Rect>,
    pub horizontal_scrollbar: Option<Rect>,
}

impl Frame {
    pub fn scrollbar(&self, axis: Axis) -> Option<Rect> {
        match axis {
            Axis::Rows => self.vertical_scrollbar,
            Axis::Columns => self.horizontal_scrollbar,
        }
    }
}

/// Virtualized hierarchical grid control.
pub struct TablixControl<N: HierarchyNavigator, B, H> {
    config: GridConfig,
    binder: B,
    host: H,
    measurer: Box<dyn TextMeasurer>,
    navigator: Option<N>,
    properties: TablixProperties,
    grid: TablixGrid<N::Item>,
    rows: Dimension,
    columns: Dimension,
    row_layout: DimensionLayoutManager<N::Item>,
    column_layout: DimensionLayoutManager<N::Item>,
    widths: ColumnWidthManager,
    viewport: Viewport,
    dispatcher: InputDispatcher,
    listeners: Vec<ListenerId>,
    touch: TouchManager,
    cache: SizeCache,
    footer_height: f64,
    scroll_pending: bool,
    /// Resize queued by input, applied when the next session starts
    pending_resize: Option<(usize, f64)>,
    /// Resize applied to the current layout while a drag is in progress
    active_resize: Option<(usize, f64)>,
    last_notified: Option<(f64, f64)>,
    destroyed: bool,
}

impl<N, B, H> TablixControl<N, B, H>
where
    N: HierarchyNavigator,
    B: Binder<N>,
    H: HostServices,
{
    /// Create a control with the built-in monospace measurer.
    ///
    /// # Errors
    /// Returns `TablixError::InvalidConfig` for unusable settings.
    pub fn new(config: GridConfig, binder: B, host: H) -> Result<Self> {
        config.validate()?;
        let mut dispatcher = InputDispatcher::new();
        let listeners = [
            InputTarget::Scrollbar(Axis::Rows),
            InputTarget::Scrollbar(Axis::Columns),
            InputTarget::ColumnResize,
            InputTarget::Touch,
            InputTarget::Wheel,
        ]
        .into_iter()
        .map(|target| dispatcher.subscribe(target))
        .collect();
        Ok(Self {
            measurer: Box::new(MonospaceMeasurer::from_config(&config)),
            touch: TouchManager::new(config.swipe_velocity_threshold),
            config,
            binder,
            host,
            navigator: None,
            properties: TablixProperties::default(),
            grid: TablixGrid::new(),
            rows: Dimension::new(Axis::Rows),
            columns: Dimension::new(Axis::Columns),
            row_layout: DimensionLayoutManager::new(Axis::Rows),
            column_layout: DimensionLayoutManager::new(Axis::Columns),
            widths: ColumnWidthManager::new(),
            viewport: Viewport::default(),
            dispatcher,
            listeners,
            cache: SizeCache::default(),
            footer_height: 0.0,
            scroll_pending: false,
            pending_resize: None,
            active_resize: None,
            last_notified: None,
            destroyed: false,
        })
    }

    /// Replace the text measurer used for content sizes.
    #[must_use]
    pub fn with_measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self.cache.clear();
        self
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn grid(&self) -> &TablixGrid<N::Item> {
        &self.grid
    }

    pub fn navigator(&self) -> Option<&N> {
        self.navigator.as_ref()
    }

    pub fn binder(&self) -> &B {
        &self.binder
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn dimension(&self, axis: Axis) -> &Dimension {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Columns => &self.columns,
        }
    }

    fn dimension_mut(&mut self, axis: Axis) -> &mut Dimension {
        match axis {
            Axis::Rows => &mut self.rows,
            Axis::Columns => &mut self.columns,
        }
    }

    pub fn layout(&self, axis: Axis) -> &DimensionLayoutManager<N::Item> {
        match axis {
            Axis::Rows => &self.row_layout,
            Axis::Columns => &self.column_layout,
        }
    }

    pub fn column_widths(&self) -> &ColumnWidthManager {
        &self.widths
    }

    pub fn dispatcher(&self) -> &InputDispatcher {
        &self.dispatcher
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Whether scroll or resize input is waiting for [`process_pending`](Self::process_pending)
    pub fn has_pending(&self) -> bool {
        self.scroll_pending || self.pending_resize.is_some()
    }

    /// Adopt new hierarchies and property settings and re-render.
    ///
    /// With `reset_scroll_offsets` both axes go back to the first leaf;
    /// otherwise offsets are clamped to the new leaf counts.
    pub fn update_models(
        &mut self,
        reset_scroll_offsets: bool,
        navigator: N,
        properties: TablixProperties,
    ) -> SessionReport {
        if self.destroyed {
            return SessionReport::skipped(SessionKind::Structural, "destroyed");
        }
        // Items of the old models are meaningless for the new navigator.
        self.unbind_all();
        self.cache.clear();
        if reset_scroll_offsets {
            self.rows.reset();
            self.columns.reset();
        }
        self.rows.set_leaf_count(navigator.leaf_count(Axis::Rows));
        self.columns.set_leaf_count(navigator.leaf_count(Axis::Columns));

        let leaves: Vec<Option<N::Item>> = (0..navigator.leaf_count(Axis::Columns))
            .map(|i| navigator.leaf_at(Axis::Columns, i))
            .collect();
        let query_names: Vec<String> = leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| {
                leaf.as_ref()
                    .and_then(|leaf| navigator.column_query_name(leaf))
                    .unwrap_or_else(|| i.to_string())
            })
            .collect();
        let rendered = self.column_layout.plan();
        let (binder, measurer, config) = (&self.binder, self.measurer.as_ref(), &self.config);
        // Columns outside the realized window get their header width.
        let estimate = |name: &str| -> Option<f64> {
            let index = query_names.iter().position(|q| q == name)?;
            let leaf = leaves.get(index)?.as_ref()?;
            let label = binder.header_label(&navigator, leaf);
            let width = sanitize_size(padded_size(measurer, config, &label).0, config.min_column_width);
            Some(config.max_auto_column_width.map_or(width, |max| width.min(max)))
        };
        self.widths
            .update_data_view(&query_names, &properties, |name: &str| {
                rendered
                    .and_then(|plan| {
                        plan.tracks
                            .iter()
                            .find(|t| t.query_name.as_deref() == Some(name))
                            .map(|t| t.extent())
                    })
                    .or_else(|| estimate(name))
            });
        self.properties = properties;
        self.navigator = Some(navigator);
        self.scroll_pending = false;
        self.run_session(SessionKind::Structural)
    }

    /// Re-render for a new viewport size; scroll offsets are preserved.
    pub fn update_viewport(&mut self, viewport: Viewport) -> SessionReport {
        if self.destroyed {
            return SessionReport::skipped(SessionKind::Structural, "destroyed");
        }
        if !viewport.is_valid() {
            warn!(?viewport, "ignoring invalid viewport");
            return SessionReport::skipped(SessionKind::Structural, "invalid viewport");
        }
        self.viewport = viewport;
        self.run_session(SessionKind::Structural)
    }

    /// Re-render with the current models. `clear` drops every realized cell first.
    pub fn refresh(&mut self, clear: bool) -> SessionReport {
        if self.destroyed {
            return SessionReport::skipped(SessionKind::Structural, "destroyed");
        }
        if clear {
            self.unbind_all();
            self.grid.clear();
            self.cache.clear();
            self.row_layout.clear();
            self.column_layout.clear();
        }
        self.run_session(SessionKind::Structural)
    }

    /// Queue a scroll by `delta` leaves. Returns whether the offset moved.
    pub fn scroll_by(&mut self, axis: Axis, delta: f64) -> bool {
        let moved = self.dimension_mut(axis).scroll_by(delta);
        self.scroll_pending |= moved;
        moved
    }

    /// Queue a scroll to `offset` leaves. Returns whether the offset moved.
    pub fn scroll_to(&mut self, axis: Axis, offset: f64) -> bool {
        let moved = self.dimension_mut(axis).scroll_to(offset);
        self.scroll_pending |= moved;
        moved
    }

    /// Run one session for all queued scroll and resize input.
    pub fn process_pending(&mut self) -> Option<SessionReport> {
        if self.destroyed || !self.has_pending() {
            return None;
        }
        self.scroll_pending = false;
        Some(self.run_session(SessionKind::Scroll))
    }

    pub fn on_wheel(&mut self, input: &WheelInput) -> bool {
        if !self.dispatcher.is_subscribed(InputTarget::Wheel) {
            return false;
        }
        match normalize(input) {
            Some(wheel) => {
                let delta = wheel.notches * self.config.wheel_items_per_notch;
                self.scroll_by(wheel.axis, delta)
            }
            None => false,
        }
    }

    /// Pointer pressed at viewport coordinates. Returns whether it was consumed.
    pub fn on_pointer_down(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        let frame = self.frame();
        for axis in [Axis::Rows, Axis::Columns] {
            let Some(rect) = frame.scrollbar(axis) else {
                continue;
            };
            if !rect.contains(x, y) || !self.dispatcher.capture(PointerCapture::Scrollbar(axis)) {
                continue;
            }
            let position = along_scrollbar(axis, &rect, x, y);
            if let Some(delta) = self.dimension_mut(axis).scrollbar_mut().on_pointer_down(position, now_ms) {
                self.scroll_by(axis, delta);
            }
            return true;
        }
        if let Some((column, width)) = self.resize_handle_at(x, y) {
            return self.dispatcher.capture(PointerCapture::ColumnResize(ResizeDrag {
                column,
                start_x: x,
                start_width: width,
            }));
        }
        false
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> bool {
        match self.dispatcher.captured().copied() {
            Some(PointerCapture::Scrollbar(axis)) => {
                let Some(rect) = self.frame().scrollbar(axis) else {
                    return false;
                };
                let position = along_scrollbar(axis, &rect, x, y);
                match self.dimension_mut(axis).scrollbar_mut().on_pointer_move(position) {
                    Some(delta) => self.scroll_by(axis, delta),
                    None => false,
                }
            }
            Some(PointerCapture::ColumnResize(drag)) => {
                let width = drag.width_at(x, self.config.min_column_width);
                self.pending_resize = Some((drag.column, width));
                true
            }
            None => false,
        }
    }

    pub fn on_pointer_up(&mut self, x: f64, _y: f64) -> bool {
        match self.dispatcher.release() {
            Some(PointerCapture::Scrollbar(axis)) => {
                self.dimension_mut(axis).scrollbar_mut().on_pointer_up();
                true
            }
            Some(PointerCapture::ColumnResize(drag)) => {
                let width = drag.width_at(x, self.config.min_column_width);
                self.pending_resize = Some((drag.column, width));
                if let Err(err) = self.widths.on_column_width_changed(drag.column, width) {
                    warn!(%err, "column resize dropped");
                }
                self.host.on_column_resize_end(drag.column, width);
                true
            }
            None => false,
        }
    }

    pub fn on_touch_start(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.dispatcher.is_subscribed(InputTarget::Touch) && self.touch.on_touch_start(x, y, now_ms)
    }

    pub fn on_touch_move(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        let scroll = self.touch.on_touch_move(x, y, now_ms);
        self.apply_touch(scroll)
    }

    pub fn on_touch_end(&mut self, now_ms: f64) -> bool {
        let scroll = self.touch.on_touch_end(now_ms);
        self.apply_touch(scroll)
    }

    /// Advance timers (scrollbar auto-repeat, swipe steps). Returns whether
    /// input was queued.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let mut moved = false;
        for axis in [Axis::Rows, Axis::Columns] {
            if let Some(delta) = self.dimension_mut(axis).scrollbar_mut().tick(now_ms) {
                moved |= self.scroll_by(axis, delta);
            }
        }
        let swipe = self.touch.tick(now_ms);
        moved |= self.apply_touch(swipe);
        moved
    }

    /// Unbind everything and detach from input. The control stays inert afterwards.
    pub fn destroy(&mut self) {
        self.unbind_all();
        self.grid.clear();
        for id in self.listeners.drain(..) {
            self.dispatcher.unsubscribe(id);
        }
        self.dispatcher.unsubscribe_all();
        self.touch.cancel();
        self.row_layout.clear();
        self.column_layout.clear();
        self.navigator = None;
        self.destroyed = true;
        debug!("control destroyed");
    }

    /// Pixel frame after the last session.
    pub fn frame(&self) -> Frame {
        let row_header_width = self.row_layout.plan().map_or(0.0, |p| p.header_extent());
        let column_header_height = self.column_layout.plan().map_or(0.0, |p| p.header_extent());
        let thickness = self.config.scrollbar_thickness;
        let vertical = self.rows.scrollbar().is_visible();
        let horizontal = self.columns.scrollbar().is_visible();
        let vbar = if vertical { thickness } else { 0.0 };
        let hbar = if horizontal { thickness } else { 0.0 };
        let body_width = (self.viewport.width - row_header_width - vbar).max(0.0);
        let body_height =
            (self.viewport.height - column_header_height - self.footer_height - hbar).max(0.0);
        Frame {
            row_header_width,
            column_header_height,
            footer_height: self.footer_height,
            body: Rect::new(row_header_width, column_header_height, body_width, body_height),
            vertical_scrollbar: vertical.then(|| {
                Rect::new(
                    self.viewport.width - thickness,
                    column_header_height,
                    thickness,
                    (self.viewport.height - column_header_height - hbar).max(0.0),
                )
            }),
            horizontal_scrollbar: horizontal.then(|| {
                Rect::new(
                    row_header_width,
                    self.viewport.height - thickness,
                    (self.viewport.width - row_header_width - vbar).max(0.0),
                    thickness,
                )
            }),
        }
    }

    fn apply_touch(&mut self, scroll: TouchScroll) -> bool {
        let mut moved = false;
        for axis in [Axis::Rows, Axis::Columns] {
            moved |= self.scroll_by(axis, scroll.along(axis));
        }
        moved
    }

    /// Column whose right header edge is under the pointer, with its width.
    fn resize_handle_at(&self, x: f64, y: f64) -> Option<(usize, f64)> {
        if !self.dispatcher.is_subscribed(InputTarget::ColumnResize) {
            return None;
        }
        let frame = self.frame();
        if y < 0.0 || y >= frame.column_header_height || x < frame.row_header_width {
            return None;
        }
        let plan = self.column_layout.plan()?;
        let half = self.config.resize_handle_width / 2.0;
        let mut edge = frame.row_header_width - plan.pixel_offset;
        for track in &plan.tracks {
            edge += track.extent();
            if (x - edge).abs() <= half {
                return Some((track.leaf_index, track.extent()));
            }
            if edge > x + half {
                break;
            }
        }
        None
    }

    fn unbind_all(&mut self) {
        for id in self.grid.bound_cells() {
            unbind_cell::<N, B>(&mut self.grid, &mut self.binder, id);
        }
    }
}

/// Unbind one cell through the binder and detach it.
pub(crate) fn unbind_cell<N, B>(grid: &mut TablixGrid<N::Item>, binder: &mut B, id: CellId)
where
    N: HierarchyNavigator,
    B: Binder<N>,
{
    let Some(cell) = grid.cell_mut(id) else {
        return;
    };
    if !cell.is_bound() {
        return;
    }
    match cell.kind {
        CellKind::RowHeader => binder.unbind_row_header(cell),
        CellKind::ColumnHeader => binder.unbind_column_header(cell),
        CellKind::Body => binder.unbind_body(cell),
        CellKind::Corner => binder.unbind_corner(cell),
        CellKind::Footer => binder.unbind_footer(cell),
    }
    cell.detach();
}

fn along_scrollbar(axis: Axis, rect: &Rect, x: f64, y: f64) -> f64 {
    match axis {
        Axis::Rows => y - rect.y,
        Axis::Columns => x - rect.x,
    }
}
