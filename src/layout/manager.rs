//! One rendering session per axis.
//!
//! A session builds an [`AxisPlan`]: which leaves to realize, their member
//! paths, and the pixel size of every track and header level. Planning is
//! pure and may fail; the control commits a finished plan into the grid.

use tracing::{debug, trace};

use super::axis::AxisCapabilities;
use super::measure::sanitize_size;
use super::spanning::span_remainder;
use crate::error::Result;
use crate::grid::TrackSize;
use crate::hierarchy::{member_path, require_leaf, HierarchyNavigator, PathEntry};
use crate::types::Axis;

/// Where a layout manager is in its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutPhase {
    #[default]
    Idle,
    Realizing,
    Measuring,
    Spanning,
    ScrollApply,
    Done,
}

/// A leaf chosen for realization.
#[derive(Debug, Clone)]
pub struct PlannedTrack<I> {
    pub leaf_index: usize,
    pub item: I,
    /// Member path, outermost first
    pub path: Vec<PathEntry<I>>,
    /// Padded label size of every path entry, parallel to `path`
    pub entry_sizes: Vec<(f64, f64)>,
    /// Name the column is persisted under (columns only)
    pub query_name: Option<String>,
    pub size: TrackSize,
}

impl<I> PlannedTrack<I> {
    /// Path entry starting at `level`
    pub fn entry_at(&self, level: usize) -> Option<(&PathEntry<I>, (f64, f64))> {
        self.path
            .iter()
            .zip(self.entry_sizes.iter())
            .find(|(e, _)| e.level == level)
            .map(|(e, s)| (e, *s))
    }

    /// Padded size of the leaf's own header
    pub fn label_size(&self) -> (f64, f64) {
        self.entry_sizes.last().copied().unwrap_or((0.0, 0.0))
    }

    pub fn extent(&self) -> f64 {
        self.size.value()
    }
}

/// A run of adjacent tracks sharing one header member at one level.
#[derive(Debug, Clone)]
pub struct HeaderSegment<I> {
    pub item: I,
    pub level: usize,
    pub level_span: usize,
    /// Position of the first covered track in the plan
    pub first: usize,
    pub len: usize,
    /// The member is the leaf itself
    pub is_leaf: bool,
    /// Every leaf under the member is inside the window
    pub complete: bool,
    /// Padded label size
    pub label_size: (f64, f64),
}

impl<I> HeaderSegment<I> {
    pub fn last(&self) -> usize {
        self.first + self.len.saturating_sub(1)
    }
}

/// Result of planning one axis.
#[derive(Debug, Clone)]
pub struct AxisPlan<I> {
    pub axis: Axis,
    /// First realized leaf
    pub start: usize,
    /// Scrolled-out part of the first leaf in leaves
    pub fraction: f64,
    /// Scrolled-out part of the first leaf in pixels
    pub pixel_offset: f64,
    pub tracks: Vec<PlannedTrack<I>>,
    /// Body extent available along the axis
    pub available: f64,
    pub out_of_items: bool,
    pub iterations: u32,
    /// Extent of each header level across the axis
    pub level_sizes: Vec<f64>,
    /// Visible leaves, fractional
    pub view_size: f64,
}

impl<I: Clone> AxisPlan<I> {
    pub fn new(axis: Axis, start: usize, fraction: f64, available: f64) -> Self {
        Self {
            axis,
            start,
            fraction,
            pixel_offset: 0.0,
            tracks: Vec::new(),
            available: available.max(0.0),
            out_of_items: false,
            iterations: 0,
            level_sizes: Vec::new(),
            view_size: 0.0,
        }
    }

    /// Sum of realized track extents
    pub fn filled(&self) -> f64 {
        self.tracks.iter().map(PlannedTrack::extent).sum()
    }

    /// Extent the realized tracks must cover
    pub fn fill_target(&self) -> f64 {
        self.available + self.pixel_offset
    }

    pub fn is_filled(&self) -> bool {
        self.filled() >= self.fill_target()
    }

    /// Total header extent across the axis
    pub fn header_extent(&self) -> f64 {
        self.level_sizes.iter().sum()
    }

    pub fn next_leaf(&self) -> usize {
        self.start + self.tracks.len()
    }

    /// Recompute the pixel offset from the first track's size.
    pub fn update_pixel_offset(&mut self) {
        self.pixel_offset = self
            .tracks
            .first()
            .map_or(0.0, |t| t.extent() * self.fraction);
    }

    /// Drop tracks past the fill point plus `margin`. Returns how many went.
    pub fn prune(&mut self, margin: usize) -> usize {
        let target = self.fill_target();
        let mut position = 0.0;
        let mut keep = self.tracks.len();
        for (i, track) in self.tracks.iter().enumerate() {
            if position >= target {
                keep = i;
                break;
            }
            position += track.extent();
        }
        let keep = (keep + margin).min(self.tracks.len());
        let dropped = self.tracks.len() - keep;
        self.tracks.truncate(keep);
        if dropped > 0 {
            self.out_of_items = false;
        }
        dropped
    }

    /// Leaf count visible in the viewport, counting partial leaves fractionally.
    pub fn compute_view_size(&mut self) -> f64 {
        let mut position = -self.pixel_offset;
        let mut visible = 0.0;
        for track in &self.tracks {
            let size = track.extent();
            if size > 0.0 {
                let shown = (position + size).min(self.available) - position.max(0.0);
                visible += (shown / size).clamp(0.0, 1.0);
            }
            position += size;
            if position >= self.available {
                break;
            }
        }
        self.view_size = visible;
        visible
    }

    /// Sibling index of the first visible member at every header level.
    pub fn first_visible<N>(&self, navigator: &N, depth: usize) -> Vec<usize>
    where
        N: HierarchyNavigator<Item = I>,
    {
        let Some(first) = self.tracks.first() else {
            return Vec::new();
        };
        let mut indices = Vec::with_capacity(depth);
        let mut current = 0;
        for level in 0..depth {
            if let Some((entry, _)) = first.entry_at(level) {
                current = navigator.index(&entry.item);
            }
            indices.push(current);
        }
        indices
    }

    /// Contiguous header runs at `level`, in visual order.
    pub fn segments<N>(&self, navigator: &N, level: usize) -> Vec<HeaderSegment<I>>
    where
        N: HierarchyNavigator<Item = I>,
    {
        let mut segments: Vec<HeaderSegment<I>> = Vec::new();
        let mut last_leaf_is_last = false;
        for (position, track) in self.tracks.iter().enumerate() {
            let Some((entry, size)) = track.entry_at(level) else {
                continue;
            };
            let continues = segments.last().is_some_and(|s| {
                s.last() + 1 == position && navigator.header_item_equals(&s.item, &entry.item)
            });
            if continues {
                if let Some(segment) = segments.last_mut() {
                    segment.len += 1;
                }
            } else {
                if let Some(segment) = segments.last_mut() {
                    segment.complete = segment.complete && last_leaf_is_last;
                }
                let is_leaf = track
                    .path
                    .last()
                    .is_some_and(|leaf| leaf.level == entry.level);
                segments.push(HeaderSegment {
                    item: entry.item.clone(),
                    level,
                    level_span: entry.level_span,
                    first: position,
                    len: 1,
                    is_leaf,
                    complete: entry.leaf_is_first,
                    label_size: size,
                });
            }
            last_leaf_is_last = entry.leaf_is_last;
        }
        if let Some(segment) = segments.last_mut() {
            segment.complete = segment.complete && last_leaf_is_last;
        }
        segments
    }
}

/// Drives the session phases of one axis and keeps its last committed plan.
#[derive(Debug, Clone)]
pub struct DimensionLayoutManager<I> {
    capabilities: &'static AxisCapabilities,
    phase: LayoutPhase,
    /// Phases entered since the current session started
    phases: Vec<LayoutPhase>,
    plan: Option<AxisPlan<I>>,
}

impl<I: Clone> DimensionLayoutManager<I> {
    pub fn new(axis: Axis) -> Self {
        Self {
            capabilities: AxisCapabilities::for_axis(axis),
            phase: LayoutPhase::Idle,
            phases: Vec::new(),
            plan: None,
        }
    }

    pub fn axis(&self) -> Axis {
        self.capabilities.axis
    }

    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    pub fn transition(&mut self, to: LayoutPhase) {
        if self.phase != to {
            trace!(axis = ?self.axis(), from = ?self.phase, to = ?to, "layout phase");
            if matches!(self.phase, LayoutPhase::Idle | LayoutPhase::Done) {
                self.phases.clear();
            }
            self.phases.push(to);
            self.phase = to;
        }
    }

    /// Phases the current or last session went through, in order
    pub fn phases(&self) -> &[LayoutPhase] {
        &self.phases
    }

    /// Plan of the last committed session
    pub fn plan(&self) -> Option<&AxisPlan<I>> {
        self.plan.as_ref()
    }

    pub fn plan_mut(&mut self) -> Option<&mut AxisPlan<I>> {
        self.plan.as_mut()
    }

    pub fn commit(&mut self, plan: AxisPlan<I>) {
        debug!(
            axis = ?plan.axis,
            start = plan.start,
            realized = plan.tracks.len(),
            iterations = plan.iterations,
            filled = plan.filled(),
            available = plan.available,
            phases = ?self.phases,
            "session committed"
        );
        self.plan = Some(plan);
        self.transition(LayoutPhase::Done);
    }

    pub fn clear(&mut self) {
        self.plan = None;
        self.phase = LayoutPhase::Idle;
        self.phases.clear();
    }

    /// Whether moving to `offset` only needs a pixel shift of realized cells.
    ///
    /// True when the first leaf stays the same and the realized tracks still
    /// cover the viewport at the new fraction.
    pub fn can_apply_scroll(&self, first_leaf: usize, fraction: f64, available: f64) -> bool {
        let Some(plan) = &self.plan else {
            return false;
        };
        if plan.start != first_leaf || (plan.available - available).abs() > f64::EPSILON {
            return false;
        }
        let offset = plan.tracks.first().map_or(0.0, |t| t.extent() * fraction);
        plan.out_of_items || plan.filled() >= available + offset
    }
}

/// Append up to `count` leaves to `plan`.
///
/// `label` gives the padded size of a header member's label. Returns the
/// number of leaves added.
///
/// # Errors
/// Propagates hierarchy shape errors from the navigator.
pub fn realize_more<N, L>(
    plan: &mut AxisPlan<N::Item>,
    navigator: &N,
    count: usize,
    mut label: L,
) -> Result<usize>
where
    N: HierarchyNavigator,
    L: FnMut(&N::Item) -> (f64, f64),
{
    let leaf_count = navigator.leaf_count(plan.axis);
    let mut added = 0;
    while added < count && plan.next_leaf() < leaf_count {
        let leaf_index = plan.next_leaf();
        let item = require_leaf(navigator, plan.axis, leaf_index)?;
        let path = member_path(navigator, plan.axis, &item)?;
        let entry_sizes = path.iter().map(|e| label(&e.item)).collect();
        let query_name = match plan.axis {
            Axis::Columns => Some(
                navigator
                    .column_query_name(&item)
                    .unwrap_or_else(|| leaf_index.to_string()),
            ),
            Axis::Rows => None,
        };
        plan.tracks.push(PlannedTrack {
            leaf_index,
            item,
            path,
            entry_sizes,
            query_name,
            size: TrackSize::default(),
        });
        added += 1;
    }
    plan.out_of_items = plan.next_leaf() >= leaf_count;
    Ok(added)
}

/// Give every complete spanning parent enough room by growing its last leaf.
///
/// Deeper levels go first so outer parents see the already grown children.
pub fn apply_spans<N>(
    plan: &mut AxisPlan<N::Item>,
    navigator: &N,
    capabilities: &AxisCapabilities,
    depth: usize,
) where
    N: HierarchyNavigator,
{
    for level in (0..depth).rev() {
        for segment in plan.segments(navigator, level) {
            if segment.is_leaf || !segment.complete {
                continue;
            }
            let Some(children) = plan.tracks.get(segment.first..=segment.last()) else {
                continue;
            };
            let sizes: Vec<f64> = children.iter().map(PlannedTrack::extent).collect();
            let parent = (capabilities.contextual_size)(segment.label_size);
            let remainder = span_remainder(parent, &sizes);
            if remainder <= 0.0 {
                continue;
            }
            if let Some(last) = plan.tracks.get_mut(segment.last()) {
                if last.size.is_fixed() {
                    continue;
                }
                last.size.remainder += remainder;
                trace!(axis = ?plan.axis, level, remainder, "span remainder");
            }
        }
    }
}

/// Extent of every header level across the axis.
///
/// `corner` holds, per level, the largest corner cell extent on that level.
/// `spanning_all` is an extra cell spanning every level (the footer header).
pub fn level_extents<I>(
    plan: &AxisPlan<I>,
    capabilities: &AxisCapabilities,
    depth: usize,
    min_size: f64,
    corner: &[f64],
    spanning_all: Option<f64>,
) -> Vec<f64> {
    let mut sizes: Vec<f64> = (0..depth)
        .map(|level| {
            let corner = corner.get(level).copied().unwrap_or(0.0);
            sanitize_size(corner, min_size)
        })
        .collect();
    let mut spans: Vec<(usize, usize, f64)> = Vec::new();
    for track in &plan.tracks {
        for (entry, size) in track.path.iter().zip(track.entry_sizes.iter()) {
            let extent = (capabilities.content_size)(*size);
            if entry.level_span <= 1 {
                if let Some(level) = sizes.get_mut(entry.level) {
                    *level = level.max(sanitize_size(extent, min_size));
                }
            } else {
                spans.push((entry.level, entry.level_span, extent));
            }
        }
    }
    spans.sort_by(|a, b| a.1.cmp(&b.1));
    for (level, span, extent) in spans {
        let end = (level + span).min(depth);
        if let Some(covered) = sizes.get_mut(level..end) {
            let remainder = span_remainder(extent, covered);
            if let Some(last) = covered.last_mut() {
                *last += remainder;
            }
        }
    }
    if let Some(extent) = spanning_all {
        let remainder = span_remainder(extent, &sizes);
        if let Some(last) = sizes.last_mut() {
            *last += remainder;
        }
    }
    sizes
}
