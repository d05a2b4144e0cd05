//! Per-axis scroll state.

use crate::input::Scrollbar;
use crate::types::Axis;

use super::realization::RealizationManager;

/// Scroll position, scrollbar and realization state of one axis.
///
/// The scroll offset is measured in leaves: its integer part is the first
/// realized leaf and its fraction is how much of that leaf is scrolled out
/// of view.
#[derive(Debug, Clone)]
pub struct Dimension {
    axis: Axis,
    scroll_offset: f64,
    leaf_count: usize,
    /// Leaves visible in the viewport after the last session (fractional)
    view_size: f64,
    /// Sibling index of the first visible member at each header level
    first_visible: Vec<usize>,
    scrollbar: Scrollbar,
    realization: RealizationManager,
}

impl Dimension {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            scroll_offset: 0.0,
            leaf_count: 0,
            view_size: 0.0,
            first_visible: Vec::new(),
            scrollbar: Scrollbar::new(axis),
            realization: RealizationManager::new(),
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// First realized leaf
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn first_leaf(&self) -> usize {
        self.scroll_offset.floor().max(0.0) as usize
    }

    /// Part of the first leaf scrolled out of view, in `0.0..1.0`
    pub fn fraction(&self) -> f64 {
        self.scroll_offset - self.scroll_offset.floor()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    pub fn view_size(&self) -> f64 {
        self.view_size
    }

    pub fn first_visible(&self) -> &[usize] {
        &self.first_visible
    }

    pub fn scrollbar(&self) -> &Scrollbar {
        &self.scrollbar
    }

    pub fn scrollbar_mut(&mut self) -> &mut Scrollbar {
        &mut self.scrollbar
    }

    pub fn realization(&self) -> &RealizationManager {
        &self.realization
    }

    pub fn realization_mut(&mut self) -> &mut RealizationManager {
        &mut self.realization
    }

    /// Largest allowed offset for the current leaf count and view size.
    #[allow(clippy::cast_precision_loss)]
    pub fn max_offset(&self) -> f64 {
        let count = self.leaf_count as f64;
        if self.view_size > 0.0 {
            (count - self.view_size).max(0.0)
        } else {
            (count - 1.0).max(0.0)
        }
    }

    /// Adopt a new leaf count and clamp the offset to it.
    pub fn set_leaf_count(&mut self, leaf_count: usize) {
        self.leaf_count = leaf_count;
        self.clamp();
    }

    pub fn clamp(&mut self) {
        let clamped = if self.scroll_offset.is_finite() {
            self.scroll_offset.clamp(0.0, self.max_offset())
        } else {
            0.0
        };
        self.scroll_offset = clamped;
        self.scrollbar.set_view_min(clamped);
    }

    /// Move by `delta` leaves. Returns whether the offset changed.
    pub fn scroll_by(&mut self, delta: f64) -> bool {
        if !delta.is_finite() || delta == 0.0 {
            return false;
        }
        self.scroll_to(self.scroll_offset + delta)
    }

    /// Jump to `offset` leaves. Returns whether the offset changed.
    pub fn scroll_to(&mut self, offset: f64) -> bool {
        let before = self.scroll_offset;
        self.scroll_offset = offset;
        self.clamp();
        (self.scroll_offset - before).abs() > f64::EPSILON
    }

    /// Back to the first leaf, e.g. after a full data change.
    pub fn reset(&mut self) {
        self.scroll_offset = 0.0;
        self.view_size = 0.0;
        self.first_visible.clear();
        self.scrollbar.set_view_min(0.0);
        self.realization.reset();
    }

    /// Record the outcome of a rendering session and update the scrollbar.
    #[allow(clippy::cast_precision_loss)]
    pub fn update_from_session(&mut self, view_size: f64, first_visible: Vec<usize>) {
        self.view_size = if view_size.is_finite() {
            view_size.max(0.0)
        } else {
            0.0
        };
        self.first_visible = first_visible;
        self.scrollbar
            .set_range(0.0, self.leaf_count as f64, self.view_size);
        self.scrollbar.set_view_min(self.scroll_offset);
    }

    /// Whether more leaves exist than fit in the view
    #[allow(clippy::cast_precision_loss)]
    pub fn can_scroll(&self) -> bool {
        self.view_size + 1e-9 < self.leaf_count as f64
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_clamped_to_leaf_range() {
        let mut dim = Dimension::new(Axis::Rows);
        dim.set_leaf_count(100);
        dim.update_from_session(19.5, vec![0]);
        assert!(dim.scroll_by(500.0));
        assert_eq!(dim.scroll_offset(), 80.5);
        assert!(dim.scroll_by(-1000.0));
        assert_eq!(dim.scroll_offset(), 0.0);
        assert!(!dim.scroll_by(-1.0));
        assert!(!dim.scroll_by(f64::NAN));
    }

    #[test]
    fn test_without_view_size_last_leaf_is_reachable() {
        let mut dim = Dimension::new(Axis::Columns);
        dim.set_leaf_count(10);
        dim.scroll_to(50.0);
        assert_eq!(dim.scroll_offset(), 9.0);
    }

    #[test]
    fn test_integer_and_fraction_parts() {
        let mut dim = Dimension::new(Axis::Rows);
        dim.set_leaf_count(1000);
        dim.scroll_to(12.25);
        assert_eq!(dim.first_leaf(), 12);
        assert_eq!(dim.fraction(), 0.25);
    }

    #[test]
    fn test_shrinking_leaf_count_pulls_offset_back() {
        let mut dim = Dimension::new(Axis::Rows);
        dim.set_leaf_count(1000);
        dim.update_from_session(20.0, Vec::new());
        dim.scroll_to(500.0);
        dim.set_leaf_count(100);
        assert_eq!(dim.scroll_offset(), 80.0);
        dim.reset();
        assert_eq!(dim.scroll_offset(), 0.0);
    }

    #[test]
    fn test_scrollbar_follows_session() {
        let mut dim = Dimension::new(Axis::Rows);
        dim.set_leaf_count(10);
        dim.update_from_session(10.0, Vec::new());
        assert!(!dim.scrollbar().is_visible());
        assert!(!dim.can_scroll());
        dim.set_leaf_count(40);
        dim.update_from_session(10.0, Vec::new());
        assert!(dim.scrollbar().is_visible());
        assert_eq!(dim.scrollbar().max(), 40.0);
    }
}
