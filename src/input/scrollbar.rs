//! Axis-independent scrollbar model.
//!
//! The scrollbar knows a range (`min..max`), how much of it is in view
//! (`view_size`) and where the view starts (`view_min`). Pointer input on
//! arrows, track and thumb is turned into a delta in range units; the owner
//! applies the delta through its single `scroll_by` entry point.

use serde::Serialize;

use crate::types::Axis;

/// Delay before a held arrow or track starts repeating
pub const REPEAT_INITIAL_DELAY_MS: f64 = 400.0;
/// Interval between repeats while held
pub const REPEAT_INTERVAL_MS: f64 = 50.0;
/// Thumbs never get shorter than this
pub const MIN_THUMB_LENGTH: f64 = 16.0;
/// Range units scrolled per arrow press
const ARROW_STEP: f64 = 1.0;

/// The part of a scrollbar under a pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollbarPart {
    ArrowBack,
    TrackBack,
    Thumb,
    TrackForward,
    ArrowForward,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ThumbDrag {
    start_px: f64,
    start_view_min: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Repeat {
    delta: f64,
    next_ms: f64,
    part: ScrollbarPart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scrollbar {
    pub orientation: Axis,
    min: f64,
    max: f64,
    view_size: f64,
    view_min: f64,
    /// Track length in pixels (arrow buttons included)
    length_px: f64,
    /// Arrow button length in pixels
    arrow_px: f64,
    visible: bool,
    #[serde(skip)]
    drag: Option<ThumbDrag>,
    #[serde(skip)]
    repeat: Option<Repeat>,
}

impl Scrollbar {
    pub fn new(orientation: Axis) -> Self {
        Self {
            orientation,
            min: 0.0,
            max: 0.0,
            view_size: 0.0,
            view_min: 0.0,
            length_px: 0.0,
            arrow_px: 0.0,
            visible: false,
            drag: None,
            repeat: None,
        }
    }

    pub fn set_range(&mut self, min: f64, max: f64, view_size: f64) {
        self.min = min;
        self.max = max.max(min);
        self.view_size = view_size.clamp(0.0, self.max - self.min);
        self.view_min = self.view_min.clamp(self.min, self.max_view_min());
        self.visible = self.view_size + 1e-9 < self.max - self.min;
    }

    pub fn set_view_min(&mut self, view_min: f64) {
        self.view_min = view_min.clamp(self.min, self.max_view_min());
    }

    /// Pixel geometry: total length and the size of each arrow button.
    pub fn set_geometry(&mut self, length_px: f64, arrow_px: f64) {
        self.length_px = length_px.max(0.0);
        self.arrow_px = arrow_px.clamp(0.0, self.length_px / 2.0);
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn view_size(&self) -> f64 {
        self.view_size
    }

    pub fn view_min(&self) -> f64 {
        self.view_min
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn max_view_min(&self) -> f64 {
        (self.max - self.view_size).max(self.min)
    }

    fn track_px(&self) -> f64 {
        (self.length_px - 2.0 * self.arrow_px).max(0.0)
    }

    /// Thumb start and length in pixels from the scrollbar origin.
    pub fn thumb(&self) -> (f64, f64) {
        let track = self.track_px();
        let range = self.max - self.min;
        if range <= 0.0 || track <= 0.0 {
            return (self.arrow_px, track);
        }
        let length = (track * self.view_size / range).clamp(MIN_THUMB_LENGTH.min(track), track);
        let travel = track - length;
        let scrollable = range - self.view_size;
        let position = if scrollable > 0.0 {
            (self.view_min - self.min) / scrollable * travel
        } else {
            0.0
        };
        (self.arrow_px + position, length)
    }

    pub fn hit_test(&self, pos_px: f64) -> Option<ScrollbarPart> {
        if !self.visible || pos_px < 0.0 || pos_px >= self.length_px {
            return None;
        }
        if pos_px < self.arrow_px {
            return Some(ScrollbarPart::ArrowBack);
        }
        if pos_px >= self.length_px - self.arrow_px {
            return Some(ScrollbarPart::ArrowForward);
        }
        let (start, length) = self.thumb();
        if pos_px < start {
            Some(ScrollbarPart::TrackBack)
        } else if pos_px < start + length {
            Some(ScrollbarPart::Thumb)
        } else {
            Some(ScrollbarPart::TrackForward)
        }
    }

    fn part_delta(&self, part: ScrollbarPart) -> f64 {
        let page = self.view_size.max(ARROW_STEP);
        match part {
            ScrollbarPart::ArrowBack => -ARROW_STEP,
            ScrollbarPart::ArrowForward => ARROW_STEP,
            ScrollbarPart::TrackBack => -page,
            ScrollbarPart::TrackForward => page,
            ScrollbarPart::Thumb => 0.0,
        }
    }

    /// Press at `pos_px`. Returns the delta to scroll by, if any.
    pub fn on_pointer_down(&mut self, pos_px: f64, now_ms: f64) -> Option<f64> {
        let part = self.hit_test(pos_px)?;
        if part == ScrollbarPart::Thumb {
            self.drag = Some(ThumbDrag {
                start_px: pos_px,
                start_view_min: self.view_min,
            });
            return None;
        }
        let delta = self.part_delta(part);
        self.repeat = Some(Repeat {
            delta,
            next_ms: now_ms + REPEAT_INITIAL_DELAY_MS,
            part,
        });
        Some(delta)
    }

    /// Pointer moved to `pos_px` while captured. Returns the delta for a thumb drag.
    pub fn on_pointer_move(&mut self, pos_px: f64) -> Option<f64> {
        let drag = self.drag?;
        let (_, length) = self.thumb();
        let travel = self.track_px() - length;
        let scrollable = self.max - self.min - self.view_size;
        if travel <= 0.0 || scrollable <= 0.0 {
            return None;
        }
        let target = (drag.start_view_min + (pos_px - drag.start_px) / travel * scrollable)
            .clamp(self.min, self.max_view_min());
        let delta = target - self.view_min;
        (delta.abs() > f64::EPSILON).then_some(delta)
    }

    pub fn on_pointer_up(&mut self) {
        self.drag = None;
        self.repeat = None;
    }

    /// Auto-repeat for held arrows and track presses.
    pub fn tick(&mut self, now_ms: f64) -> Option<f64> {
        let repeat = self.repeat.as_mut()?;
        if now_ms < repeat.next_ms {
            return None;
        }
        repeat.next_ms = now_ms + REPEAT_INTERVAL_MS;
        let (delta, part) = (repeat.delta, repeat.part);
        // Track repeats stop once the thumb reaches the pointer side.
        let at_edge = match part {
            ScrollbarPart::ArrowBack | ScrollbarPart::TrackBack => self.view_min <= self.min,
            ScrollbarPart::ArrowForward | ScrollbarPart::TrackForward => {
                self.view_min >= self.max_view_min()
            }
            ScrollbarPart::Thumb => true,
        };
        if at_edge {
            self.repeat = None;
            return None;
        }
        Some(delta)
    }
}
