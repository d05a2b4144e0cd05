//! Touch-drag scrolling.
//!
//! A drag that starts in one of the grid regions scrolls the axes that
//! region allows. Pixel movement is converted into leaves with the average
//! track size of the last session. Releasing the finger fast enough starts a
//! two-step swipe: one step of `velocity × SWIPE_STEP_MS` pixels, then one
//! of half that.

use std::collections::VecDeque;

use crate::types::{Axis, Rect};

/// Duration a swipe step covers at release velocity
pub const SWIPE_STEP_MS: f64 = 100.0;
/// Smoothing factor of the velocity moving average
const VELOCITY_SMOOTHING: f64 = 0.3;
/// Samples further apart than this do not update velocity
const MAX_SAMPLE_GAP_MS: f64 = 500.0;

/// Grid area a touch started in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchRegion {
    RowHeaders,
    ColumnHeaders,
    Body,
    Footer,
}

impl TouchRegion {
    pub fn scrolls(self, axis: Axis) -> bool {
        match self {
            TouchRegion::Body => true,
            TouchRegion::RowHeaders => axis == Axis::Rows,
            TouchRegion::ColumnHeaders | TouchRegion::Footer => axis == Axis::Columns,
        }
    }
}

/// Region rectangles in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchLayout {
    pub row_headers: Rect,
    pub column_headers: Rect,
    pub body: Rect,
    pub footer: Rect,
}

impl TouchLayout {
    pub fn hit_test(&self, x: f64, y: f64) -> Option<TouchRegion> {
        [
            (self.body, TouchRegion::Body),
            (self.row_headers, TouchRegion::RowHeaders),
            (self.column_headers, TouchRegion::ColumnHeaders),
            (self.footer, TouchRegion::Footer),
        ]
        .into_iter()
        .find(|(rect, _)| rect.contains(x, y))
        .map(|(_, region)| region)
    }
}

/// Converts pixels along an axis into leaves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelConverter {
    pub pixels_per_item: f64,
}

impl PixelConverter {
    pub fn to_items(&self, pixels: f64) -> f64 {
        if self.pixels_per_item > 0.0 && self.pixels_per_item.is_finite() {
            pixels / self.pixels_per_item
        } else {
            0.0
        }
    }
}

impl Default for PixelConverter {
    fn default() -> Self {
        Self {
            pixels_per_item: 1.0,
        }
    }
}

/// Scroll produced by touch input, in leaves
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchScroll {
    pub rows: f64,
    pub columns: f64,
}

impl TouchScroll {
    pub fn is_zero(&self) -> bool {
        self.rows == 0.0 && self.columns == 0.0
    }

    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Rows => self.rows,
            Axis::Columns => self.columns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveTouch {
    region: TouchRegion,
    last: (f64, f64),
    last_ms: f64,
    /// Pixels per millisecond, (x, y)
    velocity: (f64, f64),
    moved: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TouchManager {
    layout: TouchLayout,
    rows: PixelConverter,
    columns: PixelConverter,
    swipe_threshold: f64,
    active: Option<ActiveTouch>,
    /// Remaining swipe steps with their due time
    swipe: VecDeque<(f64, TouchScroll)>,
}

impl TouchManager {
    pub fn new(swipe_threshold: f64) -> Self {
        Self {
            swipe_threshold,
            ..Self::default()
        }
    }

    pub fn set_layout(&mut self, layout: TouchLayout) {
        self.layout = layout;
    }

    pub fn layout(&self) -> &TouchLayout {
        &self.layout
    }

    pub fn set_converters(&mut self, rows: PixelConverter, columns: PixelConverter) {
        self.rows = rows;
        self.columns = columns;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_swiping(&self) -> bool {
        !self.swipe.is_empty()
    }

    /// Returns whether the touch landed in a scrollable region.
    pub fn on_touch_start(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.swipe.clear();
        self.active = self.layout.hit_test(x, y).map(|region| ActiveTouch {
            region,
            last: (x, y),
            last_ms: now_ms,
            velocity: (0.0, 0.0),
            moved: false,
        });
        self.active.is_some()
    }

    pub fn on_touch_move(&mut self, x: f64, y: f64, now_ms: f64) -> TouchScroll {
        let Some(touch) = self.active.as_mut() else {
            return TouchScroll::default();
        };
        let dx = x - touch.last.0;
        let dy = y - touch.last.1;
        let dt = now_ms - touch.last_ms;
        if dt > 0.0 && dt < MAX_SAMPLE_GAP_MS {
            let a = VELOCITY_SMOOTHING;
            touch.velocity.0 = touch.velocity.0 * (1.0 - a) + dx / dt * a;
            touch.velocity.1 = touch.velocity.1 * (1.0 - a) + dy / dt * a;
        }
        touch.last = (x, y);
        touch.last_ms = now_ms;
        touch.moved = true;
        let region = touch.region;
        // Content follows the finger: dragging up reveals later rows.
        self.to_scroll(region, -dx, -dy)
    }

    /// Finger lifted. Returns the first swipe step if the release was fast.
    pub fn on_touch_end(&mut self, now_ms: f64) -> TouchScroll {
        let Some(touch) = self.active.take() else {
            return TouchScroll::default();
        };
        let (vx, vy) = touch.velocity;
        let speed = vx.hypot(vy);
        if !touch.moved || !speed.is_finite() || speed <= self.swipe_threshold {
            return TouchScroll::default();
        }
        let first = self.to_scroll(touch.region, -vx * SWIPE_STEP_MS, -vy * SWIPE_STEP_MS);
        let second = TouchScroll {
            rows: first.rows / 2.0,
            columns: first.columns / 2.0,
        };
        if !second.is_zero() {
            self.swipe.push_back((now_ms + SWIPE_STEP_MS, second));
        }
        first
    }

    pub fn cancel(&mut self) {
        self.active = None;
        self.swipe.clear();
    }

    /// Pending swipe step due at `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> TouchScroll {
        match self.swipe.front() {
            Some((due, _)) if *due <= now_ms => {
                self.swipe.pop_front().map(|(_, step)| step).unwrap_or_default()
            }
            _ => TouchScroll::default(),
        }
    }

    fn to_scroll(&self, region: TouchRegion, dx: f64, dy: f64) -> TouchScroll {
        TouchScroll {
            rows: if region.scrolls(Axis::Rows) {
                self.rows.to_items(dy)
            } else {
                0.0
            },
            columns: if region.scrolls(Axis::Columns) {
                self.columns.to_items(dx)
            } else {
                0.0
            },
        }
    }
}
