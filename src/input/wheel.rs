//! Wheel normalization.
//!
//! Browsers report wheel deltas in pixels, lines or pages, and old engines
//! only in `wheelDelta` units. Everything is reduced to notches and routed to
//! the axis with the larger movement.

use crate::types::Axis;

pub const PIXELS_PER_NOTCH: f64 = 100.0;
pub const LINES_PER_NOTCH: f64 = 3.0;
/// `wheelDelta` units per notch
pub const LEGACY_UNITS_PER_NOTCH: f64 = 120.0;

/// `WheelEvent.deltaMode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            1 => DeltaMode::Line,
            2 => DeltaMode::Page,
            _ => DeltaMode::Pixel,
        }
    }
}

/// Raw wheel event fields
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub mode: DeltaMode,
    pub shift: bool,
    /// Legacy `wheelDelta` (positive scrolls up), used when both deltas are zero
    pub wheel_delta: Option<f64>,
}

/// A normalized wheel movement along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelScroll {
    pub axis: Axis,
    /// Signed notch count; positive moves towards later leaves
    pub notches: f64,
}

fn to_notches(delta: f64, mode: DeltaMode) -> f64 {
    match mode {
        DeltaMode::Pixel => delta / PIXELS_PER_NOTCH,
        DeltaMode::Line => delta / LINES_PER_NOTCH,
        DeltaMode::Page => delta,
    }
}

/// Reduce a wheel event to one axis and a notch count.
///
/// Returns None for events that do not move.
pub fn normalize(input: &WheelInput) -> Option<WheelScroll> {
    let (mut x, mut y) = if input.delta_x == 0.0 && input.delta_y == 0.0 {
        let legacy = input.wheel_delta.unwrap_or(0.0);
        (0.0, -legacy / LEGACY_UNITS_PER_NOTCH)
    } else {
        (
            to_notches(input.delta_x, input.mode),
            to_notches(input.delta_y, input.mode),
        )
    };
    if input.shift {
        std::mem::swap(&mut x, &mut y);
    }
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let (axis, notches) = if x.abs() > y.abs() {
        (Axis::Columns, x)
    } else {
        (Axis::Rows, y)
    };
    (notches != 0.0).then_some(WheelScroll { axis, notches })
}

#[cfg(target_arch = "wasm32")]
impl From<&web_sys::WheelEvent> for WheelInput {
    fn from(event: &web_sys::WheelEvent) -> Self {
        Self {
            delta_x: event.delta_x(),
            delta_y: event.delta_y(),
            mode: DeltaMode::from_dom(event.delta_mode()),
            shift: event.shift_key(),
            wheel_delta: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn wheel(delta_x: f64, delta_y: f64, mode: DeltaMode) -> WheelInput {
        WheelInput {
            delta_x,
            delta_y,
            mode,
            ..WheelInput::default()
        }
    }

    #[test_case(wheel(0.0, 100.0, DeltaMode::Pixel), Axis::Rows, 1.0 ; "pixel notch")]
    #[test_case(wheel(0.0, -6.0, DeltaMode::Line), Axis::Rows, -2.0 ; "two lines up")]
    #[test_case(wheel(0.0, 1.0, DeltaMode::Page), Axis::Rows, 1.0 ; "one page")]
    #[test_case(wheel(250.0, 40.0, DeltaMode::Pixel), Axis::Columns, 2.5 ; "horizontal dominates")]
    #[test_case(WheelInput { delta_y: 100.0, shift: true, ..WheelInput::default() }, Axis::Columns, 1.0 ; "shift swaps axes")]
    #[test_case(WheelInput { wheel_delta: Some(240.0), ..WheelInput::default() }, Axis::Rows, -2.0 ; "legacy wheel delta")]
    fn test_normalize(input: WheelInput, axis: Axis, notches: f64) {
        let scroll = normalize(&input).unwrap();
        assert_eq!(scroll.axis, axis);
        assert_eq!(scroll.notches, notches);
    }

    #[test]
    fn test_still_wheel_is_ignored() {
        assert!(normalize(&WheelInput::default()).is_none());
        assert!(normalize(&wheel(f64::NAN, 1.0, DeltaMode::Pixel)).is_none());
    }

    #[test]
    fn test_dom_delta_modes() {
        assert_eq!(DeltaMode::from_dom(0), DeltaMode::Pixel);
        assert_eq!(DeltaMode::from_dom(1), DeltaMode::Line);
        assert_eq!(DeltaMode::from_dom(2), DeltaMode::Page);
    }
}
