//! Content size estimation.

use tracing::warn;

use crate::types::GridConfig;

/// Estimates the rendered size of a piece of text.
pub trait TextMeasurer {
    /// (width, height) of `text` without padding
    fn measure(&self, text: &str) -> (f64, f64);
}

/// Fixed-advance measurer: every glyph is `char_width` wide and every line
/// `line_height` tall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasurer {
    pub char_width: f64,
    pub line_height: f64,
}

impl MonospaceMeasurer {
    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            char_width: config.char_width,
            line_height: config.line_height,
        }
    }
}

impl TextMeasurer for MonospaceMeasurer {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str) -> (f64, f64) {
        let mut lines = 0usize;
        let mut widest = 0usize;
        for line in text.split('\n') {
            lines += 1;
            widest = widest.max(line.chars().count());
        }
        (
            widest as f64 * self.char_width,
            lines.max(1) as f64 * self.line_height,
        )
    }
}

impl<F> TextMeasurer for F
where
    F: Fn(&str) -> (f64, f64),
{
    fn measure(&self, text: &str) -> (f64, f64) {
        self(text)
    }
}

/// Replace an implausible size with `minimum`; clamp plausible ones to it.
pub fn sanitize_size(value: f64, minimum: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        warn!(value, minimum, "implausible size estimate, using minimum");
        return minimum;
    }
    value.max(minimum)
}

/// Measure `text` and add the configured padding on both sides.
pub fn padded_size(measurer: &dyn TextMeasurer, config: &GridConfig, text: &str) -> (f64, f64) {
    let (w, h) = measurer.measure(text);
    (
        sanitize_size(w, 0.0) + 2.0 * config.cell_padding,
        sanitize_size(h, 0.0) + 2.0 * config.cell_padding_vertical,
    )
}
