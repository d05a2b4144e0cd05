use serde::{Deserialize, Serialize};

use crate::error::{Result, TablixError};

/// Default column width in pixels when nothing has been measured yet
pub const DEFAULT_COLUMN_WIDTH: f64 = 64.0;

/// Default row height in pixels when nothing has been measured yet
pub const DEFAULT_ROW_HEIGHT: f64 = 20.0;

/// Sizing and interaction settings for a grid control.
///
/// Every field has a default, so hosts can deserialize a partial JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    /// Size estimate for a column before any column was measured
    pub default_column_width: f64,
    /// Size estimate for a row before any row was measured
    pub default_row_height: f64,
    /// Smallest width a column can be given, by content or by the user
    pub min_column_width: f64,
    /// Smallest height a row can be given
    pub min_row_height: f64,
    /// Upper bound for content-sized columns (None = unbounded)
    pub max_auto_column_width: Option<f64>,
    /// Average glyph advance used by the built-in text measurer
    pub char_width: f64,
    /// Line height used by the built-in text measurer
    pub line_height: f64,
    /// Horizontal padding added on both sides of measured content
    pub cell_padding: f64,
    /// Vertical padding added above and below measured content
    pub cell_padding_vertical: f64,
    /// Hard cap on realization iterations per rendering session
    pub max_iterations: u32,
    /// Leaves kept realized past the filled edge
    pub realization_margin: usize,
    /// Leaves scrolled per normalized wheel notch
    pub wheel_items_per_notch: f64,
    /// Release velocity (px/ms) above which a touch drag counts as a swipe
    pub swipe_velocity_threshold: f64,
    /// Width of the column-header edge that starts a resize drag
    pub resize_handle_width: f64,
    /// Thickness of a visible scrollbar
    pub scrollbar_thickness: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_column_width: DEFAULT_COLUMN_WIDTH,
            default_row_height: DEFAULT_ROW_HEIGHT,
            min_column_width: 20.0,
            min_row_height: 16.0,
            max_auto_column_width: None,
            char_width: 7.0,
            line_height: 16.0,
            cell_padding: 6.0,
            cell_padding_vertical: 2.0,
            max_iterations: 10,
            realization_margin: 2,
            wheel_items_per_notch: 1.0,
            swipe_velocity_threshold: 0.5,
            resize_handle_width: 4.0,
            scrollbar_thickness: 9.0,
        }
    }
}

impl GridConfig {
    /// Reject settings that would make layout meaningless.
    ///
    /// # Errors
    /// Returns `TablixError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("defaultColumnWidth", self.default_column_width),
            ("defaultRowHeight", self.default_row_height),
            ("minColumnWidth", self.min_column_width),
            ("minRowHeight", self.min_row_height),
            ("charWidth", self.char_width),
            ("lineHeight", self.line_height),
            ("wheelItemsPerNotch", self.wheel_items_per_notch),
            ("swipeVelocityThreshold", self.swipe_velocity_threshold),
        ];
        for (name, value) in sizes {
            if !value.is_finite() || value <= 0.0 {
                return Err(TablixError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        let non_negative = [
            ("cellPadding", self.cell_padding),
            ("cellPaddingVertical", self.cell_padding_vertical),
            ("resizeHandleWidth", self.resize_handle_width),
            ("scrollbarThickness", self.scrollbar_thickness),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TablixError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if let Some(max) = self.max_auto_column_width {
            if !max.is_finite() || max < self.min_column_width {
                return Err(TablixError::InvalidConfig(format!(
                    "maxAutoColumnWidth {max} is below minColumnWidth"
                )));
            }
        }
        if self.max_iterations == 0 {
            return Err(TablixError::InvalidConfig(
                "maxIterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
