//! How many leaves to materialize in the next realization iteration.
//!
//! The estimate is `ceil(remaining / average × factor)`. The factor grows
//! while a session keeps coming up short and shrinks after a session that
//! realized past the filled edge, so the count converges on "just enough"
//! within a few iterations.

use tracing::trace;

/// Factor applied after an iteration that left the axis under-filled
const GROWTH: f64 = 1.5;
/// Factor applied after a session that realized surplus leaves
const SHRINK: f64 = 0.75;
const MAX_FACTOR: f64 = 4.0;
const MIN_FACTOR: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RealizationManager {
    /// Leaves realized in the current session
    realized: usize,
    adjustment_factor: f64,
    /// Running mean of measured leaf sizes
    average_item_size: Option<f64>,
    measured_total: f64,
    measured_count: usize,
    iterations: u32,
}

impl Default for RealizationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RealizationManager {
    pub fn new() -> Self {
        Self {
            realized: 0,
            adjustment_factor: MIN_FACTOR,
            average_item_size: None,
            measured_total: 0.0,
            measured_count: 0,
            iterations: 0,
        }
    }

    pub fn on_start_session(&mut self) {
        self.realized = 0;
        self.iterations = 0;
    }

    pub fn realized(&self) -> usize {
        self.realized
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn adjustment_factor(&self) -> f64 {
        self.adjustment_factor
    }

    pub fn average_item_size(&self) -> Option<f64> {
        self.average_item_size
    }

    /// Leaves to realize to cover `remaining_extent`, at most `remaining_leaves`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn items_to_realize(
        &self,
        remaining_extent: f64,
        remaining_leaves: usize,
        default_size: f64,
    ) -> usize {
        if remaining_leaves == 0 || remaining_extent <= 0.0 {
            return 0;
        }
        let average = self
            .average_item_size
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(default_size)
            .max(f64::EPSILON);
        let estimate = (remaining_extent / average * self.adjustment_factor).ceil();
        let estimate = if estimate.is_finite() && estimate >= 1.0 {
            estimate.min(remaining_leaves as f64) as usize
        } else {
            1
        };
        trace!(
            remaining_extent,
            average,
            factor = self.adjustment_factor,
            estimate,
            "realization estimate"
        );
        estimate.clamp(1, remaining_leaves)
    }

    /// Feed measured leaf sizes into the running average.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_sizes(&mut self, sizes: impl IntoIterator<Item = f64>) {
        for size in sizes {
            if size.is_finite() && size > 0.0 {
                self.measured_total += size;
                self.measured_count += 1;
            }
        }
        if self.measured_count > 0 {
            self.average_item_size = Some(self.measured_total / self.measured_count as f64);
        }
    }

    /// Account for one realization iteration.
    pub fn on_iteration(&mut self, realized: usize, under_filled: bool, items_remain: bool) {
        self.realized += realized;
        self.iterations += 1;
        if under_filled && items_remain {
            self.adjustment_factor = (self.adjustment_factor * GROWTH).min(MAX_FACTOR);
        }
    }

    /// Close the session; `surplus` leaves were realized past the fill point.
    pub fn on_end_session(&mut self, surplus: usize, margin: usize) {
        if surplus > margin {
            self.adjustment_factor = (self.adjustment_factor * SHRINK).max(MIN_FACTOR);
        }
    }

    /// Forget measurements, e.g. when the data changed completely.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
