//! Realization, measurement and scrolling along one axis at a time.

pub mod axis;
pub mod dimension;
pub mod manager;
pub mod measure;
pub mod realization;
pub mod spanning;

pub use axis::{AxisCapabilities, COLUMNS, ROWS};
pub use dimension::Dimension;
pub use manager::{AxisPlan, DimensionLayoutManager, HeaderSegment, LayoutPhase, PlannedTrack};
pub use measure::{MonospaceMeasurer, TextMeasurer};
pub use realization::RealizationManager;
