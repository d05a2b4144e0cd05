//! Shared value types for the grid control.

mod axis;
mod config;
mod geometry;

pub use axis::*;
pub use config::*;
pub use geometry::*;
