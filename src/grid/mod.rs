//! Realized grid object graph.
//!
//! Cells live in one arena per grid; rows and columns hold indices into it.
//! This avoids row/cell/column back-references and makes window shifts a
//! rotation of track handles.

mod cell;
mod tablix_grid;
mod track;

pub use cell::{Cell, CellArena, CellId, CellItem};
pub use tablix_grid::TablixGrid;
pub use track::{Column, Row, SizeMode, Track, TrackSize};
