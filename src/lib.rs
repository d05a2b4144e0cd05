//! tablix - virtualized hierarchical grid control
//!
//! Realizes table and matrix layouts over arbitrarily large row and column
//! hierarchies while keeping only the visible cells (plus a small margin)
//! bound:
//! - Multi-level row and column headers with spanning parents
//! - Auto-sized columns with persisted user widths
//! - Scrollbars, wheel, touch swipe and column resize input
//! - Fractional scroll offsets applied as pixel shifts
//!
//! # Usage (Rust)
//!
//! ```no_run
//! use tablix::{GridConfig, MatrixModel, MatrixNavigator, NullHost, TablixControl, TextBinder, Viewport};
//! use tablix::column_width::TablixProperties;
//!
//! # fn main() -> tablix::error::Result<()> {
//! let model = MatrixModel::flat_table(&["Name"], vec![vec!["Ada".into()]]);
//! let mut control = TablixControl::new(GridConfig::default(), TextBinder::new(), NullHost)?;
//! control.update_viewport(Viewport::new(640.0, 480.0));
//! control.update_models(true, MatrixNavigator::new(model)?, TablixProperties::default());
//! let snapshot = control.snapshot();
//! # let _ = snapshot;
//! # Ok(())
//! # }
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { TablixView } from 'tablix';
//! await init();
//! const view = new TablixView('{}');
//! view.resize(640, 480);
//! view.load(modelJson, propertiesJson, true);
//! const snapshot = view.snapshot();
//! ```

pub mod binder;
pub mod column_width;
pub mod control;
pub mod error;
pub mod grid;
pub mod hierarchy;
pub mod host;
pub mod input;
pub mod layout;
pub mod types;
pub mod wasm;

use wasm_bindgen::prelude::*;

pub use binder::{Binder, LabelSource, TextBinder};
pub use control::{
    CellSnapshot, ContentSize, Frame, GridSnapshot, ScrollbarSnapshot, SessionKind, SessionReport,
    SessionStatus, TablixControl,
};
pub use hierarchy::{HeaderNode, HierarchyNavigator, MatrixModel, MatrixNavigator, MemberId};
pub use host::{HostServices, NullHost};
pub use types::*;
pub use wasm::TablixView;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
