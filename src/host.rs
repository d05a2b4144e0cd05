//! Outbound services the embedding host provides.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::TablixError;

/// One object of the host's property bag, as sent over the persistence channel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualObjectInstance {
    pub object_name: String,
    pub properties: Map<String, Value>,
}

/// Scroll position after a session that moved either axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollEvent {
    pub row_offset: f64,
    pub column_offset: f64,
    pub first_row: usize,
    pub first_column: usize,
    pub visible_rows: f64,
    pub visible_columns: f64,
}

/// The host rejected a persistence request
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{0}")]
pub struct PersistError(pub String);

impl From<PersistError> for TablixError {
    fn from(err: PersistError) -> Self {
        TablixError::Persistence(err.0)
    }
}

/// Callbacks into the embedding host.
///
/// Persistence has no synchronous acknowledgement; an `Ok` only means the
/// request was accepted for delivery.
pub trait HostServices {
    fn persist_properties(&mut self, instances: &[VisualObjectInstance]) -> Result<(), PersistError>;

    /// A column resize drag ended
    fn on_column_resize_end(&mut self, _column_index: usize, _width: f64) {}

    fn on_viewport_changed(&mut self, _event: &ScrollEvent) {}
}

/// Host that accepts and drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl HostServices for NullHost {
    fn persist_properties(&mut self, _instances: &[VisualObjectInstance]) -> Result<(), PersistError> {
        Ok(())
    }
}
