//! Structured error types for tablix.
//!
//! Errors never cross into the host during normal operation: sessions that
//! fail are rolled back by the control and only construction errors surface.

/// All errors that can occur while laying out or persisting a grid.
#[derive(Debug, thiserror::Error)]
pub enum TablixError {
    /// The hierarchy navigator returned an inconsistent parent/child/level answer.
    #[error("Inconsistent hierarchy: {0}")]
    InconsistentHierarchy(String),

    /// Invalid construction or configuration argument.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A column index outside the current leaf column set.
    #[error("Column {index} out of range (column count {count})")]
    ColumnOutOfRange { index: usize, count: usize },

    /// The host rejected a persistence request.
    #[error("Persistence failed: {0}")]
    Persistence(String),

    /// JSON (de)serialization of models or persisted properties.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TablixError>;

impl From<String> for TablixError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for TablixError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<TablixError> for wasm_bindgen::JsValue {
    fn from(e: TablixError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
