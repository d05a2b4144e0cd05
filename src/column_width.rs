//! Column widths: sizing mode, user resizes and their persistence.
//!
//! Widths are keyed by the column's query name so they survive data views
//! that reorder, add or remove columns. The host stores them as a JSON
//! string under `general.columnWidth` next to `general.autoSizeColumnWidth`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Result, TablixError};
use crate::host::VisualObjectInstance;

/// Property bag object holding the width settings
pub const GENERAL_OBJECT: &str = "general";
pub const COLUMN_WIDTH_PROPERTY: &str = "columnWidth";
pub const AUTO_SIZE_PROPERTY: &str = "autoSizeColumnWidth";

/// Persisted width of one leaf column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnWidthObject {
    pub query_name: String,
    /// Missing or negative means auto-sized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl ColumnWidthObject {
    pub fn auto(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            width: None,
        }
    }

    /// Explicit width, if any
    pub fn fixed_width(&self) -> Option<f64> {
        self.width.filter(|w| w.is_finite() && *w >= 0.0)
    }

    pub fn is_auto(&self) -> bool {
        self.fixed_width().is_none()
    }
}

/// Width settings read from the host's property bag.
#[derive(Debug, Clone, PartialEq)]
pub struct TablixProperties {
    pub auto_size_column_width: bool,
    pub column_widths: Vec<ColumnWidthObject>,
}

impl Default for TablixProperties {
    fn default() -> Self {
        Self {
            auto_size_column_width: true,
            column_widths: Vec::new(),
        }
    }
}

impl TablixProperties {
    /// Read `{ "general": { "columnWidth": "...", "autoSizeColumnWidth": bool } }`.
    ///
    /// `columnWidth` may be the serialized JSON string the grid persists or
    /// an inline array. Missing properties keep their defaults.
    ///
    /// # Errors
    /// Returns `TablixError::Json` when `columnWidth` is present but malformed.
    pub fn from_property_bag(bag: &Value) -> Result<Self> {
        let mut properties = Self::default();
        let Some(general) = bag.get(GENERAL_OBJECT) else {
            return Ok(properties);
        };
        if let Some(auto) = general.get(AUTO_SIZE_PROPERTY).and_then(Value::as_bool) {
            properties.auto_size_column_width = auto;
        }
        match general.get(COLUMN_WIDTH_PROPERTY) {
            Some(Value::String(json)) if !json.trim().is_empty() => {
                properties.column_widths = serde_json::from_str(json)?;
            }
            Some(array @ Value::Array(_)) => {
                properties.column_widths = serde_json::from_value(array.clone())?;
            }
            _ => {}
        }
        Ok(properties)
    }

    /// The `general` object to send over the persistence channel.
    ///
    /// # Errors
    /// Returns `TablixError::Json` if the widths cannot be serialized.
    pub fn to_instance(&self) -> Result<VisualObjectInstance> {
        let mut map = Map::new();
        map.insert(
            COLUMN_WIDTH_PROPERTY.to_string(),
            Value::String(serde_json::to_string(&self.column_widths)?),
        );
        map.insert(
            AUTO_SIZE_PROPERTY.to_string(),
            Value::Bool(self.auto_size_column_width),
        );
        Ok(VisualObjectInstance {
            object_name: GENERAL_OBJECT.to_string(),
            properties: map,
        })
    }
}

/// Keeps the width of every leaf column and decides when to persist.
#[derive(Debug, Clone, Default)]
pub struct ColumnWidthManager {
    columns: Vec<ColumnWidthObject>,
    auto_size: bool,
    initialized: bool,
    /// In-memory widths the host has not echoed back yet
    dirty: bool,
    /// A persistence request should be sent at the end of the session
    persist_pending: bool,
    /// The last request failed; wait for a structural session to retry
    retry_on_structural: bool,
}

impl ColumnWidthManager {
    pub fn new() -> Self {
        Self {
            auto_size: true,
            ..Self::default()
        }
    }

    pub fn columns(&self) -> &[ColumnWidthObject] {
        &self.columns
    }

    pub fn auto_size(&self) -> bool {
        self.auto_size
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_persist_pending(&self) -> bool {
        self.persist_pending
    }

    /// Explicit width of the column persisted under `query_name`
    pub fn width_for(&self, query_name: &str) -> Option<f64> {
        self.columns
            .iter()
            .find(|c| c.query_name == query_name)
            .and_then(ColumnWidthObject::fixed_width)
    }

    /// Rebuild the width list for a new data view.
    ///
    /// `query_names` are the current leaf columns in order. `rendered` gives
    /// the width a column was last drawn at, used when auto-sizing is turned
    /// off. Widths of columns that disappeared are dropped.
    pub fn update_data_view<F>(
        &mut self,
        query_names: &[String],
        properties: &TablixProperties,
        rendered: F,
    ) where
        F: Fn(&str) -> Option<f64>,
    {
        let toggled = self.initialized && properties.auto_size_column_width != self.auto_size;
        let source: HashMap<String, Option<f64>> = if !toggled && self.dirty {
            self.width_map()
        } else {
            properties
                .column_widths
                .iter()
                .map(|c| (c.query_name.clone(), c.fixed_width()))
                .collect()
        };
        if self.dirty && !toggled && self.matches(properties) {
            debug!("host echoed persisted column widths");
            self.dirty = false;
        }

        self.auto_size = properties.auto_size_column_width;
        self.columns = query_names
            .iter()
            .map(|name| {
                let width = if toggled && self.auto_size {
                    None
                } else if toggled {
                    rendered(name).filter(|w| w.is_finite() && *w >= 0.0)
                } else {
                    source.get(name).copied().flatten()
                };
                ColumnWidthObject {
                    query_name: name.clone(),
                    width,
                }
            })
            .collect();

        if toggled {
            debug!(auto_size = self.auto_size, "column autosize toggled");
            self.mark_changed();
        }
        self.initialized = true;
    }

    /// Record a user resize of leaf column `index`.
    ///
    /// # Errors
    /// Returns `TablixError::ColumnOutOfRange` for an unknown column.
    pub fn on_column_width_changed(&mut self, index: usize, width: f64) -> Result<()> {
        let count = self.columns.len();
        let column = self
            .columns
            .get_mut(index)
            .ok_or(TablixError::ColumnOutOfRange { index, count })?;
        if !width.is_finite() || width < 0.0 {
            return Err(TablixError::Other(format!(
                "width {width} for column {index} is not a size"
            )));
        }
        column.width = Some(width);
        self.mark_changed();
        Ok(())
    }

    /// Persistence request to send now, if one is due.
    ///
    /// # Errors
    /// Returns `TablixError::Json` if the widths cannot be serialized.
    pub fn take_persist_request(&mut self, structural: bool) -> Result<Option<VisualObjectInstance>> {
        if !self.persist_pending || (self.retry_on_structural && !structural) {
            return Ok(None);
        }
        let instance = self.properties().to_instance()?;
        self.persist_pending = false;
        Ok(Some(instance))
    }

    /// Outcome of the request returned by [`take_persist_request`](Self::take_persist_request).
    pub fn on_persist_result(&mut self, result: &Result<()>) {
        match result {
            Ok(()) => self.retry_on_structural = false,
            Err(err) => {
                warn!(%err, "column width persistence failed, keeping in-memory widths");
                self.persist_pending = true;
                self.retry_on_structural = true;
            }
        }
    }

    /// Current settings in property-bag form
    pub fn properties(&self) -> TablixProperties {
        TablixProperties {
            auto_size_column_width: self.auto_size,
            column_widths: self.columns.clone(),
        }
    }

    fn mark_changed(&mut self) {
        self.dirty = true;
        self.persist_pending = true;
        self.retry_on_structural = false;
    }

    fn width_map(&self) -> HashMap<String, Option<f64>> {
        self.columns
            .iter()
            .map(|c| (c.query_name.clone(), c.fixed_width()))
            .collect()
    }

    fn matches(&self, properties: &TablixProperties) -> bool {
        let ours = self.width_map();
        properties.auto_size_column_width == self.auto_size
            && properties
                .column_widths
                .iter()
                .all(|c| ours.get(&c.query_name).copied().flatten() == c.fixed_width())
            && self
                .columns
                .iter()
                .filter(|c| !c.is_auto())
                .all(|c| properties.column_widths.iter().any(|p| p.query_name == c.query_name))
    }
}
