//! WebAssembly facade over [`TablixControl`] with the ready-made matrix model.
//!
//! Models, properties and reports cross the boundary as JSON strings. In the
//! browser a persist callback receives the property instances and the
//! snapshot can be read as a plain JS object.

use serde_json::Value;
use tracing::debug;
use wasm_bindgen::prelude::*;

use crate::binder::TextBinder;
use crate::column_width::TablixProperties;
use crate::control::{SessionReport, TablixControl};
use crate::error::{Result, TablixError};
use crate::hierarchy::MatrixNavigator;
use crate::host::{HostServices, PersistError, ScrollEvent, VisualObjectInstance};
use crate::input::{DeltaMode, WheelInput};
use crate::types::{Axis, GridConfig, Viewport};

/// Host services backed by JS callbacks
#[derive(Debug, Default)]
pub struct JsHost {
    /// Instances persisted so far, oldest first
    persisted: Vec<VisualObjectInstance>,
    last_scroll: Option<ScrollEvent>,
    #[cfg(target_arch = "wasm32")]
    persist_callback: Option<js_sys::Function>,
    #[cfg(target_arch = "wasm32")]
    viewport_callback: Option<js_sys::Function>,
}

impl JsHost {
    pub fn persisted(&self) -> &[VisualObjectInstance] {
        &self.persisted
    }

    pub fn last_scroll(&self) -> Option<&ScrollEvent> {
        self.last_scroll.as_ref()
    }
}

impl HostServices for JsHost {
    fn persist_properties(
        &mut self,
        instances: &[VisualObjectInstance],
    ) -> std::result::Result<(), PersistError> {
        #[cfg(target_arch = "wasm32")]
        if let Some(callback) = &self.persist_callback {
            let value = serde_wasm_bindgen::to_value(instances)
                .map_err(|e| PersistError(e.to_string()))?;
            callback
                .call1(&JsValue::NULL, &value)
                .map_err(|e| PersistError(format!("{e:?}")))?;
        }
        self.persisted.extend_from_slice(instances);
        Ok(())
    }

    fn on_viewport_changed(&mut self, event: &ScrollEvent) {
        #[cfg(target_arch = "wasm32")]
        if let Some(callback) = &self.viewport_callback {
            if let Ok(value) = serde_wasm_bindgen::to_value(event) {
                let _ = callback.call1(&JsValue::NULL, &value);
            }
        }
        self.last_scroll = Some(*event);
    }
}

type MatrixControl = TablixControl<MatrixNavigator, TextBinder, JsHost>;

/// Grid control exported to JavaScript
#[wasm_bindgen]
pub struct TablixView {
    control: MatrixControl,
}

fn to_js(err: &TablixError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn report_json(report: &SessionReport) -> String {
    serde_json::to_string(report).unwrap_or_default()
}

fn axis_of(rows: bool) -> Axis {
    if rows {
        Axis::Rows
    } else {
        Axis::Columns
    }
}

impl TablixView {
    /// Parse a config object (`"{}"` or empty for defaults) and build the control.
    ///
    /// # Errors
    /// Returns `TablixError::Json` for malformed JSON and
    /// `TablixError::InvalidConfig` for unusable settings.
    pub fn from_config_json(config_json: &str) -> Result<Self> {
        let config: GridConfig = if config_json.trim().is_empty() {
            GridConfig::default()
        } else {
            serde_json::from_str(config_json)?
        };
        let control = TablixControl::new(config, TextBinder::new(), JsHost::default())?;
        Ok(Self { control })
    }

    /// Load a matrix model and the persisted property bag.
    ///
    /// # Errors
    /// Fails on malformed JSON or a model whose trees cannot be indexed.
    pub fn load_json(
        &mut self,
        model_json: &str,
        properties_json: &str,
        reset_scroll: bool,
    ) -> Result<SessionReport> {
        let navigator = MatrixNavigator::from_json(model_json)?;
        let properties = if properties_json.trim().is_empty() {
            TablixProperties::default()
        } else {
            let bag: Value = serde_json::from_str(properties_json)?;
            TablixProperties::from_property_bag(&bag)?
        };
        debug!(
            rows = navigator.model().rows.len(),
            columns = navigator.model().columns.len(),
            "loading matrix model"
        );
        Ok(self.control.update_models(reset_scroll, navigator, properties))
    }

    pub fn control(&self) -> &MatrixControl {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut MatrixControl {
        &mut self.control
    }
}

#[wasm_bindgen]
impl TablixView {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> std::result::Result<TablixView, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();
        Self::from_config_json(config_json).map_err(|e| to_js(&e))
    }

    /// Load models; returns the session report as JSON.
    pub fn load(
        &mut self,
        model_json: &str,
        properties_json: &str,
        reset_scroll: bool,
    ) -> std::result::Result<String, JsValue> {
        self.load_json(model_json, properties_json, reset_scroll)
            .map(|report| report_json(&report))
            .map_err(|e| to_js(&e))
    }

    pub fn resize(&mut self, width: f64, height: f64) -> String {
        report_json(&self.control.update_viewport(Viewport::new(width, height)))
    }

    pub fn refresh(&mut self, clear: bool) -> String {
        report_json(&self.control.refresh(clear))
    }

    /// Queue a scroll of `delta` leaves along rows (`true`) or columns.
    #[wasm_bindgen(js_name = scrollBy)]
    pub fn scroll_by(&mut self, rows: bool, delta: f64) -> bool {
        self.control.scroll_by(axis_of(rows), delta)
    }

    #[wasm_bindgen(js_name = scrollTo)]
    pub fn scroll_to(&mut self, rows: bool, offset: f64) -> bool {
        self.control.scroll_to(axis_of(rows), offset)
    }

    /// Run queued input; returns the session report as JSON, if any ran.
    #[wasm_bindgen(js_name = processPending)]
    pub fn process_pending(&mut self) -> Option<String> {
        self.control
            .process_pending()
            .map(|report| report_json(&report))
    }

    pub fn wheel(&mut self, delta_x: f64, delta_y: f64, delta_mode: u32, shift: bool) -> bool {
        self.control.on_wheel(&WheelInput {
            delta_x,
            delta_y,
            mode: DeltaMode::from_dom(delta_mode),
            shift,
            wheel_delta: None,
        })
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.control.on_pointer_down(x, y, now_ms)
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.control.on_pointer_move(x, y)
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.control.on_pointer_up(x, y)
    }

    #[wasm_bindgen(js_name = touchStart)]
    pub fn touch_start(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.control.on_touch_start(x, y, now_ms)
    }

    #[wasm_bindgen(js_name = touchMove)]
    pub fn touch_move(&mut self, x: f64, y: f64, now_ms: f64) -> bool {
        self.control.on_touch_move(x, y, now_ms)
    }

    #[wasm_bindgen(js_name = touchEnd)]
    pub fn touch_end(&mut self, now_ms: f64) -> bool {
        self.control.on_touch_end(now_ms)
    }

    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.control.tick(now_ms)
    }

    #[wasm_bindgen(js_name = snapshotJson)]
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.control.snapshot()).unwrap_or_default()
    }

    pub fn destroy(&mut self) {
        self.control.destroy();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl TablixView {
    /// The snapshot as a JS object
    pub fn snapshot(&self) -> std::result::Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.control.snapshot())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// `callback(instances)` runs for every persistence request.
    #[wasm_bindgen(js_name = setPersistCallback)]
    pub fn set_persist_callback(&mut self, callback: js_sys::Function) {
        self.control.host_mut().persist_callback = Some(callback);
    }

    /// `callback(scrollEvent)` runs whenever the scroll offsets change.
    #[wasm_bindgen(js_name = setViewportCallback)]
    pub fn set_viewport_callback(&mut self, callback: js_sys::Function) {
        self.control.host_mut().viewport_callback = Some(callback);
    }

    #[wasm_bindgen(js_name = onWheelEvent)]
    pub fn on_wheel_event(&mut self, event: &web_sys::WheelEvent) -> bool {
        let input = WheelInput::from(event);
        let consumed = self.control.on_wheel(&input);
        if consumed {
            event.prevent_default();
        }
        consumed
    }

    #[wasm_bindgen(js_name = onTouchEvent)]
    pub fn on_touch_event(&mut self, event: &web_sys::TouchEvent) -> bool {
        let now = web_sys::window()
            .and_then(|w| w.performance())
            .map_or(0.0, |p| p.now());
        let touch = event.changed_touches().get(0);
        let consumed = match (event.type_().as_str(), touch) {
            ("touchstart", Some(t)) => {
                self.control
                    .on_touch_start(f64::from(t.client_x()), f64::from(t.client_y()), now)
            }
            ("touchmove", Some(t)) => {
                self.control
                    .on_touch_move(f64::from(t.client_x()), f64::from(t.client_y()), now)
            }
            ("touchend" | "touchcancel", _) => self.control.on_touch_end(now),
            _ => false,
        };
        if consumed {
            event.prevent_default();
        }
        consumed
    }
}
