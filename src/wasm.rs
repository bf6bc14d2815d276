//! JavaScript host binding
//!
//! Exposes a `PlacementGame` class to the lesson player. Layout comes from JS
//! callbacks queried on every drag end; events go back through JS callbacks.
//! Values cross the boundary as plain JS objects built from the serde JSON
//! shapes, so field names match the authored document (`itemId`, ...).

use js_sys::{Function, JSON, Object, Reflect};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::DomRect;

use crate::engine::{
    CompletionState, ContainerRect, DragOutcome, FeedbackPort, Manifest, Miss, PlacementChanged,
    PositionProvider, Session, SubscriptionId, TargetGeometry,
};
use crate::profile::AgeProfile;
use glam::Vec2;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (e.g. hot reload) just keeps the existing logger
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Placement engine loaded");
}

/// Serialize through JSON into a JS value (`null` if that fails)
fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|json| JSON::parse(&json).ok())
        .unwrap_or(JsValue::NULL)
}

fn read_f32(obj: &JsValue, key: &str) -> Option<f32> {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()?
        .as_f64()
        .map(|v| v as f32)
}

fn read_callback(obj: &Object, key: &str) -> Option<Function> {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()?
        .dyn_into::<Function>()
        .ok()
}

/// Layout backed by host callbacks:
/// `container() -> DOMRect | {x, y, width, height} | null` and
/// `target(id) -> {x, y, radius?} | null`
struct JsPositionProvider {
    container: Function,
    target: Function,
}

impl PositionProvider for JsPositionProvider {
    fn container(&self) -> Option<ContainerRect> {
        let value = self.container.call0(&JsValue::NULL).ok()?;
        if let Some(rect) = value.dyn_ref::<DomRect>() {
            return Some(ContainerRect::new(
                rect.x() as f32,
                rect.y() as f32,
                rect.width() as f32,
                rect.height() as f32,
            ));
        }
        Some(ContainerRect::new(
            read_f32(&value, "x")?,
            read_f32(&value, "y")?,
            read_f32(&value, "width")?,
            read_f32(&value, "height")?,
        ))
    }

    fn target(&self, target_id: &str) -> Option<TargetGeometry> {
        let value = self
            .target
            .call1(&JsValue::NULL, &JsValue::from_str(target_id))
            .ok()?;
        let center = Vec2::new(read_f32(&value, "x")?, read_f32(&value, "y")?);
        Some(TargetGeometry {
            center,
            radius: read_f32(&value, "radius"),
        })
    }
}

/// Port calling `{onPlacement, onMiss, onCompletion}` host callbacks.
///
/// Misses also reach `onPlacement` as a placement-changed with null
/// target/isCorrect. Exceptions thrown by JS are logged and dropped.
struct JsFeedbackPort {
    on_placement: Option<Function>,
    on_miss: Option<Function>,
    on_completion: Option<Function>,
}

impl JsFeedbackPort {
    fn call(callback: &Option<Function>, name: &str, arg: JsValue) {
        if let Some(f) = callback {
            if let Err(err) = f.call1(&JsValue::NULL, &arg) {
                log::warn!("{} callback threw: {:?}", name, err);
            }
        }
    }
}

impl FeedbackPort for JsFeedbackPort {
    fn on_placement(&mut self, event: &PlacementChanged) {
        Self::call(&self.on_placement, "onPlacement", to_js(event));
    }

    fn on_miss(&mut self, event: &Miss) {
        Self::call(&self.on_miss, "onMiss", to_js(event));
        let as_change = PlacementChanged {
            item_id: event.item_id.clone(),
            target_id: None,
            is_correct: None,
            cue: event.cue,
        };
        Self::call(&self.on_placement, "onPlacement", to_js(&as_change));
    }

    fn on_completion(&mut self, state: &CompletionState) {
        Self::call(&self.on_completion, "onCompletion", to_js(state));
    }
}

/// One drag-and-drop mini-game instance
#[wasm_bindgen]
pub struct PlacementGame {
    session: Session,
}

#[wasm_bindgen]
impl PlacementGame {
    /// `manifest_json`: `{items, targets}`; `profile_json`: partial `AgeProfile`
    #[wasm_bindgen(constructor)]
    pub fn new(manifest_json: &str, profile_json: Option<String>) -> Result<PlacementGame, JsValue> {
        let manifest =
            Manifest::from_json(manifest_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let profile = match profile_json {
            Some(json) => {
                AgeProfile::from_json(&json).map_err(|e| JsValue::from_str(&e.to_string()))?
            }
            None => AgeProfile::default(),
        };
        Ok(Self {
            session: Session::new(manifest, profile),
        })
    }

    #[wasm_bindgen(js_name = setPositionProvider)]
    pub fn set_position_provider(&mut self, container: Function, target: Function) {
        self.session
            .set_position_provider(Box::new(JsPositionProvider { container, target }));
    }

    /// Returns `{status: "placed" | "missed" | "rejected", ...}`; never throws
    #[wasm_bindgen(js_name = onDragEnd)]
    pub fn on_drag_end(&mut self, item_id: &str, x: f32, y: f32) -> JsValue {
        let result = match self.session.on_drag_end(item_id, Vec2::new(x, y)) {
            Ok(DragOutcome::Placed {
                placement,
                previous_target,
                distance,
                completed,
            }) => serde_json::json!({
                "status": "placed",
                "placement": placement,
                "previousTarget": previous_target,
                "distance": distance,
                "completed": completed,
            }),
            Ok(DragOutcome::Missed) => serde_json::json!({ "status": "missed" }),
            Err(err) => serde_json::json!({ "status": "rejected", "error": err.to_string() }),
        };
        to_js(&result)
    }

    /// Target id a drop at this point would snap to (hover highlight)
    pub fn preview(&self, x: f32, y: f32) -> Option<String> {
        self.session.preview(Vec2::new(x, y)).map(|hit| hit.target_id)
    }

    /// Send an item back to the tray; `true` if it was placed
    pub fn remove(&mut self, item_id: &str) -> Result<bool, JsValue> {
        self.session
            .remove(item_id)
            .map(|removed| removed.is_some())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn evaluate(&mut self) -> JsValue {
        to_js(&self.session.evaluate())
    }

    pub fn snapshot(&self) -> JsValue {
        to_js(&self.session.snapshot())
    }

    #[wasm_bindgen(js_name = itemState)]
    pub fn item_state(&self, item_id: &str) -> JsValue {
        to_js(&self.session.item_state(item_id))
    }

    pub fn diagnostics(&self) -> JsValue {
        to_js(self.session.report())
    }

    #[wasm_bindgen(js_name = replaceManifest)]
    pub fn replace_manifest(&mut self, manifest_json: &str) -> Result<(), JsValue> {
        let manifest =
            Manifest::from_json(manifest_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.session.replace_manifest(manifest);
        Ok(())
    }

    /// Returns the ids of items that were sitting on the removed target
    #[wasm_bindgen(js_name = removeTarget)]
    pub fn remove_target(&mut self, target_id: &str) -> JsValue {
        to_js(&self.session.remove_target(target_id).unplaced_items)
    }

    /// `callbacks`: `{onPlacement?, onMiss?, onCompletion?}`; returns a handle
    pub fn subscribe(&mut self, callbacks: &Object) -> u32 {
        let port = JsFeedbackPort {
            on_placement: read_callback(callbacks, "onPlacement"),
            on_miss: read_callback(callbacks, "onMiss"),
            on_completion: read_callback(callbacks, "onCompletion"),
        };
        self.session.subscribe(Box::new(port)).0
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.session.unsubscribe(SubscriptionId(id))
    }
}
