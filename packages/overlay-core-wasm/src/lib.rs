use wasm_bindgen::prelude::*;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use js_sys::Date;
use std::collections::HashMap;

// Create a console module for logging
pub mod console;
pub mod error;
// GeoJSON data model
pub mod models;
pub mod geojson_features;
pub mod layer_policy;
// Geometry pipeline
pub mod geometry_algebra;
pub mod bounds;
pub mod douglas_peucker;
pub mod rectangle;
pub mod truncate;
pub mod style;
pub mod preprocess;
// Loading, bundling and reporting
pub mod loader;
pub mod bundle;
pub mod svg_preview;
pub mod analysis;

pub use error::{Error, Result};
pub use geojson_features::{Feature, FeatureCollection, Properties};
pub use layer_policy::{LayerPolicy, PropertyMode, Rendering, SimplificationStrategy};
pub use models::{Geometry, GeometryType, Position};
pub use preprocess::{
    preprocess_collection, preprocess_collection_parallel, preprocess_feature, PreprocessSummary,
};

use bundle::{BundleOptions, LayerReport, OverlayConfig};
use svg_preview::SvgOptions;

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

// Use the macro from our console module
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console_log!("WASM module initialized successfully");
    });
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreprocessResponse {
    geojson: String,
    summary: PreprocessSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BundleResponse {
    geojson: String,
    layers: Vec<LayerReport>,
    byte_size: usize,
    deflate_size: usize,
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

/// Preprocess one layer. `policy_json` is a layer config object; `property_mode`
/// is `"replace"` or `"overlay"` (default).
#[wasm_bindgen]
pub fn preprocess_geojson(
    geojson: &str,
    layer_id: &str,
    policy_json: &str,
    property_mode: Option<String>,
) -> std::result::Result<JsValue, JsValue> {
    let input = loader::parse_feature_collection(geojson, layer_id)
        .map_err(|e| js_error("Failed to load GeoJSON", e))?;
    let policy: LayerPolicy =
        serde_json::from_str(policy_json).map_err(|e| js_error("Invalid layer config", e))?;
    let mode = parse_property_mode(property_mode.as_deref())?;

    let (collection, summary) = preprocess_collection(&input, layer_id, &policy, mode);
    let geojson =
        serde_json::to_string(&collection).map_err(|e| js_error("Failed to serialize result", e))?;

    Ok(to_value(&PreprocessResponse { geojson, summary })?)
}

fn parse_property_mode(mode: Option<&str>) -> std::result::Result<PropertyMode, JsValue> {
    match mode {
        None => Ok(PropertyMode::default()),
        Some(tag) => serde_json::from_value(serde_json::Value::String(tag.to_string()))
            .map_err(|e| js_error("Invalid property mode", e)),
    }
}

/// Bundle an overlay from in-memory layers.
///
/// `layers_json` maps each layer id of the overlay to its FeatureCollection.
#[wasm_bindgen]
pub fn bundle_overlay_js(
    overlay_json: &str,
    layers_json: &str,
    license: &str,
    attribution: &str,
) -> std::result::Result<JsValue, JsValue> {
    let overlay: OverlayConfig =
        serde_json::from_str(overlay_json).map_err(|e| js_error("Invalid overlay config", e))?;
    let raw_layers: HashMap<String, serde_json::Value> =
        serde_json::from_str(layers_json).map_err(|e| js_error("Invalid layer data", e))?;

    let mut layers = HashMap::with_capacity(raw_layers.len());
    for (layer_id, value) in raw_layers {
        let collection = loader::feature_collection_from_value(value, &layer_id)
            .map_err(|e| js_error("Failed to load layer", e))?;
        layers.insert(layer_id, collection);
    }

    let options = BundleOptions {
        generated: String::from(Date::new_0().to_iso_string()),
        license: license.to_string(),
        attribution: attribution.to_string(),
        parallel: false,
    };
    let bundle = bundle::bundle_overlay(&overlay, &layers, &options)
        .map_err(|e| js_error("Failed to bundle overlay", e))?;

    let geojson = bundle
        .to_compact_json()
        .map_err(|e| js_error("Failed to serialize bundle", e))?;
    let deflate_size = analysis::deflate_size(geojson.as_bytes())
        .map_err(|e| js_error("Failed to measure bundle", e))?;

    Ok(to_value(&BundleResponse {
        byte_size: geojson.len(),
        deflate_size,
        geojson,
        layers: bundle.layers,
    })?)
}

#[wasm_bindgen]
pub fn render_svg_preview(geojson: &str, width: u32, height: u32) -> std::result::Result<String, JsValue> {
    let collection = loader::parse_feature_collection(geojson, "preview")
        .map_err(|e| js_error("Failed to load GeoJSON", e))?;
    let options = SvgOptions {
        width,
        height,
        ..SvgOptions::default()
    };
    svg_preview::render_svg(&collection, &options).map_err(|e| js_error("Failed to render SVG", e))
}

/// Point counts and sizes at each tolerance; an empty list measures the defaults.
#[wasm_bindgen]
pub fn simplification_report(geojson: &str, tolerances: Vec<f64>) -> std::result::Result<JsValue, JsValue> {
    let collection = loader::parse_feature_collection(geojson, "report")
        .map_err(|e| js_error("Failed to load GeoJSON", e))?;
    let tolerances = if tolerances.is_empty() {
        analysis::DEFAULT_TOLERANCES.to_vec()
    } else {
        tolerances
    };
    let rows = analysis::tolerance_report(&collection, &tolerances)
        .map_err(|e| js_error("Failed to build report", e))?;
    Ok(to_value(&rows)?)
}
