//! Rendering config to GeoJSON SimpleStyle properties.
//!
//! See <https://github.com/mapbox/simplestyle-spec>. Points read the `marker-*`
//! keys, lines and polygon borders the `stroke*` keys, polygon interiors the
//! `fill*` keys; every feature gets the full set so the client can style any
//! geometry kind from one layer config.

use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::geojson_features::Properties;
use crate::layer_policy::Rendering;

const DEFAULT_THICKNESS: f64 = 1.0;
const TRANSPARENT_FILL: &str = "#000000";

pub fn simple_style(rendering: &Rendering) -> Properties {
    let mut style = Properties::new();

    if let Some(color) = &rendering.line_color {
        style.insert("stroke".into(), json!(color));
    }
    if let Some(opacity) = rendering.line_opacity {
        style.insert("stroke-opacity".into(), json!(opacity));
    }
    if let Some(thickness) = rendering.line_thickness {
        style.insert("stroke-width".into(), json!(thickness));
    }

    if let Some(fill_opacity) = rendering.fill_opacity {
        style.insert("fill-opacity".into(), json!(fill_opacity));
        // Fill reuses the line color when visible; a zero opacity still needs a value
        if fill_opacity > 0.0 {
            if let Some(color) = &rendering.line_color {
                style.insert("fill".into(), json!(color));
            }
        } else if fill_opacity == 0.0 {
            style.insert("fill".into(), json!(TRANSPARENT_FILL));
        }
    }

    if let Some(color) = &rendering.line_color {
        style.insert("marker-color".into(), json!(color));
    }
    let thickness = rendering.line_thickness.unwrap_or(DEFAULT_THICKNESS);
    style.insert("marker-size".into(), json!(marker_size(thickness)));

    style.insert("visible".into(), Value::Bool(true));
    style
}

pub fn marker_size(thickness: f64) -> &'static str {
    if thickness <= 1.0 {
        "small"
    } else if thickness <= 2.0 {
        "medium"
    } else {
        "large"
    }
}

/// Parse `#rrggbb` (leading `#` optional) into its channels.
pub fn hex_to_rgb(color: &str) -> Result<(u8, u8, u8)> {
    let hex = color.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(Error::InvalidColor(color.to_string()));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColor(color.to_string()))
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
