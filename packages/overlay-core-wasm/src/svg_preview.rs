//! Static SVG preview of a styled FeatureCollection.
//!
//! Coordinates are projected with a plain equirectangular scale: the bounds
//! (plus 10% padding) are fitted into the canvas, centred, with latitude
//! flipped so north is up. Styling comes from each feature's SimpleStyle
//! properties, so a bundle renders the way the client map will draw it.

use std::collections::HashMap;

use serde_json::Value;

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::geojson_features::{Feature, FeatureCollection, Properties};
use crate::models::{Geometry, Position};
use crate::style::hex_to_rgb;

const PADDING: f64 = 0.1;
const POINT_RADIUS: f64 = 3.0;
const DEFAULT_TITLE: &str = "GeoJSON Preview";
const DEFAULT_COLOR: &str = "#000000";

#[derive(Debug, Clone, PartialEq)]
pub struct SvgOptions {
    pub width: u32,
    pub height: u32,
    /// Layer id to the property used as a text label for its point features.
    pub labels: HashMap<String, String>,
}

impl Default for SvgOptions {
    fn default() -> Self {
        SvgOptions {
            width: 800,
            height: 600,
            labels: HashMap::new(),
        }
    }
}

// Maps lon/lat into canvas pixels
struct Transform {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Transform {
    fn fit(bounds: &BoundingBox, width: f64, height: f64) -> Self {
        let lon_range = bounds.width() * (1.0 + PADDING);
        let lat_range = bounds.height() * (1.0 + PADDING);

        // A single point or a flat line has a zero range on one axis
        let scale = [width / lon_range, height / lat_range]
            .into_iter()
            .filter(|s| s.is_finite())
            .fold(f64::INFINITY, f64::min);
        let scale = if scale.is_finite() { scale } else { 1.0 };

        let center_lon = (bounds.min_lon + bounds.max_lon) / 2.0;
        let center_lat = (bounds.min_lat + bounds.max_lat) / 2.0;

        Transform {
            scale,
            offset_x: width / 2.0 - center_lon * scale,
            offset_y: height / 2.0 + center_lat * scale,
        }
    }

    fn apply(&self, position: Position) -> (f64, f64) {
        (
            position.lon * self.scale + self.offset_x,
            -position.lat * self.scale + self.offset_y,
        )
    }
}

struct LegendEntry {
    name: String,
    color: String,
}

/// Render `collection` as an SVG document.
///
/// Fails with [`Error::NoGeometry`] when no feature has a position to fit.
pub fn render_svg(collection: &FeatureCollection, options: &SvgOptions) -> Result<String> {
    let bounds = BoundingBox::of_collection(collection).ok_or(Error::NoGeometry)?;
    let width = options.width as f64;
    let height = options.height as f64;
    let transform = Transform::fit(&bounds, width, height);

    let title = collection.metadata_name().unwrap_or(DEFAULT_TITLE);

    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <style>
      .overlay {{ stroke-width: 1; }}
      .legend {{ font-family: Arial, sans-serif; font-size: 12px; }}
    </style>
  </defs>
  <rect width="{w}" height="{h}" fill="#f8f8f8" stroke="#ccc" stroke-width="1"/>
  <text x="{cx}" y="20" text-anchor="middle" class="legend" font-weight="bold">{title}</text>
"##,
        w = options.width,
        h = options.height,
        cx = options.width / 2,
        title = escape_xml(title)
    ));

    let mut legend: Vec<LegendEntry> = Vec::new();
    for feature in &collection.features {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let style = FeatureStyle::from_properties(&feature.properties);

        if let Some(name) = feature.properties.get("layer_name").and_then(Value::as_str) {
            if !legend.iter().any(|entry| entry.name == name) {
                legend.push(LegendEntry {
                    name: name.to_string(),
                    color: style.stroke.clone(),
                });
            }
        }

        svg.push_str(&format!(
            r#"  <g class="overlay" stroke="{}" stroke-opacity="{}" stroke-width="{}" fill="{}" fill-opacity="{}">
"#,
            paint(&style.stroke),
            style.stroke_opacity,
            style.stroke_width,
            paint(&style.fill),
            style.fill_opacity
        ));
        let label = feature_label(feature, options);
        push_geometry(&mut svg, geometry, &transform, label.as_deref());
        svg.push_str("  </g>\n");
    }

    push_legend(&mut svg, &legend, options.width);

    svg.push_str(&format!(
        r##"  <text x="10" y="{}" class="legend" fill="#666">Bounds: {:.4}, {:.4} to {:.4}, {:.4}</text>
"##,
        options.height.saturating_sub(15),
        bounds.min_lon,
        bounds.min_lat,
        bounds.max_lon,
        bounds.max_lat
    ));
    svg.push_str("</svg>\n");

    Ok(svg)
}

struct FeatureStyle {
    stroke: String,
    stroke_opacity: f64,
    stroke_width: f64,
    fill: String,
    fill_opacity: f64,
}

impl FeatureStyle {
    fn from_properties(properties: &Properties) -> Self {
        let text = |key: &str| properties.get(key).and_then(Value::as_str);
        let number = |key: &str| properties.get(key).and_then(Value::as_f64);

        let stroke = text("stroke")
            .or_else(|| text("marker-color"))
            .unwrap_or(DEFAULT_COLOR)
            .to_string();
        let fill = text("fill").map(str::to_string).unwrap_or_else(|| stroke.clone());

        FeatureStyle {
            stroke_opacity: number("stroke-opacity").unwrap_or(1.0),
            stroke_width: number("stroke-width").unwrap_or(1.0),
            fill_opacity: number("fill-opacity").unwrap_or(0.0),
            stroke,
            fill,
        }
    }
}

fn feature_label(feature: &Feature, options: &SvgOptions) -> Option<String> {
    let layer_id = feature.properties.get("layer_id")?.as_str()?;
    let property = options.labels.get(layer_id)?;
    match feature.properties.get(property)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn push_geometry(svg: &mut String, geometry: &Geometry, transform: &Transform, label: Option<&str>) {
    match geometry {
        Geometry::Point { coordinates } => push_point(svg, *coordinates, transform, label),
        Geometry::MultiPoint { coordinates } => {
            for &point in coordinates {
                push_point(svg, point, transform, label);
            }
        }
        Geometry::LineString { coordinates } => push_path(svg, coordinates, transform, false),
        Geometry::MultiLineString { coordinates } => {
            for line in coordinates {
                push_path(svg, line, transform, false);
            }
        }
        Geometry::Polygon { coordinates } => {
            for ring in coordinates {
                push_path(svg, ring, transform, true);
            }
        }
        Geometry::MultiPolygon { coordinates } => {
            for ring in coordinates.iter().flatten() {
                push_path(svg, ring, transform, true);
            }
        }
        Geometry::GeometryCollection { geometries } => {
            for member in geometries {
                push_geometry(svg, member, transform, label);
            }
        }
        Geometry::Unsupported => {}
    }
}

fn push_point(svg: &mut String, point: Position, transform: &Transform, label: Option<&str>) {
    let (x, y) = transform.apply(point);
    svg.push_str(&format!(
        r#"    <circle cx="{:.2}" cy="{:.2}" r="{}"/>
"#,
        x, y, POINT_RADIUS
    ));
    if let Some(text) = label {
        svg.push_str(&format!(
            r#"    <text x="{:.2}" y="{:.2}" class="legend" stroke="none">{}</text>
"#,
            x + POINT_RADIUS + 2.0,
            y + 4.0,
            escape_xml(text)
        ));
    }
}

fn push_path(svg: &mut String, positions: &[Position], transform: &Transform, closed: bool) {
    if positions.is_empty() {
        return;
    }
    let points: Vec<String> = positions
        .iter()
        .map(|&p| {
            let (x, y) = transform.apply(p);
            format!("{:.2},{:.2}", x, y)
        })
        .collect();
    let close = if closed { " Z" } else { "" };
    svg.push_str(&format!(
        r#"    <path d="M {}{}"/>
"#,
        points.join(" L "),
        close
    ));
}

fn push_legend(svg: &mut String, legend: &[LegendEntry], width: u32) {
    if legend.is_empty() {
        return;
    }
    let legend_x = width.saturating_sub(200);
    let legend_y = 50;
    let legend_height = 30 * legend.len() + 20;

    svg.push_str(&format!(
        r##"  <rect x="{x}" y="{y}" width="180" height="{h}" fill="white" stroke="#ccc" stroke-width="1" opacity="0.9"/>
  <text x="{tx}" y="{ty}" class="legend" font-weight="bold">Layers</text>
"##,
        x = legend_x,
        y = legend_y,
        h = legend_height,
        tx = legend_x + 10,
        ty = legend_y + 15
    ));

    for (i, entry) in legend.iter().enumerate() {
        let y_pos = legend_y + 35 + i as u32 * 25;
        svg.push_str(&format!(
            r##"  <rect x="{}" y="{}" width="12" height="12" fill="{}" stroke="#000" stroke-width="0.5"/>
  <text x="{}" y="{}" class="legend">{}</text>
"##,
            legend_x + 10,
            y_pos - 8,
            paint(&entry.color),
            legend_x + 30,
            y_pos,
            escape_xml(&entry.name)
        ));
    }
}

// Hex colors become rgb(); anything else (named colors) passes through escaped
fn paint(color: &str) -> String {
    match hex_to_rgb(color) {
        Ok((r, g, b)) => format!("rgb({},{},{})", r, g, b),
        Err(_) => escape_xml(color),
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
