// Per-layer configuration, deserialized once and shared read-only by the pipeline
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::GeometryType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SimplificationStrategy {
    #[default]
    None,
    DouglasPeucker,
    Rectangle,
    // Any other tag; dispatch treats it like `None`
    Unrecognized,
}

impl SimplificationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimplificationStrategy::None => "none",
            SimplificationStrategy::DouglasPeucker => "douglas_peucker",
            SimplificationStrategy::Rectangle => "rectangle",
            SimplificationStrategy::Unrecognized => "unrecognized",
        }
    }
}

impl From<String> for SimplificationStrategy {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "none" => SimplificationStrategy::None,
            "douglas_peucker" => SimplificationStrategy::DouglasPeucker,
            "rectangle" => SimplificationStrategy::Rectangle,
            _ => SimplificationStrategy::Unrecognized,
        }
    }
}

impl From<SimplificationStrategy> for String {
    fn from(strategy: SimplificationStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Visual attributes of a layer, converted to SimpleStyle properties on output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rendering {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_thickness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPolicy {
    /// Where the layer's data comes from. Opaque to the pipeline.
    #[serde(default)]
    pub input_file: PathBuf,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub simplification_strategy: SimplificationStrategy,
    /// Douglas-Peucker tolerance in degrees.
    #[serde(default)]
    pub simplification_tolerance: f64,
    #[serde(default, alias = "noCompression")]
    pub skip_simplification: bool,
    #[serde(default = "all_geometry_types")]
    pub geometry_types: Vec<GeometryType>,
    #[serde(default)]
    pub rendering: Rendering,
    /// Property drawn as a text label next to point markers in previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_property: Option<String>,
}

fn all_geometry_types() -> Vec<GeometryType> {
    GeometryType::ALL.to_vec()
}

impl LayerPolicy {
    pub fn new(name: impl Into<String>) -> Self {
        LayerPolicy {
            input_file: PathBuf::new(),
            name: name.into(),
            description: String::new(),
            simplification_strategy: SimplificationStrategy::None,
            simplification_tolerance: 0.0,
            skip_simplification: false,
            geometry_types: all_geometry_types(),
            rendering: Rendering::default(),
            label_property: None,
        }
    }

    pub fn accepts(&self, geometry_type: GeometryType) -> bool {
        self.geometry_types.contains(&geometry_type)
    }
}

/// What happens to a feature's original properties before layer metadata and
/// style are stamped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyMode {
    /// Discard the original properties.
    Replace,
    /// Keep the original properties; metadata and style win on key clashes.
    #[default]
    Overlay,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn policy_reads_camel_case_config() {
        let policy: LayerPolicy = serde_json::from_value(json!({
            "inputFile": "resources/street_outlines.geojson",
            "name": "Street Outlines",
            "description": "Main street outlines and roads",
            "simplificationStrategy": "douglas_peucker",
            "simplificationTolerance": 0.000005,
            "rendering": {
                "lineColor": "#333333",
                "lineOpacity": 1.0,
                "lineThickness": 1.0,
                "fillOpacity": 0.0
            }
        }))
        .unwrap();
        assert_eq!(
            policy.simplification_strategy,
            SimplificationStrategy::DouglasPeucker
        );
        assert_eq!(policy.simplification_tolerance, 0.000005);
        assert!(!policy.skip_simplification);
        assert_eq!(policy.geometry_types.len(), 6);
        assert_eq!(policy.rendering.line_color.as_deref(), Some("#333333"));
    }

    #[test]
    fn unknown_strategy_is_not_an_error() {
        let policy: LayerPolicy = serde_json::from_value(json!({
            "name": "Mystery",
            "simplificationStrategy": "visvalingam"
        }))
        .unwrap();
        assert_eq!(
            policy.simplification_strategy,
            SimplificationStrategy::Unrecognized
        );
    }

    #[test]
    fn no_compression_is_an_alias_for_skip() {
        let policy: LayerPolicy =
            serde_json::from_value(json!({"name": "Fence", "noCompression": true})).unwrap();
        assert!(policy.skip_simplification);
    }

    #[test]
    fn geometry_types_restrict_accepted_set() {
        let policy: LayerPolicy = serde_json::from_value(json!({
            "name": "Outlines",
            "geometryTypes": ["LineString", "Polygon"]
        }))
        .unwrap();
        assert!(policy.accepts(GeometryType::Polygon));
        assert!(!policy.accepts(GeometryType::Point));
    }
}
