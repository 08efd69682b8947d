use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::models::Geometry;

pub type Properties = Map<String, Value>;

// Structure for a single GeoJSON feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "nullable_properties")]
    pub properties: Properties,
}

// Ordered set of features plus optional bundle metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

// `"properties": null` is legal GeoJSON; treat it as an empty object
fn nullable_properties<'de, D>(deserializer: D) -> Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Properties>::deserialize(deserializer)?.unwrap_or_default())
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Feature {
            id: None,
            geometry: Some(geometry),
            properties: Properties::new(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.geometry.as_ref().map(Geometry::point_count).unwrap_or(0)
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection {
            metadata: None,
            features,
        }
    }

    /// Total number of positions across every feature.
    pub fn point_count(&self) -> usize {
        self.features.iter().map(Feature::point_count).sum()
    }

    /// Name stored in the bundle metadata, if any.
    pub fn metadata_name(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use serde_json::json;

    #[test]
    fn feature_keeps_id_and_null_properties_become_empty() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "id": "toilet-7",
            "geometry": {"type": "Point", "coordinates": [-119.2, 40.8]},
            "properties": null
        }))
        .unwrap();
        assert_eq!(feature.id, Some(json!("toilet-7")));
        assert!(feature.properties.is_empty());
        assert_eq!(feature.point_count(), 1);
    }

    #[test]
    fn null_geometry_loads_as_none() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": null,
            "properties": {"name": "ghost"}
        }))
        .unwrap();
        assert!(feature.geometry.is_none());
        assert_eq!(feature.point_count(), 0);
    }

    #[test]
    fn collection_serializes_with_type_tags() {
        let collection = FeatureCollection::new(vec![Feature::new(Geometry::Point {
            coordinates: Position::new(1.0, 2.0),
        })]);
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"][0]["type"], "Feature");
        assert_eq!(value["features"][0]["properties"], json!({}));
        assert!(value["features"][0].get("id").is_none());
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn property_order_is_preserved() {
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": null,
            "properties": {"zeta": 1, "alpha": 2, "mid": 3}
        }))
        .unwrap();
        let keys: Vec<&String> = feature.properties.keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }
}
