// Reading GeoJSON FeatureCollections from disk or text.
//
// All document validation happens here; the pipeline assumes well-formed input.
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::geojson_features::FeatureCollection;

/// Read and validate a FeatureCollection file.
pub fn load_feature_collection(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_feature_collection(&text, &path.display().to_string())
}

/// Parse GeoJSON text. `source_name` only labels errors.
pub fn parse_feature_collection(text: &str, source_name: &str) -> Result<FeatureCollection> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::json(source_name, e))?;
    feature_collection_from_value(value, source_name)
}

/// Validate an already parsed JSON value as a FeatureCollection.
pub fn feature_collection_from_value(value: Value, source_name: &str) -> Result<FeatureCollection> {
    if value.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(Error::NotFeatureCollection(source_name.to_string()));
    }

    let has_features = value
        .get("features")
        .and_then(Value::as_array)
        .is_some_and(|features| !features.is_empty());
    if !has_features {
        return Err(Error::EmptyFeatures(source_name.to_string()));
    }

    serde_json::from_value(value).map_err(|e| Error::json(source_name, e))
}
