//! Size and point-count measurements for GeoJSON documents.
//!
//! These feed the CLI `analyze` and `tolerances` commands and the wasm
//! `simplification_report` export. They never change the data they measure.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::douglas_peucker::simplify_geometry;
use crate::error::{Error, Result};
use crate::geojson_features::{Feature, FeatureCollection};
use crate::models::Geometry;

/// Tolerances (degrees) measured when the caller does not pick any.
pub const DEFAULT_TOLERANCES: [f64; 6] = [0.0, 0.000001, 0.00001, 0.0001, 0.001, 0.01];

/// Rough length of one degree at the equator, for human-readable tolerances.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

pub fn count_points(geometry: &Geometry) -> usize {
    geometry.point_count()
}

pub fn count_collection_points(collection: &FeatureCollection) -> usize {
    collection.point_count()
}

/// Raw deflate size at level 6, the way the client's decompressor expects it.
pub fn deflate_size(data: &[u8]) -> Result<usize> {
    let mut compressed = Vec::new();
    DeflateEncoder::new(data, Compression::new(6))
        .read_to_end(&mut compressed)
        .map_err(Error::Compress)?;
    Ok(compressed.len())
}

pub fn gzip_size(data: &[u8]) -> Result<usize> {
    let mut compressed = Vec::new();
    GzEncoder::new(data, Compression::best())
        .read_to_end(&mut compressed)
        .map_err(Error::Compress)?;
    Ok(compressed.len())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub feature_count: usize,
    /// Feature count per geometry `type` tag, `Unknown` for null geometry.
    pub geometry_types: BTreeMap<String, usize>,
    pub raw_size: usize,
    pub gzip_size: usize,
}

/// Count features per geometry type and measure the document's size.
///
/// Only the JSON syntax is checked, so broken or partial documents can still
/// be inspected.
pub fn analyze_document(text: &str) -> Result<DocumentStats> {
    analyze_named(text, "document")
}

pub fn analyze_file(path: impl AsRef<Path>) -> Result<DocumentStats> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    analyze_named(&text, &path.display().to_string())
}

fn analyze_named(text: &str, source_name: &str) -> Result<DocumentStats> {
    let value: Value = serde_json::from_str(text).map_err(|e| Error::json(source_name, e))?;
    let features = value
        .get("features")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut geometry_types = BTreeMap::new();
    for feature in features {
        let tag = feature
            .get("geometry")
            .and_then(|g| g.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown");
        *geometry_types.entry(tag.to_string()).or_insert(0) += 1;
    }

    Ok(DocumentStats {
        feature_count: features.len(),
        geometry_types,
        raw_size: text.len(),
        gzip_size: gzip_size(text.as_bytes())?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToleranceRow {
    pub tolerance: f64,
    pub approx_meters: f64,
    pub points: usize,
    pub reduction_percent: f64,
    pub json_size: usize,
    pub deflate_size: usize,
}

/// Simplify the collection at each tolerance and measure the result.
///
/// Rows are computed in parallel and returned in the order of `tolerances`.
/// A tolerance of zero or less measures the unsimplified data.
pub fn tolerance_report(
    collection: &FeatureCollection,
    tolerances: &[f64],
) -> Result<Vec<ToleranceRow>> {
    let original_points = collection.point_count();
    tolerances
        .par_iter()
        .map(|&tolerance| measure_tolerance(collection, tolerance, original_points))
        .collect()
}

fn measure_tolerance(
    collection: &FeatureCollection,
    tolerance: f64,
    original_points: usize,
) -> Result<ToleranceRow> {
    let simplified = FeatureCollection {
        metadata: collection.metadata.clone(),
        features: collection
            .features
            .iter()
            .map(|feature| simplify_feature(feature, tolerance))
            .collect(),
    };

    let points = simplified.point_count();
    let json = serde_json::to_vec(&simplified).map_err(|e| Error::json("tolerance report", e))?;
    let reduction_percent = if original_points == 0 {
        0.0
    } else {
        (1.0 - points as f64 / original_points as f64) * 100.0
    };

    Ok(ToleranceRow {
        tolerance,
        approx_meters: tolerance * METERS_PER_DEGREE,
        points,
        reduction_percent,
        json_size: json.len(),
        deflate_size: deflate_size(&json)?,
    })
}

fn simplify_feature(feature: &Feature, tolerance: f64) -> Feature {
    if tolerance <= 0.0 {
        return feature.clone();
    }
    Feature {
        geometry: feature
            .geometry
            .as_ref()
            .map(|geometry| simplify_geometry(geometry, tolerance)),
        ..feature.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;

    fn wiggly_line() -> FeatureCollection {
        let coordinates = (0..100)
            .map(|i| Position::new(i as f64 * 0.001, if i % 2 == 0 { 0.0 } else { 0.00002 }))
            .collect();
        FeatureCollection::new(vec![Feature::new(Geometry::LineString { coordinates })])
    }

    #[test]
    fn analyze_counts_geometry_types() {
        let stats = analyze_document(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{}},
                {"type":"Feature","geometry":{"type":"Point","coordinates":[1,1]},"properties":{}},
                {"type":"Feature","geometry":{"type":"Polygon","coordinates":[]},"properties":{}},
                {"type":"Feature","geometry":null,"properties":{}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(stats.feature_count, 4);
        assert_eq!(stats.geometry_types["Point"], 2);
        assert_eq!(stats.geometry_types["Polygon"], 1);
        assert_eq!(stats.geometry_types["Unknown"], 1);
        assert!(stats.raw_size > 0);
        assert!(stats.gzip_size > 0);
    }

    #[test]
    fn analyze_rejects_invalid_json() {
        assert!(matches!(
            analyze_document("[1, 2"),
            Err(Error::Json { .. })
        ));
    }

    #[test]
    fn compression_shrinks_repetitive_data() {
        let data = "coordinates ".repeat(500);
        let deflated = deflate_size(data.as_bytes()).unwrap();
        let gzipped = gzip_size(data.as_bytes()).unwrap();
        assert!(deflated < data.len());
        // gzip adds a header and trailer around the same stream
        assert!(gzipped > 0 && gzipped < data.len());
    }

    #[test]
    fn report_rows_follow_input_order() {
        let tolerances = [0.001, 0.0, 0.00001];
        let rows = tolerance_report(&wiggly_line(), &tolerances).unwrap();
        let seen: Vec<f64> = rows.iter().map(|r| r.tolerance).collect();
        assert_eq!(seen, tolerances);
    }

    #[test]
    fn simplification_never_adds_points() {
        let rows = tolerance_report(&wiggly_line(), &DEFAULT_TOLERANCES).unwrap();
        assert_eq!(rows[0].points, 100);
        assert_eq!(rows[0].reduction_percent, 0.0);
        assert!(rows.iter().all(|row| row.points <= 100));
        let last = rows.last().unwrap();
        assert_eq!(last.points, 2);
        assert!((last.reduction_percent - 98.0).abs() < 1e-9);
        assert!(last.json_size < rows[0].json_size);
        assert_eq!(last.approx_meters, 0.01 * METERS_PER_DEGREE);
    }
}
