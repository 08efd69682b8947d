//! Per-feature preprocessing for one layer.
//!
//! Every feature goes through the same four stages in order: geometry type
//! filter, simplification strategy, coordinate truncation and property
//! shaping. A feature rejected by the filter never reaches the later stages.
//! Inputs are borrowed and never modified; each stage builds new values.

use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::console_log;
use crate::douglas_peucker::simplify_geometry;
use crate::geojson_features::{Feature, FeatureCollection, Properties};
use crate::layer_policy::{LayerPolicy, PropertyMode, SimplificationStrategy};
use crate::models::{Geometry, GeometryType};
use crate::rectangle::to_rectangle;
use crate::style::simple_style;
use crate::truncate::truncate_geometry;

/// Counts gathered while preprocessing one layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessSummary {
    pub input_features: usize,
    pub kept_features: usize,
    pub dropped_features: usize,
    pub points_before: usize,
    pub points_after: usize,
}

impl PreprocessSummary {
    fn new(input: &FeatureCollection, output: &FeatureCollection, points_before: usize) -> Self {
        let kept_features = output.features.len();
        PreprocessSummary {
            input_features: input.features.len(),
            kept_features,
            dropped_features: input.features.len() - kept_features,
            points_before,
            points_after: output.point_count(),
        }
    }

    /// Share of points removed, in percent. Zero for an empty layer.
    pub fn reduction_percent(&self) -> f64 {
        if self.points_before == 0 {
            return 0.0;
        }
        (1.0 - self.points_after as f64 / self.points_before as f64) * 100.0
    }
}

/// Run the layer's simplification strategy on one geometry.
pub fn apply_strategy(geometry: &Geometry, policy: &LayerPolicy) -> Geometry {
    if policy.skip_simplification {
        return geometry.clone();
    }

    match policy.simplification_strategy {
        SimplificationStrategy::Rectangle
            if matches!(
                geometry.geometry_type(),
                Some(GeometryType::Polygon | GeometryType::MultiPolygon)
            ) =>
        {
            to_rectangle(geometry)
        }
        SimplificationStrategy::DouglasPeucker if policy.simplification_tolerance > 0.0 => {
            simplify_geometry(geometry, policy.simplification_tolerance)
        }
        _ => geometry.clone(),
    }
}

/// Properties every feature of the layer receives: layer identity followed by
/// the SimpleStyle keys for its rendering.
pub fn layer_properties(layer_id: &str, policy: &LayerPolicy) -> Properties {
    let mut stamp = Properties::new();
    stamp.insert("layer_id".into(), Value::String(layer_id.to_string()));
    stamp.insert("layer_name".into(), Value::String(policy.name.clone()));
    stamp.insert(
        "description".into(),
        Value::String(policy.description.clone()),
    );
    stamp.extend(simple_style(&policy.rendering));
    stamp
}

/// Preprocess a single feature. `None` means the type filter dropped it.
pub fn preprocess_feature(
    feature: &Feature,
    layer_id: &str,
    policy: &LayerPolicy,
    mode: PropertyMode,
) -> Option<Feature> {
    let stamp = layer_properties(layer_id, policy);
    process(feature, policy, &stamp, mode)
}

fn process(
    feature: &Feature,
    policy: &LayerPolicy,
    stamp: &Properties,
    mode: PropertyMode,
) -> Option<Feature> {
    let geometry = feature.geometry.as_ref()?;
    let geometry_type = geometry.geometry_type()?;
    if !policy.accepts(geometry_type) {
        return None;
    }

    let simplified = apply_strategy(geometry, policy);
    let truncated = truncate_geometry(&simplified);

    let mut properties = match mode {
        PropertyMode::Replace => Properties::new(),
        PropertyMode::Overlay => feature.properties.clone(),
    };
    for (key, value) in stamp {
        properties.insert(key.clone(), value.clone());
    }

    Some(Feature {
        id: feature.id.clone(),
        geometry: Some(truncated),
        properties,
    })
}

/// Preprocess every feature of a layer, keeping input order.
pub fn preprocess_collection(
    input: &FeatureCollection,
    layer_id: &str,
    policy: &LayerPolicy,
    mode: PropertyMode,
) -> (FeatureCollection, PreprocessSummary) {
    let stamp = layer_properties(layer_id, policy);
    let features: Vec<Feature> = input
        .features
        .iter()
        .filter_map(|feature| process(feature, policy, &stamp, mode))
        .collect();

    finish(input, layer_id, features, input.point_count())
}

/// Same result as [`preprocess_collection`], with features processed on the
/// rayon pool. Output order matches input order.
pub fn preprocess_collection_parallel(
    input: &FeatureCollection,
    layer_id: &str,
    policy: &LayerPolicy,
    mode: PropertyMode,
) -> (FeatureCollection, PreprocessSummary) {
    let stamp = layer_properties(layer_id, policy);
    let features: Vec<Feature> = input
        .features
        .par_iter()
        .filter_map(|feature| process(feature, policy, &stamp, mode))
        .collect();
    let points_before = input.features.par_iter().map(Feature::point_count).sum();

    finish(input, layer_id, features, points_before)
}

fn finish(
    input: &FeatureCollection,
    layer_id: &str,
    features: Vec<Feature>,
    points_before: usize,
) -> (FeatureCollection, PreprocessSummary) {
    let output = FeatureCollection {
        metadata: input.metadata.clone(),
        features,
    };
    let summary = PreprocessSummary::new(input, &output, points_before);

    console_log!(
        "Layer {}: kept {}/{} features ({} dropped), {} -> {} points ({:.1}% reduction)",
        layer_id,
        summary.kept_features,
        summary.input_features,
        summary.dropped_features,
        summary.points_before,
        summary.points_after,
        summary.reduction_percent()
    );

    (output, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer_policy::Rendering;
    use crate::models::Position;
    use serde_json::json;

    fn line(points: &[(f64, f64)]) -> Vec<Position> {
        points.iter().map(|&p| Position::from(p)).collect()
    }

    fn feature(geometry: Geometry, properties: Value) -> Feature {
        Feature {
            id: None,
            geometry: Some(geometry),
            properties: serde_json::from_value(properties).unwrap(),
        }
    }

    fn outline_policy() -> LayerPolicy {
        let mut policy = LayerPolicy::new("Street Outlines");
        policy.description = "Main street outlines".to_string();
        policy.simplification_strategy = SimplificationStrategy::DouglasPeucker;
        policy.simplification_tolerance = 0.5;
        policy.geometry_types = vec![GeometryType::Polygon, GeometryType::LineString];
        policy.rendering = Rendering {
            line_color: Some("#333333".into()),
            line_opacity: Some(1.0),
            line_thickness: Some(1.0),
            fill_opacity: Some(0.0),
        };
        policy
    }

    #[test]
    fn point_outside_accepted_types_is_dropped() {
        let point = feature(
            Geometry::Point {
                coordinates: Position::new(1.0, 2.0),
            },
            json!({}),
        );
        assert_eq!(
            preprocess_feature(&point, "streets", &outline_policy(), PropertyMode::Overlay),
            None
        );
    }

    #[test]
    fn null_and_unsupported_geometry_are_dropped() {
        let mut ghost = feature(Geometry::Unsupported, json!({}));
        let policy = LayerPolicy::new("Everything");
        assert_eq!(
            preprocess_feature(&ghost, "all", &policy, PropertyMode::Overlay),
            None
        );
        ghost.geometry = None;
        assert_eq!(
            preprocess_feature(&ghost, "all", &policy, PropertyMode::Overlay),
            None
        );
        let collection = feature(
            Geometry::GeometryCollection { geometries: vec![] },
            json!({}),
        );
        assert_eq!(
            preprocess_feature(&collection, "all", &policy, PropertyMode::Overlay),
            None
        );
    }

    #[test]
    fn line_is_simplified_then_truncated() {
        let input = feature(
            Geometry::LineString {
                coordinates: line(&[(0.0, 0.0), (0.0, 1.0), (0.0000049, 2.0000051)]),
            },
            json!({"name": "A"}),
        );
        let output =
            preprocess_feature(&input, "streets", &outline_policy(), PropertyMode::Overlay)
                .unwrap();
        assert_eq!(
            output.geometry,
            Some(Geometry::LineString {
                coordinates: line(&[(0.0, 0.0), (0.0, 2.00001)])
            })
        );
    }

    #[test]
    fn overlay_mode_keeps_originals_and_stamps_layer() {
        let mut input = feature(
            Geometry::LineString {
                coordinates: line(&[(0.0, 0.0), (1.0, 1.0)]),
            },
            json!({"name": "Esplanade", "stroke": "#ff0000"}),
        );
        input.id = Some(json!(42));
        let output =
            preprocess_feature(&input, "streets", &outline_policy(), PropertyMode::Overlay)
                .unwrap();
        assert_eq!(output.id, Some(json!(42)));
        assert_eq!(output.properties["name"], "Esplanade");
        assert_eq!(output.properties["stroke"], "#333333");
        assert_eq!(output.properties["layer_id"], "streets");
        assert_eq!(output.properties["layer_name"], "Street Outlines");
        assert_eq!(output.properties["description"], "Main street outlines");
        assert_eq!(output.properties["fill"], "#000000");
        // Input untouched
        assert_eq!(input.properties["stroke"], "#ff0000");
    }

    #[test]
    fn replace_mode_discards_originals() {
        let input = feature(
            Geometry::Polygon {
                coordinates: vec![line(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)])],
            },
            json!({"name": "Plaza", "area": 12}),
        );
        let output =
            preprocess_feature(&input, "plazas", &outline_policy(), PropertyMode::Replace)
                .unwrap();
        assert!(output.properties.get("name").is_none());
        assert!(output.properties.get("area").is_none());
        let keys: Vec<&String> = output.properties.keys().take(3).collect();
        assert_eq!(keys, ["layer_id", "layer_name", "description"]);
    }

    #[test]
    fn rectangle_strategy_only_touches_polygons() {
        let mut policy = LayerPolicy::new("Toilets");
        policy.simplification_strategy = SimplificationStrategy::Rectangle;
        let diamond = Geometry::Polygon {
            coordinates: vec![line(&[
                (1.0, 0.0),
                (2.0, 1.0),
                (1.0, 2.0),
                (0.0, 1.0),
                (1.0, 0.0),
            ])],
        };
        let boxed = apply_strategy(&diamond, &policy);
        assert_eq!(boxed.point_count(), 5);
        assert_ne!(boxed, diamond);

        let path = Geometry::LineString {
            coordinates: line(&[(0.0, 0.0), (1.0, 5.0), (2.0, 0.0)]),
        };
        assert_eq!(apply_strategy(&path, &policy), path);
    }

    #[test]
    fn skip_flag_and_unknown_strategy_leave_geometry_alone() {
        let zigzag = Geometry::LineString {
            coordinates: line(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)]),
        };
        let mut policy = outline_policy();
        policy.skip_simplification = true;
        assert_eq!(apply_strategy(&zigzag, &policy), zigzag);

        policy.skip_simplification = false;
        policy.simplification_strategy = SimplificationStrategy::Unrecognized;
        assert_eq!(apply_strategy(&zigzag, &policy), zigzag);

        policy.simplification_strategy = SimplificationStrategy::DouglasPeucker;
        policy.simplification_tolerance = 0.0;
        assert_eq!(apply_strategy(&zigzag, &policy), zigzag);
    }

    #[test]
    fn collection_summary_counts_drops_and_points() {
        let input = FeatureCollection::new(vec![
            feature(
                Geometry::LineString {
                    coordinates: line(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)]),
                },
                json!({}),
            ),
            feature(
                Geometry::Point {
                    coordinates: Position::new(5.0, 5.0),
                },
                json!({}),
            ),
        ]);
        let (output, summary) =
            preprocess_collection(&input, "streets", &outline_policy(), PropertyMode::Overlay);
        assert_eq!(output.features.len(), 1);
        assert_eq!(
            summary,
            PreprocessSummary {
                input_features: 2,
                kept_features: 1,
                dropped_features: 1,
                points_before: 4,
                points_after: 2,
            }
        );
        assert_eq!(summary.reduction_percent(), 50.0);
    }

    #[test]
    fn parallel_matches_sequential() {
        let features = (0..64)
            .map(|i| {
                let offset = i as f64;
                feature(
                    Geometry::LineString {
                        coordinates: line(&[
                            (offset, 0.0),
                            (offset + 0.25, 0.1),
                            (offset + 0.5, 3.0),
                            (offset + 1.0, 0.0),
                        ]),
                    },
                    json!({"index": i}),
                )
            })
            .collect();
        let input = FeatureCollection::new(features);
        let policy = outline_policy();
        let sequential = preprocess_collection(&input, "lines", &policy, PropertyMode::Overlay);
        let parallel =
            preprocess_collection_parallel(&input, "lines", &policy, PropertyMode::Overlay);
        assert_eq!(sequential, parallel);
    }
}
