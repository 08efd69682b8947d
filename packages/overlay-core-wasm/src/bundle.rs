//! Overlay bundles: every layer of an overlay preprocessed, styled and
//! concatenated into one FeatureCollection with bundle metadata attached.
//!
//! Layers are processed in configuration order and their features keep that
//! order in the output. Any layer that fails to load aborts the whole overlay.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::deflate_size;
use crate::console_log;
use crate::error::{Error, Result};
use crate::geojson_features::{FeatureCollection, Properties};
use crate::layer_policy::{LayerPolicy, PropertyMode};
use crate::loader::load_feature_collection;
use crate::preprocess::{preprocess_collection, preprocess_collection_parallel, PreprocessSummary};
use crate::svg_preview::{render_svg, SvgOptions};

pub const DEFAULT_DESCRIPTION: &str = "Consolidated GeoJSON data with embedded styling";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleConfig {
    pub overlays: Vec<OverlayConfig>,
}

impl BundleConfig {
    pub fn from_json(text: &str, source_name: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::json(source_name, e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        BundleConfig::from_json(&text, &path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    pub name: String,
    #[serde(default)]
    pub metadata: OverlayMetadata,
    #[serde(default)]
    pub property_mode: PropertyMode,
    pub layers: IndexMap<String, LayerPolicy>,
}

/// Free-form overlay information copied into the bundle metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_terms: Option<String>,
}

/// Layer input files (resolved against `base_dir`) that do not exist.
pub fn missing_inputs(config: &BundleConfig, base_dir: &Path) -> Vec<PathBuf> {
    config
        .overlays
        .iter()
        .flat_map(|overlay| overlay.layers.values())
        .map(|policy| base_dir.join(&policy.input_file))
        .filter(|path| !path.exists())
        .collect()
}

/// Where a layer's raw FeatureCollection comes from.
pub trait LayerSource {
    fn load(&self, layer_id: &str, policy: &LayerPolicy) -> Result<FeatureCollection>;
}

/// Loads `inputFile` from disk, relative to the configuration's directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    base_dir: PathBuf,
}

impl FileSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FileSource {
            base_dir: base_dir.into(),
        }
    }

    pub fn resolve(&self, policy: &LayerPolicy) -> PathBuf {
        self.base_dir.join(&policy.input_file)
    }
}

impl LayerSource for FileSource {
    fn load(&self, layer_id: &str, policy: &LayerPolicy) -> Result<FeatureCollection> {
        let path = self.resolve(policy);
        console_log!("Processing {} from {}", layer_id, path.display());
        load_feature_collection(&path)
    }
}

// In-memory layers keyed by layer id, for callers that already hold the data
impl LayerSource for HashMap<String, FeatureCollection> {
    fn load(&self, layer_id: &str, _policy: &LayerPolicy) -> Result<FeatureCollection> {
        self.get(layer_id)
            .cloned()
            .ok_or_else(|| Error::MissingLayer(layer_id.to_string()))
    }
}

/// Values the caller supplies for the bundle metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BundleOptions {
    /// Timestamp recorded as `generated`.
    pub generated: String,
    pub license: String,
    pub attribution: String,
    /// Preprocess features on the rayon pool.
    pub parallel: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerReport {
    pub layer_id: String,
    pub name: String,
    #[serde(flatten)]
    pub summary: PreprocessSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_property: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub overlay_name: String,
    pub collection: FeatureCollection,
    pub layers: Vec<LayerReport>,
}

impl Bundle {
    pub fn to_compact_json(&self) -> Result<String> {
        serde_json::to_string(&self.collection).map_err(|e| Error::json(&self.overlay_name, e))
    }

    pub fn byte_size(&self) -> Result<usize> {
        Ok(self.to_compact_json()?.len())
    }

    pub fn deflate_size(&self) -> Result<usize> {
        deflate_size(self.to_compact_json()?.as_bytes())
    }

    pub fn feature_count(&self) -> usize {
        self.collection.features.len()
    }

    /// Preview options labelling points by each layer's label property.
    pub fn svg_options(&self) -> SvgOptions {
        let labels = self
            .layers
            .iter()
            .filter_map(|layer| {
                layer
                    .label_property
                    .clone()
                    .map(|property| (layer.layer_id.clone(), property))
            })
            .collect();
        SvgOptions {
            labels,
            ..SvgOptions::default()
        }
    }
}

pub fn bundle_overlay(
    overlay: &OverlayConfig,
    source: &dyn LayerSource,
    options: &BundleOptions,
) -> Result<Bundle> {
    console_log!("Processing overlay: {}", overlay.name);

    let mut features = Vec::new();
    let mut layers = Vec::with_capacity(overlay.layers.len());
    for (layer_id, policy) in &overlay.layers {
        let raw = source.load(layer_id, policy)?;
        let (processed, summary) = if options.parallel {
            preprocess_collection_parallel(&raw, layer_id, policy, overlay.property_mode)
        } else {
            preprocess_collection(&raw, layer_id, policy, overlay.property_mode)
        };
        features.extend(processed.features);
        layers.push(LayerReport {
            layer_id: layer_id.clone(),
            name: policy.name.clone(),
            summary,
            label_property: policy.label_property.clone(),
        });
    }

    console_log!(
        "Consolidated {} layers with {} total features",
        layers.len(),
        features.len()
    );

    Ok(Bundle {
        overlay_name: overlay.name.clone(),
        collection: FeatureCollection {
            metadata: Some(bundle_metadata(overlay, options)),
            features,
        },
        layers,
    })
}

fn bundle_metadata(overlay: &OverlayConfig, options: &BundleOptions) -> Properties {
    let extra = &overlay.metadata;
    let mut metadata = Properties::new();
    metadata.insert(
        "name".into(),
        Value::String(format!("{} GeoJSON Map Data", overlay.name)),
    );
    metadata.insert(
        "description".into(),
        Value::String(
            extra
                .description
                .clone()
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        ),
    );
    metadata.insert("generated".into(), Value::String(options.generated.clone()));
    metadata.insert("license".into(), Value::String(options.license.clone()));
    metadata.insert(
        "attribution".into(),
        Value::String(options.attribution.clone()),
    );

    for (key, value) in [
        ("disclaimer", &extra.disclaimer),
        ("source", &extra.source),
        ("usage_terms", &extra.usage_terms),
    ] {
        if let Some(text) = value {
            metadata.insert(key.into(), Value::String(text.clone()));
        }
    }
    metadata
}

/// Write `<overlay>.geojson` (compact) and `<overlay>.svg` into `output_dir`.
///
/// An overlay with nothing to draw gets no preview; only the GeoJSON path is returned.
pub fn write_bundle(bundle: &Bundle, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    let geojson_path = output_dir.join(format!("{}.geojson", bundle.overlay_name));
    let json = bundle.to_compact_json()?;
    fs::write(&geojson_path, &json).map_err(|e| Error::io(&geojson_path, e))?;
    console_log!(
        "Successfully created {} ({} bytes)",
        geojson_path.display(),
        json.len()
    );

    let svg_path = output_dir.join(format!("{}.svg", bundle.overlay_name));
    let svg = match render_svg(&bundle.collection, &bundle.svg_options()) {
        Ok(svg) => svg,
        Err(Error::NoGeometry) => {
            console_log!(
                "No valid geometry found for bounds calculation, skipping {}",
                svg_path.display()
            );
            return Ok(vec![geojson_path]);
        }
        Err(err) => return Err(err),
    };
    fs::write(&svg_path, svg).map_err(|e| Error::io(&svg_path, e))?;
    console_log!("Successfully created SVG preview: {}", svg_path.display());

    Ok(vec![geojson_path, svg_path])
}
