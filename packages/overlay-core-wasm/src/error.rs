//! Error types for overlay loading, bundling and rendering.
//!
//! The geometry pipeline itself is infallible; every variant here belongs to a
//! boundary (file access, JSON parsing, configuration, rendering).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {source_name}: {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not a FeatureCollection")]
    NotFeatureCollection(String),

    #[error("{0} has no features")]
    EmptyFeatures(String),

    #[error("No data loaded for layer '{0}'")]
    MissingLayer(String),

    #[error("Invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),

    #[error("No valid geometry found for bounds calculation")]
    NoGeometry,

    #[error("Compression failed: {0}")]
    Compress(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(source_name: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Json {
            source_name: source_name.into(),
            source,
        }
    }
}
