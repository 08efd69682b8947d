// Geometry data model shared by every stage of the pipeline
use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A geographic position in decimal degrees (WGS84), longitude first.
///
/// Serialized as a two-element JSON array. Input arrays may carry extra
/// components (altitude); only longitude and latitude are kept.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Position { lon, lat }
    }
}

impl From<[f64; 2]> for Position {
    fn from(pair: [f64; 2]) -> Self {
        Position::new(pair[0], pair[1])
    }
}

impl From<(f64, f64)> for Position {
    fn from(pair: (f64, f64)) -> Self {
        Position::new(pair.0, pair.1)
    }
}

impl From<Position> for geo::Coord<f64> {
    fn from(p: Position) -> Self {
        geo::Coord { x: p.lon, y: p.lat }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.lon)?;
        tuple.serialize_element(&self.lat)?;
        tuple.end()
    }
}

struct PositionVisitor;

impl<'de> Visitor<'de> for PositionVisitor {
    type Value = Position;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a coordinate array [lon, lat]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Position, A::Error> {
        let lon: f64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let lat: f64 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        // Drop altitude and anything after it
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Position { lon, lat })
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(PositionVisitor)
    }
}

/// GeoJSON geometry, one variant per `type` tag.
///
/// `GeometryCollection` and unknown tags still load so that the feature can be
/// dropped by the type filter instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
    #[serde(other)]
    Unsupported,
}

/// The geometry kinds the pipeline can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl GeometryType {
    pub const ALL: [GeometryType; 6] = [
        GeometryType::Point,
        GeometryType::LineString,
        GeometryType::Polygon,
        GeometryType::MultiPoint,
        GeometryType::MultiLineString,
        GeometryType::MultiPolygon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Geometry {
    /// The processable kind of this geometry, `None` for collections and unknown tags.
    pub fn geometry_type(&self) -> Option<GeometryType> {
        match self {
            Geometry::Point { .. } => Some(GeometryType::Point),
            Geometry::MultiPoint { .. } => Some(GeometryType::MultiPoint),
            Geometry::LineString { .. } => Some(GeometryType::LineString),
            Geometry::MultiLineString { .. } => Some(GeometryType::MultiLineString),
            Geometry::Polygon { .. } => Some(GeometryType::Polygon),
            Geometry::MultiPolygon { .. } => Some(GeometryType::MultiPolygon),
            Geometry::GeometryCollection { .. } | Geometry::Unsupported => None,
        }
    }

    /// Type tag as written in GeoJSON.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::GeometryCollection { .. } => "GeometryCollection",
            Geometry::Unsupported => "Unsupported",
            other => other.geometry_type().map(|t| t.as_str()).unwrap_or("Unsupported"),
        }
    }

    /// Every position of the geometry, ring hierarchy flattened, in document order.
    pub fn positions(&self) -> Vec<Position> {
        match self {
            Geometry::Point { coordinates } => vec![*coordinates],
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.clone()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().copied().collect()
            }
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().flat_map(|g| g.positions()).collect()
            }
            Geometry::Unsupported => Vec::new(),
        }
    }

    /// Number of positions in the geometry.
    pub fn point_count(&self) -> usize {
        match self {
            Geometry::Point { .. } => 1,
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.len()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().map(Vec::len).sum()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .map(|polygon| polygon.iter().map(Vec::len).sum::<usize>())
                .sum(),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().map(Geometry::point_count).sum()
            }
            Geometry::Unsupported => 0,
        }
    }
}
