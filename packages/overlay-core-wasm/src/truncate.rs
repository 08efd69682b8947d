// Coordinate precision reduction.
//
// Rounding only: nesting depth and point count are never changed.
use crate::models::{Geometry, Position};

/// Decimal places kept for every coordinate component (~1.1 m at the equator).
pub const COORDINATE_PRECISION: i32 = 5;

/// Round a value to `COORDINATE_PRECISION` decimals, half away from zero.
pub fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_PRECISION);
    (value * scale).round() / scale
}

/// Anything built out of positions, at any nesting depth.
pub trait Truncate {
    fn truncated(&self) -> Self;
}

impl Truncate for Position {
    fn truncated(&self) -> Self {
        Position::new(round_coordinate(self.lon), round_coordinate(self.lat))
    }
}

impl<T: Truncate> Truncate for Vec<T> {
    fn truncated(&self) -> Self {
        self.iter().map(Truncate::truncated).collect()
    }
}

impl Truncate for Geometry {
    fn truncated(&self) -> Self {
        match self {
            Geometry::Point { coordinates } => Geometry::Point {
                coordinates: coordinates.truncated(),
            },
            Geometry::MultiPoint { coordinates } => Geometry::MultiPoint {
                coordinates: coordinates.truncated(),
            },
            Geometry::LineString { coordinates } => Geometry::LineString {
                coordinates: coordinates.truncated(),
            },
            Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
                coordinates: coordinates.truncated(),
            },
            Geometry::Polygon { coordinates } => Geometry::Polygon {
                coordinates: coordinates.truncated(),
            },
            Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
                coordinates: coordinates.truncated(),
            },
            Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
                geometries: geometries.truncated(),
            },
            Geometry::Unsupported => Geometry::Unsupported,
        }
    }
}

/// Round every coordinate of `geometry` to five decimal places.
pub fn truncate_geometry(geometry: &Geometry) -> Geometry {
    geometry.truncated()
}
