// Axis-aligned bounds over lon/lat positions
use geo::{BoundingRect, Coord, LineString};
use serde::{Deserialize, Serialize};

use crate::geojson_features::FeatureCollection;
use crate::models::Position;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Bounds of a set of positions, `None` when there are none.
    pub fn from_positions(positions: &[Position]) -> Option<BoundingBox> {
        let line: LineString<f64> = positions.iter().map(|&p| Coord::from(p)).collect();
        line.bounding_rect().map(|rect| BoundingBox {
            min_lon: rect.min().x,
            min_lat: rect.min().y,
            max_lon: rect.max().x,
            max_lat: rect.max().y,
        })
    }

    /// Bounds of every feature geometry in the collection.
    pub fn of_collection(collection: &FeatureCollection) -> Option<BoundingBox> {
        let positions: Vec<Position> = collection
            .features
            .iter()
            .filter_map(|feature| feature.geometry.as_ref())
            .flat_map(|geometry| geometry.positions())
            .collect();
        BoundingBox::from_positions(&positions)
    }

    // Inclusive on every edge
    pub fn contains(&self, point: Position) -> bool {
        point.lon >= self.min_lon
            && point.lon <= self.max_lon
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }

    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Closed ring: bottom-left, bottom-right, top-right, top-left, bottom-left.
    pub fn to_ring(&self) -> Vec<Position> {
        vec![
            Position::new(self.min_lon, self.min_lat),
            Position::new(self.max_lon, self.min_lat),
            Position::new(self.max_lon, self.max_lat),
            Position::new(self.min_lon, self.max_lat),
            Position::new(self.min_lon, self.min_lat),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geojson_features::Feature;
    use crate::models::Geometry;

    #[test]
    fn empty_positions_have_no_bounds() {
        assert_eq!(BoundingBox::from_positions(&[]), None);
    }

    #[test]
    fn bounds_cover_all_positions() {
        let positions = [
            Position::new(-119.2, 40.8),
            Position::new(-119.1, 40.7),
            Position::new(-119.3, 40.9),
        ];
        let bbox = BoundingBox::from_positions(&positions).unwrap();
        assert_eq!(bbox.min_lon, -119.3);
        assert_eq!(bbox.max_lon, -119.1);
        assert_eq!(bbox.min_lat, 40.7);
        assert_eq!(bbox.max_lat, 40.9);
        assert!(positions.iter().all(|&p| bbox.contains(p)));
        assert!(!bbox.contains(Position::new(0.0, 0.0)));
    }

    #[test]
    fn collection_bounds_skip_null_geometry() {
        let mut ghost = Feature::new(Geometry::Unsupported);
        ghost.geometry = None;
        let collection = FeatureCollection::new(vec![
            ghost,
            Feature::new(Geometry::LineString {
                coordinates: vec![Position::new(1.0, 2.0), Position::new(3.0, 5.0)],
            }),
        ]);
        let bbox = BoundingBox::of_collection(&collection).unwrap();
        assert_eq!((bbox.width(), bbox.height()), (2.0, 3.0));
    }

    #[test]
    fn ring_is_closed_counterclockwise() {
        let bbox = BoundingBox {
            min_lon: 0.0,
            min_lat: 0.0,
            max_lon: 2.0,
            max_lat: 3.0,
        };
        let ring = bbox.to_ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring[1], Position::new(2.0, 0.0));
        assert_eq!(ring[3], Position::new(0.0, 3.0));
    }
}
