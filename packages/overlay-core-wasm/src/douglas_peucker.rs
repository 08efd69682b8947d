//! Douglas-Peucker line simplification.
//!
//! The split/collapse decisions are those of the textbook recursion (anchor on
//! the first and last point, split at the farthest interior point while it lies
//! beyond the tolerance). Ranges are processed from an explicit work-list so
//! that long, adversarial inputs cannot exhaust the call stack.

use crate::geometry_algebra::perpendicular_distance;
use crate::models::{Geometry, Position};

/// Simplify an ordered sequence of positions.
///
/// Sequences of two points or fewer are returned unchanged. The output is a
/// subsequence of the input that always keeps the first and last point.
pub fn simplify(points: &[Position], tolerance: f64) -> Vec<Position> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut ranges = vec![(0usize, last)];
    while let Some((start, end)) = ranges.pop() {
        if end <= start + 1 {
            continue;
        }

        let (max_index, max_distance) = farthest_point(points, start, end);

        // max_index == start means the interior lies on the anchor line; a
        // negative tolerance must not split there
        if max_distance > tolerance && max_index > start {
            keep[max_index] = true;
            ranges.push((max_index, end));
            ranges.push((start, max_index));
        }
        // Otherwise every point strictly between start and end is dropped
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, kept)| kept.then_some(*point))
        .collect()
}

// Interior point farthest from the start-end anchor line. The running maximum
// starts at zero, so a range whose interior lies exactly on the line reports
// (start, 0.0). Ties keep the first index.
fn farthest_point(points: &[Position], start: usize, end: usize) -> (usize, f64) {
    let anchor_start = points[start];
    let anchor_end = points[end];

    let mut max_distance = 0.0;
    let mut max_index = start;
    for (index, point) in points.iter().enumerate().take(end).skip(start + 1) {
        let distance = perpendicular_distance(*point, anchor_start, anchor_end);
        if distance > max_distance {
            max_distance = distance;
            max_index = index;
        }
    }
    (max_index, max_distance)
}

/// Apply [`simplify`] to every line or ring of a geometry, each in isolation.
///
/// Points and multi-points have nothing to simplify and are returned as-is,
/// as are collections and unsupported geometries.
pub fn simplify_geometry(geometry: &Geometry, tolerance: f64) -> Geometry {
    match geometry {
        Geometry::LineString { coordinates } => Geometry::LineString {
            coordinates: simplify(coordinates, tolerance),
        },
        Geometry::Polygon { coordinates } => Geometry::Polygon {
            coordinates: simplify_rings(coordinates, tolerance),
        },
        Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
            coordinates: simplify_rings(coordinates, tolerance),
        },
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates
                .iter()
                .map(|polygon| simplify_rings(polygon, tolerance))
                .collect(),
        },
        Geometry::Point { .. }
        | Geometry::MultiPoint { .. }
        | Geometry::GeometryCollection { .. }
        | Geometry::Unsupported => geometry.clone(),
    }
}

fn simplify_rings(rings: &[Vec<Position>], tolerance: f64) -> Vec<Vec<Position>> {
    rings.iter().map(|ring| simplify(ring, tolerance)).collect()
}
