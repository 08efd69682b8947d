//! Rectangle footprints for polygon layers.
//!
//! `to_rectangle` is the simplification strategy: an axis-aligned box with a
//! fixed corner order, so every instance of a repeated feature (toilets,
//! kiosks) renders with the same orientation. `oriented_bounding_rectangle`
//! aligns the box to the longest diagonal instead; it is a helper for callers
//! that want a tighter fit and is not selectable from a layer policy.

use crate::bounds::BoundingBox;
use crate::geometry_algebra::distance;
use crate::models::{Geometry, Position};

/// Collapse a Polygon or MultiPolygon to its axis-aligned bounding rectangle.
///
/// Holes and polygon boundaries are ignored: every position of every ring is
/// pooled. Geometries with fewer than three positions, and every other
/// geometry kind, are returned unchanged.
pub fn to_rectangle(geometry: &Geometry) -> Geometry {
    let all_coords: Vec<Position> = match geometry {
        Geometry::Polygon { coordinates } => coordinates.iter().flatten().copied().collect(),
        Geometry::MultiPolygon { coordinates } => {
            coordinates.iter().flatten().flatten().copied().collect()
        }
        _ => return geometry.clone(),
    };

    if all_coords.len() < 3 {
        return geometry.clone();
    }

    match BoundingBox::from_positions(&all_coords) {
        Some(bbox) => Geometry::Polygon {
            coordinates: vec![bbox.to_ring()],
        },
        None => geometry.clone(),
    }
}

/// Rectangle aligned with the line through the two farthest-apart positions.
///
/// Returns the positions unchanged when there are fewer than three, and the
/// axis-aligned ring when every position coincides.
pub fn oriented_bounding_rectangle(positions: &[Position]) -> Vec<Position> {
    if positions.len() < 3 {
        return positions.to_vec();
    }

    let Some((p1, p2)) = farthest_pair(positions) else {
        return axis_aligned_ring(positions);
    };

    let length = distance(p1, p2);
    if length == 0.0 {
        return axis_aligned_ring(positions);
    }

    // Unit axis along the diagonal and its left-hand perpendicular
    let dx = (p2.lon - p1.lon) / length;
    let dy = (p2.lat - p1.lat) / length;
    let (perp_dx, perp_dy) = (-dy, dx);

    let mut min_parallel: f64 = 0.0;
    let mut max_parallel: f64 = 0.0;
    let mut min_perp: f64 = 0.0;
    let mut max_perp: f64 = 0.0;
    for point in positions {
        let rx = point.lon - p1.lon;
        let ry = point.lat - p1.lat;
        let along = rx * dx + ry * dy;
        let across = rx * perp_dx + ry * perp_dy;
        min_parallel = min_parallel.min(along);
        max_parallel = max_parallel.max(along);
        min_perp = min_perp.min(across);
        max_perp = max_perp.max(across);
    }

    let corner = |along: f64, across: f64| {
        Position::new(
            p1.lon + along * dx + across * perp_dx,
            p1.lat + along * dy + across * perp_dy,
        )
    };

    let first = corner(min_parallel, min_perp);
    vec![
        first,
        corner(max_parallel, min_perp),
        corner(max_parallel, max_perp),
        corner(min_parallel, max_perp),
        first,
    ]
}

// O(n^2), fine for footprint-sized rings. None when all distances are zero.
fn farthest_pair(positions: &[Position]) -> Option<(Position, Position)> {
    let mut max_distance = 0.0;
    let mut pair = None;
    for (i, &a) in positions.iter().enumerate() {
        for &b in &positions[i + 1..] {
            let d = distance(a, b);
            if d > max_distance {
                max_distance = d;
                pair = Some((a, b));
            }
        }
    }
    pair
}

fn axis_aligned_ring(positions: &[Position]) -> Vec<Position> {
    BoundingBox::from_positions(positions)
        .map(|bbox| bbox.to_ring())
        .unwrap_or_else(|| positions.to_vec())
}
