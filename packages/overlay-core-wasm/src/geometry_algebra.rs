// Planar distance primitives over lon/lat pairs.
//
// Distances are in coordinate-space degrees, not metres. They are only used to
// compare points against each other and against a tolerance.
use crate::models::Position;

/// Euclidean distance between two positions.
pub fn distance(p1: Position, p2: Position) -> f64 {
    let dx = p2.lon - p1.lon;
    let dy = p2.lat - p1.lat;
    (dx * dx + dy * dy).sqrt()
}

/// Distance from `point` to the infinite line through `line_start` and `line_end`.
///
/// When both line points coincide there is no direction, so the distance to
/// `line_start` is returned instead.
pub fn perpendicular_distance(point: Position, line_start: Position, line_end: Position) -> f64 {
    let (x, y) = (point.lon, point.lat);
    let (x1, y1) = (line_start.lon, line_start.lat);
    let (x2, y2) = (line_end.lon, line_end.lat);

    if x1 == x2 && y1 == y2 {
        return distance(point, line_start);
    }

    // |(y2-y1)x - (x2-x1)y + x2*y1 - y2*x1| / sqrt((y2-y1)^2 + (x2-x1)^2)
    let numerator = ((y2 - y1) * x - (x2 - x1) * y + x2 * y1 - y2 * x1).abs();
    let denominator = ((y2 - y1).powi(2) + (x2 - x1).powi(2)).sqrt();

    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lon: f64, lat: f64) -> Position {
        Position::new(lon, lat)
    }

    #[test]
    fn distance_is_euclidean() {
        assert!((distance(p(0.0, 0.0), p(3.0, 4.0)) - 5.0).abs() < 1e-12);
        assert_eq!(distance(p(1.0, 1.0), p(1.0, 1.0)), 0.0);
    }

    #[test]
    fn perpendicular_distance_to_horizontal_line() {
        let d = perpendicular_distance(p(5.0, 3.0), p(0.0, 0.0), p(10.0, 0.0));
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn perpendicular_distance_uses_infinite_line() {
        // Beyond the segment end, still measured against the extended line
        let d = perpendicular_distance(p(20.0, 2.0), p(0.0, 0.0), p(10.0, 0.0));
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_line_falls_back_to_point_distance() {
        let d = perpendicular_distance(p(3.0, 4.0), p(0.0, 0.0), p(0.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn collinear_point_has_zero_distance() {
        assert_eq!(perpendicular_distance(p(0.0, 1.0), p(0.0, 0.0), p(0.0, 2.0)), 0.0);
    }
}
