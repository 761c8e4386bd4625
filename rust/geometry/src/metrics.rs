// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon metrics: area, perimeter and closure error

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::segment::Segment;
use crate::traverse::Traverse;

/// Closure errors below this are treated as an exactly closed traverse
const CLOSED_EPSILON: f64 = 1e-9;

/// Unsigned Shoelace area of a vertex ring.
///
/// The last vertex is joined back to the first. For an origin-anchored
/// traverse vertex list that wrap term is zero, so open and closed rings
/// give the same result. Winding direction does not matter.
pub fn shoelace_area(vertices: &[Point2<f64>]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    (twice_area / 2.0).abs()
}

/// Sum of the authored distances (not measured from coordinates)
#[inline]
pub fn perimeter(segments: &[Segment]) -> f64 {
    segments.iter().map(Segment::distance_m).sum()
}

/// Length of the residual vector `(ΣΔx, ΣΔy)`
pub fn closure_error(segments: &[Segment]) -> f64 {
    let (sum_x, sum_y) = segments
        .iter()
        .fold((0.0, 0.0), |(x, y), s| (x + s.delta_x(), y + s.delta_y()));
    sum_x.hypot(sum_y)
}

/// Derived scalars of one traverse
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonMetrics {
    pub area: f64,
    pub perimeter: f64,
    pub closure_error: f64,
    /// Linear precision `perimeter / closureError` (the surveyor's 1:N);
    /// `None` when the traverse closes exactly.
    pub closure_ratio: Option<f64>,
}

impl PolygonMetrics {
    pub fn of(traverse: &Traverse) -> Self {
        let segments = traverse.segments();
        let area = shoelace_area(&traverse.vertices());
        let perimeter = perimeter(segments);
        let closure_error = closure_error(segments);
        let closure_ratio = (closure_error > CLOSED_EPSILON).then(|| perimeter / closure_error);

        Self {
            area,
            perimeter,
            closure_error,
            closure_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn rectangle(width: f64, height: f64) -> Traverse {
        Traverse::new(vec![
            Segment::new(1, "Az 90°", width),
            Segment::new(2, "Az 0°", height),
            Segment::new(3, "Az 270°", width),
            Segment::new(4, "Az 180°", height),
        ])
    }

    #[test]
    fn test_closed_rectangle() {
        let metrics = PolygonMetrics::of(&rectangle(20.0, 30.0));
        assert_abs_diff_eq!(metrics.area, 600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(metrics.perimeter, 100.0);
        assert!(metrics.closure_error < 1e-6);
        assert_eq!(metrics.closure_ratio, None);
    }

    #[test]
    fn test_area_is_winding_independent() {
        let ccw = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        let mut cw = ccw;
        cw.reverse();
        assert_abs_diff_eq!(shoelace_area(&ccw), 12.0);
        assert_abs_diff_eq!(shoelace_area(&cw), 12.0);
    }

    #[test]
    fn test_reversed_traverse_same_area() {
        let forward = Traverse::new(vec![
            Segment::new(1, "Az 90°", 10.0),
            Segment::new(2, "Az 45°", 8.0),
            Segment::new(3, "Az 300°", 12.0),
        ]);
        let backward = Traverse::new(vec![
            Segment::new(1, "Az 120°", 12.0),
            Segment::new(2, "Az 225°", 8.0),
            Segment::new(3, "Az 270°", 10.0),
        ]);
        assert_relative_eq!(
            PolygonMetrics::of(&forward).area,
            PolygonMetrics::of(&backward).area,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_open_traverse_closure() {
        let traverse = Traverse::new(vec![
            Segment::new(1, "Az 90°", 3.0),
            Segment::new(2, "Az 0°", 4.0),
        ]);
        let metrics = PolygonMetrics::of(&traverse);
        assert_abs_diff_eq!(metrics.closure_error, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.closure_ratio.unwrap(), 7.0 / 5.0, epsilon = 1e-12);
        // the implicit return leg closes the triangle
        assert_abs_diff_eq!(metrics.area, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(shoelace_area(&[]), 0.0);
        assert_eq!(shoelace_area(&[Point2::origin(), Point2::new(1.0, 1.0)]), 0.0);
        let metrics = PolygonMetrics::of(&Traverse::default());
        assert_eq!(metrics.area, 0.0);
        assert_eq!(metrics.perimeter, 0.0);
        assert_eq!(metrics.closure_error, 0.0);
    }
}
