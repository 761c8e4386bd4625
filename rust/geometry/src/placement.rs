// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local-to-map placement
//!
//! Parcels are small enough that a local tangent plane around the anchor is
//! accurate to well under a metre.

use geomatricula_core::LatLng;
use nalgebra::Point2;

/// Metres per degree of latitude
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Place local metre coordinates (x east, y north) around `anchor`, which
/// becomes the local origin.
pub fn place_on_map(local: &[Point2<f64>], anchor: LatLng) -> Vec<LatLng> {
    let meters_per_degree_lng = METERS_PER_DEGREE * anchor.lat.to_radians().cos();
    local
        .iter()
        .map(|p| LatLng {
            lat: anchor.lat + p.y / METERS_PER_DEGREE,
            lng: anchor.lng + p.x / meters_per_degree_lng,
        })
        .collect()
}

/// Arithmetic centre of a set of positions
pub fn centroid(points: &[LatLng]) -> Option<LatLng> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(LatLng {
        lat: lat / n,
        lng: lng / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geomatricula_core::DEFAULT_MAP_CENTER;

    #[test]
    fn test_origin_maps_to_anchor() {
        let placed = place_on_map(&[Point2::origin()], DEFAULT_MAP_CENTER);
        assert_eq!(placed[0], DEFAULT_MAP_CENTER);
    }

    #[test]
    fn test_offsets() {
        let anchor = LatLng { lat: 0.0, lng: -45.0 };
        let placed = place_on_map(&[Point2::new(111_320.0, 111_320.0)], anchor);
        assert_abs_diff_eq!(placed[0].lat, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(placed[0].lng, -44.0, epsilon = 1e-12);

        // a metre east spans more longitude away from the equator
        let south = LatLng { lat: -60.0, lng: -45.0 };
        let placed = place_on_map(&[Point2::new(111_320.0, 0.0)], south);
        assert_abs_diff_eq!(placed[0].lng, -43.0, epsilon = 1e-9);
    }

    #[test]
    fn test_centroid() {
        assert!(centroid(&[]).is_none());
        let c = centroid(&[
            LatLng { lat: -1.0, lng: -2.0 },
            LatLng { lat: 1.0, lng: 2.0 },
        ])
        .unwrap();
        assert_abs_diff_eq!(c.lat, 0.0);
        assert_abs_diff_eq!(c.lng, 0.0);
    }
}
