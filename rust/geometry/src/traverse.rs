// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traverse reconstruction
//!
//! Azimuths are clockwise from north: 0° = +Y, 90° = +X.

use geomatricula_core::normalize_azimuth;
use nalgebra::{Point2, Vector2};

use crate::segment::{Segment, SegmentInput};

/// Planar displacement of a leg: `(d·sin az, d·cos az)`
#[inline]
pub fn displacement(azimuth_deg: f64, distance_m: f64) -> Vector2<f64> {
    let az = azimuth_deg.to_radians();
    Vector2::new(distance_m * az.sin(), distance_m * az.cos())
}

/// Azimuth of a displacement vector, in `[0, 360)`
#[inline]
pub fn azimuth_of(delta: &Vector2<f64>) -> f64 {
    normalize_azimuth(delta.x.atan2(delta.y).to_degrees())
}

/// Ordered legs of one boundary, starting at the local origin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Traverse {
    segments: Vec<Segment>,
}

impl Traverse {
    /// Build from segments, ordered by `index` (stable for equal indices)
    pub fn new(mut segments: Vec<Segment>) -> Self {
        segments.sort_by_key(Segment::index);
        Self { segments }
    }

    /// Build from wire input. Entries without an index take their position.
    pub fn from_inputs(inputs: impl IntoIterator<Item = SegmentInput>) -> Self {
        let segments = inputs
            .into_iter()
            .enumerate()
            .map(|(position, mut input)| {
                input.index = input.index.or(Some(position as u32 + 1));
                Segment::from(input)
            })
            .collect();
        Self::new(segments)
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Cumulative vertices: `vertex[0] = (0,0)`, `vertex[i] = vertex[i-1] + delta[i-1]`.
    ///
    /// Always `len() + 1` entries. The last one equals the residual and is
    /// the origin only for an exactly closed traverse.
    pub fn vertices(&self) -> Vec<Point2<f64>> {
        let mut vertices = Vec::with_capacity(self.segments.len() + 1);
        let mut current = Point2::origin();
        vertices.push(current);
        for segment in &self.segments {
            current += segment.displacement();
            vertices.push(current);
        }
        vertices
    }

    /// Polygon corners: the start vertex of every leg
    pub fn corners(&self) -> Vec<Point2<f64>> {
        let mut vertices = self.vertices();
        vertices.pop();
        vertices
    }

    /// Sum of all displacements; zero for a closed traverse
    pub fn residual(&self) -> Vector2<f64> {
        self.segments
            .iter()
            .fold(Vector2::zeros(), |sum, segment| sum + segment.displacement())
    }
}

impl From<Vec<Segment>> for Traverse {
    fn from(segments: Vec<Segment>) -> Self {
        Self::new(segments)
    }
}
