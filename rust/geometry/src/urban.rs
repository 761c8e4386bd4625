// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Urban lot expanders
//!
//! Urban deeds rarely carry bearings. They give front/back/side lengths, or
//! a sequence of lengths joined by 90° turns. Both forms are expanded into
//! ordinary segments so the rest of the pipeline treats them like a rural
//! traverse.

use geomatricula_core::{format_azimuth, normalize_azimuth, DeflectionStep};
use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// Azimuth of the first leg of a deflection description (front facing east)
pub const DEFLECTION_START_AZIMUTH: f64 = 90.0;

/// Rectangular lot dimensions in metres
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrbanDimensions {
    #[serde(default)]
    pub front: Option<f64>,
    #[serde(default)]
    pub back: Option<f64>,
    #[serde(default)]
    pub right_side: Option<f64>,
    #[serde(default)]
    pub left_side: Option<f64>,
    #[serde(default)]
    pub front_confrontation: Option<String>,
    #[serde(default)]
    pub back_confrontation: Option<String>,
    #[serde(default)]
    pub right_confrontation: Option<String>,
    #[serde(default)]
    pub left_confrontation: Option<String>,
}

impl UrbanDimensions {
    /// True when at least one usable length is present
    pub fn has_dimensions(&self) -> bool {
        [self.front, self.back, self.right_side, self.left_side]
            .iter()
            .any(|d| usable(*d).is_some())
    }
}

fn usable(length: Option<f64>) -> Option<f64> {
    length.filter(|d| d.is_finite() && *d > 0.0)
}

/// A missing side mirrors its opposite ("reflete"); both missing gives 0.
fn mirrored(side: Option<f64>, opposite: Option<f64>) -> f64 {
    usable(side).or_else(|| usable(opposite)).unwrap_or(0.0)
}

fn leg(index: u32, azimuth: f64, distance_m: f64, neighbor: Option<&String>) -> Segment {
    let segment = Segment::new(index, format_azimuth(azimuth), distance_m);
    match neighbor {
        Some(name) => segment.with_neighbor(name.as_str()),
        None => segment,
    }
}

/// Expand to four legs: front (90°), right side (0°), back (270°), left side (180°).
pub fn expand_urban_dimensions(dimensions: &UrbanDimensions) -> Vec<Segment> {
    let front = mirrored(dimensions.front, dimensions.back);
    let back = mirrored(dimensions.back, dimensions.front);
    let right = mirrored(dimensions.right_side, dimensions.left_side);
    let left = mirrored(dimensions.left_side, dimensions.right_side);

    vec![
        leg(1, 90.0, front, dimensions.front_confrontation.as_ref()),
        leg(2, 0.0, right, dimensions.right_confrontation.as_ref()),
        leg(3, 270.0, back, dimensions.back_confrontation.as_ref()),
        leg(4, 180.0, left, dimensions.left_confrontation.as_ref()),
    ]
}

/// Expand "deflete à direita/esquerda" steps: the first leg runs at 90°, each
/// right turn adds 90° and each left turn subtracts 90°.
pub fn expand_deflections(steps: &[DeflectionStep]) -> Vec<Segment> {
    let mut azimuth = DEFLECTION_START_AZIMUTH;
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            if i > 0 {
                if let Some(turn) = step.turn {
                    azimuth = normalize_azimuth(azimuth + turn.delta_degrees());
                }
            }
            Segment::new(i as u32 + 1, format_azimuth(azimuth), step.distance_m)
        })
        .collect()
}
