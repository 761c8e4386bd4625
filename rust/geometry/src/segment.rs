// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary segment model
//!
//! A [`Segment`] keeps its derived fields (azimuth, displacement) private and
//! recomputes them whenever the bearing text or the distance changes, so the
//! derived values always match the authored ones.

use geomatricula_core::{parse_bearing, BearingNotation};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::traverse::displacement;

/// One leg of a property boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "SegmentInput")]
pub struct Segment {
    index: u32,
    bearing_raw: String,
    bearing_azimuth: f64,
    notation: BearingNotation,
    distance_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    neighbor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    custom_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_text: Option<String>,
    delta_x: f64,
    delta_y: f64,
}

/// Authored fields of a segment as they arrive over the wire.
///
/// Derived fields (`bearingAzimuth`, `deltaX`, `deltaY`) are not part of the
/// input and are ignored if present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInput {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub bearing_raw: String,
    #[serde(default)]
    pub distance_m: f64,
    #[serde(default, alias = "confrontation")]
    pub neighbor: Option<String>,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub source_text: Option<String>,
}

/// Non-negative finite distance. Negative values lose their sign, anything
/// non-finite becomes `0`.
#[inline]
pub fn sanitize_distance(distance_m: f64) -> f64 {
    if distance_m.is_finite() {
        distance_m.abs()
    } else {
        0.0
    }
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

impl Segment {
    /// Create a segment, deriving azimuth and displacement from the bearing text
    pub fn new(index: u32, bearing_raw: impl Into<String>, distance_m: f64) -> Self {
        let mut segment = Self {
            index,
            bearing_raw: bearing_raw.into(),
            bearing_azimuth: 0.0,
            notation: BearingNotation::Unparsed,
            distance_m: sanitize_distance(distance_m),
            neighbor: None,
            custom_name: None,
            source_text: None,
            delta_x: 0.0,
            delta_y: 0.0,
        };
        segment.recompute();
        segment
    }

    pub fn with_neighbor(mut self, neighbor: impl Into<String>) -> Self {
        self.neighbor = non_empty(Some(neighbor.into()));
        self
    }

    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = non_empty(Some(name.into()));
        self
    }

    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = non_empty(Some(text.into()));
        self
    }

    fn recompute(&mut self) {
        let bearing = parse_bearing(&self.bearing_raw);
        self.bearing_azimuth = bearing.azimuth;
        self.notation = bearing.notation;
        let delta = displacement(self.bearing_azimuth, self.distance_m);
        self.delta_x = delta.x;
        self.delta_y = delta.y;
    }

    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn bearing_raw(&self) -> &str {
        &self.bearing_raw
    }

    /// Azimuth in degrees, `[0, 360)`
    #[inline]
    pub fn bearing_azimuth(&self) -> f64 {
        self.bearing_azimuth
    }

    /// Dialect the bearing text was read with
    #[inline]
    pub fn notation(&self) -> BearingNotation {
        self.notation
    }

    #[inline]
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    #[inline]
    pub fn neighbor(&self) -> Option<&str> {
        self.neighbor.as_deref()
    }

    #[inline]
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    #[inline]
    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    #[inline]
    pub fn delta_x(&self) -> f64 {
        self.delta_x
    }

    #[inline]
    pub fn delta_y(&self) -> f64 {
        self.delta_y
    }

    #[inline]
    pub fn displacement(&self) -> Vector2<f64> {
        Vector2::new(self.delta_x, self.delta_y)
    }

    pub fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    pub fn set_bearing_raw(&mut self, bearing_raw: impl Into<String>) {
        self.bearing_raw = bearing_raw.into();
        self.recompute();
    }

    pub fn set_distance_m(&mut self, distance_m: f64) {
        self.distance_m = sanitize_distance(distance_m);
        self.recompute();
    }

    pub fn set_neighbor(&mut self, neighbor: Option<String>) {
        self.neighbor = non_empty(neighbor);
    }

    /// Authored fields only
    pub fn to_input(&self) -> SegmentInput {
        SegmentInput {
            index: Some(self.index),
            bearing_raw: self.bearing_raw.clone(),
            distance_m: self.distance_m,
            neighbor: self.neighbor.clone(),
            custom_name: self.custom_name.clone(),
            source_text: self.source_text.clone(),
        }
    }
}

impl From<SegmentInput> for Segment {
    fn from(input: SegmentInput) -> Self {
        let mut segment = Segment::new(input.index.unwrap_or(0), input.bearing_raw, input.distance_m);
        segment.neighbor = non_empty(input.neighbor);
        segment.custom_name = non_empty(input.custom_name);
        segment.source_text = non_empty(input.source_text);
        segment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_derived_fields_follow_bearing() {
        let segment = Segment::new(1, "N 90°00'00\"E", 10.0);
        assert_abs_diff_eq!(segment.bearing_azimuth(), 90.0);
        assert_abs_diff_eq!(segment.delta_x(), 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(segment.delta_y(), 0.0, epsilon = 1e-12);
        assert_eq!(segment.notation(), BearingNotation::Quadrant);
    }

    #[test]
    fn test_setters_recompute() {
        let mut segment = Segment::new(1, "Az 0°", 10.0);
        assert_abs_diff_eq!(segment.delta_y(), 10.0, epsilon = 1e-12);

        segment.set_bearing_raw("Az 180°");
        assert_abs_diff_eq!(segment.delta_y(), -10.0, epsilon = 1e-12);

        segment.set_distance_m(4.0);
        assert_abs_diff_eq!(segment.delta_y(), -4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_sanitized() {
        assert_eq!(Segment::new(1, "Az 0°", -5.0).distance_m(), 5.0);
        assert_eq!(Segment::new(1, "Az 0°", f64::NAN).distance_m(), 0.0);
    }

    #[test]
    fn test_deserialize_discards_derived_fields() {
        let json = r#"{
            "index": 2,
            "bearingRaw": "Az 90°",
            "distanceM": 20.0,
            "bearingAzimuth": 45.0,
            "deltaX": 999.0,
            "deltaY": -999.0,
            "confrontation": "Lote 7"
        }"#;
        let segment: Segment = serde_json::from_str(json).unwrap();
        assert_eq!(segment.index(), 2);
        assert_abs_diff_eq!(segment.bearing_azimuth(), 90.0);
        assert_abs_diff_eq!(segment.delta_x(), 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(segment.delta_y(), 0.0, epsilon = 1e-12);
        assert_eq!(segment.neighbor(), Some("Lote 7"));
    }

    #[test]
    fn test_serialize_camel_case() {
        let segment = Segment::new(1, "Az 0°", 10.0).with_neighbor("Rua A");
        let value = serde_json::to_value(&segment).unwrap();
        assert_eq!(value["bearingRaw"], "Az 0°");
        assert_eq!(value["distanceM"], 10.0);
        assert_eq!(value["neighbor"], "Rua A");
        assert_eq!(value["notation"], "azimuth");
        assert!(value.get("customName").is_none());
    }

    #[test]
    fn test_blank_labels_dropped() {
        let segment = Segment::new(1, "Az 0°", 1.0).with_neighbor("   ");
        assert_eq!(segment.neighbor(), None);
    }
}
