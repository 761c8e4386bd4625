// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Whole-traverse scenarios: reconstruction, metrics and classification together.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use geomatricula_geometry::{
    classify, quality_level, PolygonMetrics, QualityLevel, Segment, Severity, Traverse,
    WarningKind,
};

/// Six-leg rural boundary as it appears in a deed
fn rural_traverse() -> Traverse {
    Traverse::new(vec![
        Segment::new(1, "N35°20'W", 45.50),
        Segment::new(2, "N78°15'W", 120.00),
        Segment::new(3, "S45°0'W", 85.30),
        Segment::new(4, "S12°30'E", 95.20),
        Segment::new(5, "N55°40'E", 150.00),
        Segment::new(6, "N5°10'E", 58.75),
    ])
}

#[test]
fn six_leg_rural_traverse_metrics() {
    let metrics = PolygonMetrics::of(&rural_traverse());

    assert_abs_diff_eq!(metrics.perimeter, 554.75, epsilon = 1e-9);
    assert_abs_diff_eq!(metrics.area, 13715.61, epsilon = 0.05);
    // these bearings do not close: the traverse ends ~75 m from the start
    assert_abs_diff_eq!(metrics.closure_error, 74.815, epsilon = 0.01);
    assert_relative_eq!(
        metrics.closure_ratio.unwrap(),
        554.75 / metrics.closure_error,
        epsilon = 1e-12
    );
}

#[test]
fn six_leg_rural_traverse_quality() {
    let metrics = PolygonMetrics::of(&rural_traverse());
    let assessment = classify(metrics.closure_error, Some(12_500.0), metrics.area);

    assert_eq!(assessment.confidence_score, 50);
    assert_eq!(assessment.warnings.len(), 2);
    assert_eq!(assessment.warnings[0].kind, WarningKind::Closure);
    assert_eq!(assessment.warnings[0].severity, Severity::Error);
    assert_eq!(assessment.warnings[1].kind, WarningKind::AreaMismatch);
    assert_eq!(assessment.warnings[1].severity, Severity::Warning);

    let diff = geomatricula_geometry::area_difference_percent(Some(12_500.0), metrics.area);
    assert_eq!(
        quality_level(metrics.closure_error, assessment.confidence_score, diff),
        QualityLevel::Red
    );
}

#[test]
fn engineered_closed_traverse_has_zero_closure() {
    // 3-4-5 triangle: east 3, north 4, back along the hypotenuse
    let hypotenuse_azimuth = 180.0 + (3.0f64).atan2(4.0).to_degrees();
    let traverse = Traverse::new(vec![
        Segment::new(1, "Az 90°", 3.0),
        Segment::new(2, "Az 0°", 4.0),
        Segment::new(3, format!("Az {hypotenuse_azimuth}°"), 5.0),
    ]);
    let metrics = PolygonMetrics::of(&traverse);

    assert!(metrics.closure_error < 1e-6, "closure {}", metrics.closure_error);
    assert_abs_diff_eq!(metrics.area, 6.0, epsilon = 1e-6);

    let assessment = classify(metrics.closure_error, Some(6.0), metrics.area);
    assert_eq!(assessment.confidence_score, 95);
    assert!(assessment.warnings.is_empty());
}

#[test]
fn reversed_traverse_keeps_area() {
    let forward = rural_traverse();
    let reversed: Vec<Segment> = forward
        .segments()
        .iter()
        .rev()
        .enumerate()
        .map(|(i, s)| {
            let back_azimuth = (s.bearing_azimuth() + 180.0) % 360.0;
            Segment::new(i as u32 + 1, format!("Az {back_azimuth}°"), s.distance_m())
        })
        .collect();

    assert_relative_eq!(
        PolygonMetrics::of(&forward).area,
        PolygonMetrics::of(&Traverse::new(reversed)).area,
        epsilon = 1e-6
    );
}

#[test]
fn quadrant_table() {
    let azimuth = |raw: &str| Segment::new(1, raw, 1.0).bearing_azimuth();
    assert_abs_diff_eq!(azimuth("N 30°0'0\"E"), 30.0);
    assert_abs_diff_eq!(azimuth("S 30°0'0\"E"), 150.0);
    assert_abs_diff_eq!(azimuth("S 30°0'0\"W"), 210.0);
    assert_abs_diff_eq!(azimuth("N 30°0'0\"W"), 330.0);
}
